pub mod captured_image;
pub mod constants;
pub mod frame;
pub mod orientation;
pub mod region;
