pub mod camera_device;
pub mod capture_error;
pub mod capture_view;
pub mod frame_source;
