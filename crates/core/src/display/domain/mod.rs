pub mod display_layout;
pub mod histogram_view;
