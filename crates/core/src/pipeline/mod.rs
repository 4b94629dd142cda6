pub mod capture_controller;
pub mod capture_executor;
pub mod display_histogram_use_case;
pub mod infrastructure;
pub mod pacing;
pub mod pipeline_logger;
