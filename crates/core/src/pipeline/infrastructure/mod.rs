pub mod threaded_capture_executor;
