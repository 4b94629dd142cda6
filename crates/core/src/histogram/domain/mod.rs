pub mod histogram_generator;
pub mod intensity_histogram;
