pub mod png_histogram_view;
