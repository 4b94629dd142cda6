pub mod bar_histogram_renderer;
