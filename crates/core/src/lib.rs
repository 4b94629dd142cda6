//! Face-triggered capture: stream camera frames, detect a face in the
//! centre of the picture, then present that frame with its intensity
//! histogram.

pub mod capture;
pub mod detection;
pub mod display;
pub mod histogram;
pub mod pipeline;
pub mod shared;
