//! Widgets

mod face;

pub use face::{cell_to_pixel, FaceWidget};
