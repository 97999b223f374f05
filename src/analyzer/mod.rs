//! Image acquisition and the recognition service boundary.

pub mod client;
pub mod image_prep;
pub mod types;

pub use client::{HttpRecognitionClient, RecognitionClient};
pub use image_prep::{prepare_image, prepare_image_file, ImageData, ImageOptions};
pub use types::*;
