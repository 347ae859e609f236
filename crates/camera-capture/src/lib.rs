//! Camera Capture Library for Drowsiness Monitoring
//!
//! Provides the frame side of the detection loop:
//! - `FrameSource` trait for acquiring, capturing from and releasing a camera
//! - Directory replay source for recorded sessions
//! - JPEG data-URL encoding of frames for upload

pub mod encode;
pub mod frame;
pub mod source;

pub use encode::{to_jpeg_data_url, CaptureConfig};
pub use frame::VideoFrame;
pub use source::{FrameSource, ImageDirSource};

use thiserror::Error;

/// Camera error types
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("Failed to open camera: {0}")]
    Open(String),

    #[error("Invalid format: {0}")]
    Format(String),

    #[error("Streaming error: {0}")]
    Stream(String),

    #[error("Encoding failed: {0}")]
    Encode(String),

    #[error("Camera not initialized")]
    NotInitialized,
}

impl From<image::ImageError> for CameraError {
    fn from(err: image::ImageError) -> Self {
        CameraError::Format(err.to_string())
    }
}
