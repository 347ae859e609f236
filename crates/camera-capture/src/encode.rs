//! JPEG data-URL encoding for detection uploads

use crate::{CameraError, VideoFrame};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

/// Upload encoding options
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Downscale wider frames before encoding (0 = keep size)
    pub max_width: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 80,
            max_width: 640,
        }
    }
}

/// Encode a frame as `data:image/jpeg;base64,...`
pub fn to_jpeg_data_url(frame: &VideoFrame, config: &CaptureConfig) -> Result<String, CameraError> {
    let frame = frame.fit_width(config.max_width);
    if frame.data.len() != frame.width as usize * frame.height as usize * 3 {
        return Err(CameraError::Encode("frame buffer does not match its dimensions".into()));
    }

    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, config.jpeg_quality.clamp(1, 100));
    encoder
        .encode(&frame.data, frame.width, frame.height, ExtendedColorType::Rgb8)
        .map_err(|e| CameraError::Encode(e.to_string()))?;

    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(&jpeg)))
}
