//! Video frame types and processing

use crate::CameraError;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixel data (width * height * 3)
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
    /// Capture timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    /// Create a new video frame from raw RGB data
    pub fn new(
        data: Vec<u8>,
        width: u32,
        height: u32,
        timestamp_ns: u64,
        sequence: u32,
    ) -> Result<Self, CameraError> {
        let expected = width as usize * height as usize * 3;
        if data.len() != expected || width == 0 || height == 0 {
            return Err(CameraError::Format(format!(
                "{}x{} RGB frame needs {} bytes, got {}",
                width,
                height,
                expected,
                data.len()
            )));
        }
        Ok(Self {
            data,
            width,
            height,
            timestamp_ns,
            sequence,
        })
    }

    /// Solid-color frame, mostly useful as a test pattern
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let data = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            data,
            width,
            height,
            timestamp_ns: 0,
            sequence: 0,
        }
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.data.get(idx..idx + 3).map(|px| [px[0], px[1], px[2]])
    }

    /// Downscale to at most `max_width`, keeping the aspect ratio
    pub fn fit_width(&self, max_width: u32) -> VideoFrame {
        if max_width == 0 || self.width <= max_width {
            return self.clone();
        }
        let height = ((self.height as u64 * max_width as u64) / self.width as u64).max(1) as u32;
        self.resize(max_width, height)
    }

    /// Resize frame (nearest neighbor)
    pub fn resize(&self, new_width: u32, new_height: u32) -> VideoFrame {
        let mut resized = Vec::with_capacity((new_width * new_height * 3) as usize);

        let x_ratio = self.width as f32 / new_width as f32;
        let y_ratio = self.height as f32 / new_height as f32;

        for y in 0..new_height {
            for x in 0..new_width {
                let x0 = (x as f32 * x_ratio).floor() as u32;
                let y0 = (y as f32 * y_ratio).floor() as u32;

                match self.get_pixel(x0.min(self.width - 1), y0.min(self.height - 1)) {
                    Some(pixel) => resized.extend_from_slice(&pixel),
                    None => resized.extend_from_slice(&[0, 0, 0]),
                }
            }
        }

        VideoFrame {
            data: resized,
            width: new_width,
            height: new_height,
            timestamp_ns: self.timestamp_ns,
            sequence: self.sequence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_wrong_buffer_size() {
        assert!(VideoFrame::new(vec![0; 10], 2, 2, 0, 0).is_err());
        assert!(VideoFrame::new(vec![0; 12], 2, 2, 0, 0).is_ok());
    }

    #[test]
    fn test_fit_width_keeps_aspect_ratio() {
        let frame = VideoFrame::filled(1280, 720, [10, 20, 30]);
        let small = frame.fit_width(640);

        assert_eq!((small.width, small.height), (640, 360));
        assert_eq!(small.data.len(), 640 * 360 * 3);
        assert_eq!(small.get_pixel(5, 5), Some([10, 20, 30]));

        // Narrow frames are left alone
        assert_eq!(small.fit_width(1024).width, 640);
    }
}
