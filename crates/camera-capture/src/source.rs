//! Frame sources

use crate::{CameraError, VideoFrame};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// A camera-like source of frames
///
/// `acquire` must succeed before `capture` is called; `release` gives the
/// device back and may be called more than once.
pub trait FrameSource: Send + 'static {
    /// Open the device / stream
    fn acquire(&mut self) -> Result<(), CameraError>;

    /// Grab the current frame
    fn capture(&mut self) -> Result<VideoFrame, CameraError>;

    /// Release the device
    fn release(&mut self);

    /// Whether the source currently holds the device
    fn is_active(&self) -> bool;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn acquire(&mut self) -> Result<(), CameraError> {
        (**self).acquire()
    }

    fn capture(&mut self) -> Result<VideoFrame, CameraError> {
        (**self).capture()
    }

    fn release(&mut self) {
        (**self).release()
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}

/// Replays the images of a directory in file-name order, looping forever
pub struct ImageDirSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
    sequence: u32,
    active: bool,
}

impl ImageDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
            next: 0,
            sequence: 0,
            active: false,
        }
    }

    /// Number of frames found at acquisition
    pub fn frame_count(&self) -> usize {
        self.files.len()
    }

    fn list_images(dir: &Path) -> Result<Vec<PathBuf>, CameraError> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| CameraError::Open(format!("{}: {}", dir.display(), e)))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| matches!(ext.to_ascii_lowercase().as_str(), "jpg" | "jpeg" | "png"))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();
        Ok(files)
    }
}

impl FrameSource for ImageDirSource {
    fn acquire(&mut self) -> Result<(), CameraError> {
        let files = Self::list_images(&self.dir)?;
        if files.is_empty() {
            return Err(CameraError::Open(format!(
                "no images found in {}",
                self.dir.display()
            )));
        }
        info!("Replaying {} frames from {}", files.len(), self.dir.display());
        self.files = files;
        self.next = 0;
        self.active = true;
        Ok(())
    }

    fn capture(&mut self) -> Result<VideoFrame, CameraError> {
        if !self.active {
            return Err(CameraError::NotInitialized);
        }
        let path = &self.files[self.next % self.files.len()];
        self.next = (self.next + 1) % self.files.len();

        let rgb = image::open(path)
            .map_err(|e| CameraError::Stream(format!("{}: {}", path.display(), e)))?
            .to_rgb8();
        let (width, height) = rgb.dimensions();
        let timestamp_ns = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);

        self.sequence = self.sequence.wrapping_add(1);
        debug!("Captured frame {} from {}", self.sequence, path.display());
        VideoFrame::new(rgb.into_raw(), width, height, timestamp_ns, self.sequence)
    }

    fn release(&mut self) {
        if self.active {
            info!("Releasing frame source {}", self.dir.display());
        }
        self.active = false;
        self.files.clear();
    }

    fn is_active(&self) -> bool {
        self.active
    }
}
