//! Camera held by a running session

use camera_capture::{to_jpeg_data_url, CameraError, CaptureConfig, FrameSource};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

type Slot = Option<Box<dyn FrameSource>>;

/// An acquired camera shared by the session handle, the poll loop and
/// in-flight requests.
///
/// `release` empties the slot for all of them at once; grabs after that
/// fail with `CameraError::NotInitialized`.
#[derive(Clone)]
pub(crate) struct SharedCamera {
    slot: Arc<Mutex<Slot>>,
}

impl SharedCamera {
    /// Wrap a source that has already been acquired
    pub(crate) fn new<F: FrameSource>(source: F) -> Self {
        let source: Box<dyn FrameSource> = Box::new(source);
        Self {
            slot: Arc::new(Mutex::new(Some(source))),
        }
    }

    /// Capture a frame and encode it for upload. Blocking.
    pub(crate) fn grab(&self, encoding: &CaptureConfig) -> Result<String, CameraError> {
        let frame = {
            let mut slot = self.lock();
            let source = slot.as_mut().ok_or(CameraError::NotInitialized)?;
            source.capture()?
        };
        to_jpeg_data_url(&frame, encoding)
    }

    pub(crate) fn release(&self) {
        if let Some(mut source) = self.lock().take() {
            source.release();
            info!("Camera released");
        }
    }

    pub(crate) fn is_held(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        // A panicking capture leaves the source usable for release
        self.slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
