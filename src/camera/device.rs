//! Device boundary: requesting a live stream and sampling frames from it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::types::{CameraError, Frame, Resolution};

/// A camera that can be asked for a live stream.
pub trait CameraDevice: Send {
    /// Human-readable device name.
    fn name(&self) -> &str;

    /// Request access and start a live stream.
    ///
    /// # Errors
    /// * `CameraError::DeviceUnavailable` - No camera present
    /// * `CameraError::PermissionDenied` - The user declined access
    /// * `CameraError::StreamFailed` - The stream could not be started
    fn request_stream(&mut self) -> Result<Box<dyn DeviceStream>, CameraError>;
}

/// Handle to a live camera feed. Releasing it turns the camera off.
pub trait DeviceStream: Send {
    /// Resolution frames are delivered at.
    fn resolution(&self) -> Resolution;

    /// Sample the current video frame.
    fn sample_frame(&mut self) -> Result<Frame, CameraError>;

    /// Stop the feed. Must be idempotent; dropping the stream also releases it.
    fn release(&mut self);

    /// True until `release` has been called.
    fn is_live(&self) -> bool;
}

#[derive(Debug, Default)]
struct Counters {
    active: AtomicUsize,
    requests: AtomicUsize,
}

/// Shared counters of stream requests and currently live streams.
///
/// Devices hand a [`StreamLease`] to each stream they open, so the number of
/// live camera feeds can be observed from outside (the camera indicator
/// should be off whenever this reads zero).
#[derive(Debug, Clone, Default)]
pub struct StreamMonitor {
    counters: Arc<Counters>,
}

impl StreamMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of streams currently live.
    pub fn active(&self) -> usize {
        self.counters.active.load(Ordering::SeqCst)
    }

    /// Number of times a stream has been requested, successful or not.
    pub fn requests(&self) -> usize {
        self.counters.requests.load(Ordering::SeqCst)
    }

    /// Record a stream request.
    pub fn record_request(&self) {
        self.counters.requests.fetch_add(1, Ordering::SeqCst);
    }

    /// Take a lease for a newly started stream.
    pub fn lease(&self) -> StreamLease {
        self.counters.active.fetch_add(1, Ordering::SeqCst);
        StreamLease {
            counters: Some(Arc::clone(&self.counters)),
        }
    }
}

/// Marks one live stream. Released explicitly or on drop, at most once.
#[derive(Debug)]
pub struct StreamLease {
    counters: Option<Arc<Counters>>,
}

impl StreamLease {
    pub fn release(&mut self) {
        if let Some(counters) = self.counters.take() {
            counters.active.fetch_sub(1, Ordering::SeqCst);
        }
    }

    pub fn is_held(&self) -> bool {
        self.counters.is_some()
    }
}

impl Drop for StreamLease {
    fn drop(&mut self) {
        self.release();
    }
}
