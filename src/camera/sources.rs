//! Built-in camera sources.

use std::path::{Path, PathBuf};

use image::RgbImage;

use super::device::{CameraDevice, DeviceStream, StreamLease, StreamMonitor};
use super::types::{CameraError, Frame, Resolution};

/// Animated gradient test pattern. Always available.
#[derive(Debug, Default)]
pub struct SyntheticCamera {
    resolution: Resolution,
    monitor: StreamMonitor,
}

impl SyntheticCamera {
    pub fn new(resolution: Resolution) -> Self {
        Self::with_monitor(resolution, StreamMonitor::new())
    }

    pub fn with_monitor(resolution: Resolution, monitor: StreamMonitor) -> Self {
        Self {
            resolution,
            monitor,
        }
    }

    pub fn monitor(&self) -> &StreamMonitor {
        &self.monitor
    }
}

impl CameraDevice for SyntheticCamera {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn request_stream(&mut self) -> Result<Box<dyn DeviceStream>, CameraError> {
        self.monitor.record_request();
        if self.resolution.pixel_count() == 0 {
            return Err(CameraError::StreamFailed(format!(
                "invalid resolution {}x{}",
                self.resolution.width, self.resolution.height
            )));
        }
        log::debug!(
            "Synthetic stream started at {}x{}",
            self.resolution.width,
            self.resolution.height
        );
        Ok(Box::new(SyntheticStream {
            resolution: self.resolution,
            lease: self.monitor.lease(),
            frame_index: 0,
        }))
    }
}

struct SyntheticStream {
    resolution: Resolution,
    lease: StreamLease,
    frame_index: u32,
}

impl DeviceStream for SyntheticStream {
    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn sample_frame(&mut self) -> Result<Frame, CameraError> {
        if !self.lease.is_held() {
            return Err(CameraError::FrameUnavailable("stream released".to_string()));
        }
        let Resolution { width, height } = self.resolution;
        let shift = self.frame_index;
        self.frame_index = self.frame_index.wrapping_add(1);

        let mut data = Vec::with_capacity(self.resolution.pixel_count() * 3);
        for y in 0..height {
            for x in 0..width {
                data.push(((x.wrapping_add(shift) % width) * 255 / width) as u8);
                data.push((y * 255 / height) as u8);
                data.push((shift % 256) as u8);
            }
        }
        Ok(Frame::rgb(data, width, height))
    }

    fn release(&mut self) {
        if self.lease.is_held() {
            log::debug!("Synthetic stream released");
        }
        self.lease.release();
    }

    fn is_live(&self) -> bool {
        self.lease.is_held()
    }
}

/// Serves an image file as if it were a live feed.
#[derive(Debug)]
pub struct StillImageCamera {
    path: PathBuf,
    monitor: StreamMonitor,
}

impl StillImageCamera {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            monitor: StreamMonitor::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn monitor(&self) -> &StreamMonitor {
        &self.monitor
    }
}

impl CameraDevice for StillImageCamera {
    fn name(&self) -> &str {
        "image"
    }

    fn request_stream(&mut self) -> Result<Box<dyn DeviceStream>, CameraError> {
        self.monitor.record_request();
        if !self.path.exists() {
            log::warn!("Camera image not found: {}", self.path.display());
            return Err(CameraError::DeviceUnavailable);
        }
        let image = image::open(&self.path)
            .map_err(|e| CameraError::StreamFailed(format!("{}: {}", self.path.display(), e)))?
            .to_rgb8();
        log::debug!(
            "Still image stream started from {} ({}x{})",
            self.path.display(),
            image.width(),
            image.height()
        );
        Ok(Box::new(StillImageStream {
            image,
            lease: self.monitor.lease(),
        }))
    }
}

struct StillImageStream {
    image: RgbImage,
    lease: StreamLease,
}

impl DeviceStream for StillImageStream {
    fn resolution(&self) -> Resolution {
        Resolution {
            width: self.image.width(),
            height: self.image.height(),
        }
    }

    fn sample_frame(&mut self) -> Result<Frame, CameraError> {
        if !self.lease.is_held() {
            return Err(CameraError::FrameUnavailable("stream released".to_string()));
        }
        Ok(Frame::rgb(
            self.image.as_raw().clone(),
            self.image.width(),
            self.image.height(),
        ))
    }

    fn release(&mut self) {
        self.lease.release();
    }

    fn is_live(&self) -> bool {
        self.lease.is_held()
    }
}

/// A machine with no camera attached.
#[derive(Debug, Default)]
pub struct UnavailableCamera {
    monitor: StreamMonitor,
}

impl UnavailableCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn monitor(&self) -> &StreamMonitor {
        &self.monitor
    }
}

impl CameraDevice for UnavailableCamera {
    fn name(&self) -> &str {
        "none"
    }

    fn request_stream(&mut self) -> Result<Box<dyn DeviceStream>, CameraError> {
        self.monitor.record_request();
        Err(CameraError::DeviceUnavailable)
    }
}

/// A camera whose access request is always declined.
#[derive(Debug, Default)]
pub struct DeniedCamera {
    monitor: StreamMonitor,
}

impl DeniedCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn monitor(&self) -> &StreamMonitor {
        &self.monitor
    }
}

impl CameraDevice for DeniedCamera {
    fn name(&self) -> &str {
        "denied"
    }

    fn request_stream(&mut self) -> Result<Box<dyn DeviceStream>, CameraError> {
        self.monitor.record_request();
        Err(CameraError::PermissionDenied)
    }
}
