//! Capture pipeline - turns a live camera feed into a single still image.
//!
//! The pipeline moves through
//! `Idle -> StreamRequested -> Live -> Flashing -> Frozen -> HandedOff`.
//! The device stream is held only between a successful [`CapturePipeline::open`]
//! and [`CapturePipeline::hand_off`] / [`CapturePipeline::reset`], so the
//! camera never stays on after the capture scene goes away.

mod artifact;
mod errors;

use std::fmt;

pub use artifact::{CapturedImage, ImageFormat};
pub use errors::CaptureError;

use crate::camera::{self, CameraDevice, DeviceStream, Resolution};

/// Lifecycle state of a [`CapturePipeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// No stream held
    Idle,
    /// Waiting for the device to grant a stream
    StreamRequested,
    /// Live feed is showing
    Live,
    /// Still has been taken; the flash overlay is showing
    Flashing,
    /// Still is displayed in place of the live feed
    Frozen,
    /// Still was handed to the caller; stream released
    HandedOff,
}

impl CaptureState {
    pub fn name(&self) -> &'static str {
        match self {
            CaptureState::Idle => "idle",
            CaptureState::StreamRequested => "requesting stream",
            CaptureState::Live => "live",
            CaptureState::Flashing => "flashing",
            CaptureState::Frozen => "frozen",
            CaptureState::HandedOff => "handed off",
        }
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Settings for the still capture.
#[derive(Debug, Clone)]
pub struct CaptureSettings {
    /// Fixed raster size the frame is scaled into
    pub raster: Resolution,
    /// Mirror horizontally (selfie mode)
    pub mirror: bool,
    /// Length of the flash substate in milliseconds
    pub flash_ms: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            raster: Resolution::CAPTURE,
            mirror: true, // Default to selfie mode
            flash_ms: 300,
        }
    }
}

impl CaptureSettings {
    pub fn with_raster(mut self, raster: Resolution) -> Self {
        self.raster = raster;
        self
    }

    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn with_flash_ms(mut self, flash_ms: u32) -> Self {
        self.flash_ms = flash_ms;
        self
    }
}

/// Bridges a camera device to a single [`CapturedImage`].
pub struct CapturePipeline {
    device: Box<dyn CameraDevice>,
    settings: CaptureSettings,
    state: CaptureState,
    stream: Option<Box<dyn DeviceStream>>,
    artifact: Option<CapturedImage>,
    flash_remaining_ms: u32,
}

impl fmt::Debug for CapturePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapturePipeline")
            .field("device", &self.device.name())
            .field("state", &self.state)
            .field("streaming", &self.is_streaming())
            .field("artifact", &self.artifact)
            .finish_non_exhaustive()
    }
}

impl CapturePipeline {
    pub fn new(device: Box<dyn CameraDevice>, settings: CaptureSettings) -> Self {
        Self {
            device,
            settings,
            state: CaptureState::Idle,
            stream: None,
            artifact: None,
            flash_remaining_ms: 0,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn settings(&self) -> &CaptureSettings {
        &self.settings
    }

    pub fn device_name(&self) -> &str {
        self.device.name()
    }

    /// True while a device stream is held.
    pub fn is_streaming(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.is_live())
    }

    /// Resolution of the live feed, if one is held.
    pub fn stream_resolution(&self) -> Option<Resolution> {
        self.stream.as_ref().map(|s| s.resolution())
    }

    /// The frozen still, while it is being shown.
    pub fn preview(&self) -> Option<&CapturedImage> {
        match self.state {
            CaptureState::Flashing | CaptureState::Frozen => self.artifact.as_ref(),
            _ => None,
        }
    }

    /// Request the device stream.
    ///
    /// On failure the pipeline stays `Idle`; the caller decides how to surface
    /// the condition and may call `open` again.
    ///
    /// # Errors
    /// * `CaptureError::IllegalState` - Not `Idle`
    /// * `CaptureError::Camera` - `DeviceUnavailable`, `PermissionDenied` or a stream failure
    pub fn open(&mut self) -> Result<(), CaptureError> {
        self.require(CaptureState::Idle, "open")?;

        self.state = CaptureState::StreamRequested;
        log::debug!("Requesting stream from {} camera", self.device.name());

        match self.device.request_stream() {
            Ok(stream) => {
                let res = stream.resolution();
                log::info!(
                    "Camera stream live ({}, {}x{})",
                    self.device.name(),
                    res.width,
                    res.height
                );
                self.stream = Some(stream);
                self.state = CaptureState::Live;
                Ok(())
            }
            Err(e) => {
                log::warn!("Camera stream request failed: {}", e);
                self.state = CaptureState::Idle;
                Err(e.into())
            }
        }
    }

    /// Take the still: sample the current frame, scale it into the fixed
    /// raster, encode it, and enter `Flashing`.
    ///
    /// The artifact is complete when this returns. If the frame cannot be
    /// sampled or encoded the pipeline stays `Live`.
    pub fn capture(&mut self) -> Result<(), CaptureError> {
        self.require(CaptureState::Live, "capture")?;

        let stream = self.stream.as_mut().ok_or(CaptureError::IllegalState {
            operation: "capture",
            state: self.state,
        })?;
        let mut frame = stream.sample_frame()?;
        if !frame.is_well_formed() {
            return Err(CaptureError::Encode(format!(
                "frame buffer of {} bytes does not match {}x{}",
                frame.data.len(),
                frame.width,
                frame.height
            )));
        }
        if self.settings.mirror {
            camera::mirror_horizontal(&mut frame);
        }
        let raster = camera::resize_to(&frame, self.settings.raster).ok_or_else(|| {
            CaptureError::Encode(format!(
                "cannot scale {}x{} frame into {}x{}",
                frame.width, frame.height, self.settings.raster.width, self.settings.raster.height
            ))
        })?;
        let image = CapturedImage::encode(&raster, ImageFormat::Png)?;

        log::info!(
            "Captured {}x{} still ({} bytes, {})",
            image.width(),
            image.height(),
            image.data().len(),
            image.short_digest()
        );
        self.artifact = Some(image);
        self.flash_remaining_ms = self.settings.flash_ms;
        self.state = if self.settings.flash_ms == 0 {
            CaptureState::Frozen
        } else {
            CaptureState::Flashing
        };
        Ok(())
    }

    /// Advance the flash. Returns true on the tick the still becomes `Frozen`.
    pub fn tick(&mut self, delta_ms: u32) -> bool {
        if self.state != CaptureState::Flashing {
            return false;
        }
        self.flash_remaining_ms = self.flash_remaining_ms.saturating_sub(delta_ms);
        if self.flash_remaining_ms == 0 {
            self.state = CaptureState::Frozen;
            log::debug!("Flash complete, still frozen");
            true
        } else {
            false
        }
    }

    /// Release the stream and give up the still.
    pub fn hand_off(&mut self) -> Result<CapturedImage, CaptureError> {
        self.require(CaptureState::Frozen, "hand off")?;
        let image = self.artifact.take().ok_or(CaptureError::IllegalState {
            operation: "hand off",
            state: self.state,
        })?;
        self.release_stream();
        self.state = CaptureState::HandedOff;
        log::debug!("Handed off still {}", image.short_digest());
        Ok(image)
    }

    /// Tear down the stream (if held), discard any still, and return to `Idle`.
    /// Valid from every state.
    pub fn reset(&mut self) {
        self.release_stream();
        if let Some(discarded) = self.artifact.take() {
            log::debug!("Discarded still {}", discarded.short_digest());
        }
        self.flash_remaining_ms = 0;
        if self.state != CaptureState::Idle {
            log::debug!("Capture pipeline reset from {}", self.state);
        }
        self.state = CaptureState::Idle;
    }

    fn require(&self, expected: CaptureState, operation: &'static str) -> Result<(), CaptureError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(CaptureError::IllegalState {
                operation,
                state: self.state,
            })
        }
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
            log::debug!("Camera stream released");
        }
    }
}

impl Drop for CapturePipeline {
    fn drop(&mut self) {
        self.release_stream();
    }
}
