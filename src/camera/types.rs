//! Camera types and data structures.

use std::time::Instant;

/// Camera resolution settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Low resolution (320x240)
    pub const LOW: Resolution = Resolution {
        width: 320,
        height: 240,
    };

    /// Medium resolution (640x480) - balanced, recommended
    pub const MEDIUM: Resolution = Resolution {
        width: 640,
        height: 480,
    };

    /// Square raster the capture is encoded into (500x500)
    pub const CAPTURE: Resolution = Resolution {
        width: 500,
        height: 500,
    };

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::MEDIUM
    }
}

/// Pixel format of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// RGB format (3 bytes per pixel)
    Rgb,
}

/// A raster sampled from a live stream.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data in RGB format
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: FrameFormat,
    /// Timestamp when frame was sampled
    pub timestamp: Instant,
}

impl Frame {
    /// Build an RGB frame, stamped now.
    pub fn rgb(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
            format: FrameFormat::Rgb,
            timestamp: Instant::now(),
        }
    }

    /// Get the number of bytes per pixel (3 for RGB).
    pub fn bytes_per_pixel(&self) -> usize {
        match self.format {
            FrameFormat::Rgb => 3,
        }
    }

    pub fn resolution(&self) -> Resolution {
        Resolution {
            width: self.width,
            height: self.height,
        }
    }

    /// True if the buffer length matches the declared dimensions.
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.resolution().pixel_count() * self.bytes_per_pixel()
    }
}

/// Errors at the camera device boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    /// No camera present
    #[error("No camera available. Make sure a camera is connected")]
    DeviceUnavailable,
    /// The user declined camera access
    #[error("Camera permission denied. Allow camera access and try again")]
    PermissionDenied,
    /// The device was found but its stream could not be started
    #[error("Failed to start camera stream: {0}")]
    StreamFailed(String),
    /// The stream is live but no frame could be read
    #[error("No frame available from camera: {0}")]
    FrameUnavailable(String),
}
