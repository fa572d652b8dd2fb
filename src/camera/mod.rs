//! Camera access for the capture scene.
//!
//! This module provides the device boundary the capture pipeline talks to:
//! - Device and stream traits via [`CameraDevice`] and [`DeviceStream`]
//! - Built-in sources ([`SyntheticCamera`], [`StillImageCamera`], and the
//!   always-failing [`UnavailableCamera`] / [`DeniedCamera`])
//! - Frame types via [`Frame`], [`FrameFormat`] and [`Resolution`]

mod device;
mod frame_utils;
mod sources;
mod types;

pub use device::{CameraDevice, DeviceStream, StreamLease, StreamMonitor};
pub use frame_utils::{mirror_horizontal, resize_to, to_rgb_image};
pub use sources::{DeniedCamera, StillImageCamera, SyntheticCamera, UnavailableCamera};
pub use types::{CameraError, Frame, FrameFormat, Resolution};
