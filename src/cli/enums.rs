//! CLI enum types.

use clap::ValueEnum;

use crate::config::CameraSource;

/// Where camera frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum CameraArg {
    /// Generated test pattern
    #[default]
    Synthetic,
    /// A still image file standing in for the camera (needs --image)
    Image,
    /// No camera attached
    None,
    /// Camera present but access refused
    Denied,
}

impl From<CameraArg> for CameraSource {
    fn from(c: CameraArg) -> Self {
        match c {
            CameraArg::Synthetic => CameraSource::Synthetic,
            CameraArg::Image => CameraSource::Image,
            CameraArg::None => CameraSource::None,
            CameraArg::Denied => CameraSource::Denied,
        }
    }
}
