//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing, enums, and subcommand handlers.

mod args;
mod commands;
mod enums;

pub use args::{Args, Command, ConfigAction, RunArgs};
pub use commands::{build_camera, handle_config_action, resolve_config};
pub use enums::CameraArg;
