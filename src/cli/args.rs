//! CLI argument structs and subcommands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::enums::CameraArg;

/// Take a selfie, match the smile, book the movie
#[derive(Parser, Debug)]
#[command(name = "smile-match")]
#[command(version, about = "Interactive smile-match promo experience", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Options for an interactive run. Also accepted without the `run` subcommand,
/// but not before a subcommand.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Camera source
    #[arg(long)]
    pub camera: Option<CameraArg>,

    /// Image used by the `image` camera source
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// Keep the selfie unmirrored
    #[arg(long)]
    pub no_mirror: bool,

    /// Write the captured selfie (PNG) here when matching starts
    #[arg(long)]
    pub save_capture: Option<PathBuf>,

    /// Do not log analytics events
    #[arg(long)]
    pub no_analytics: bool,

    /// Booking page to open
    #[arg(long)]
    pub booking_url: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the experience (default)
    Run(RunArgs),
    /// Configuration management
    Config {
        /// Config file path
        #[arg(long, short)]
        config: Option<PathBuf>,

        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Create default config file
    Init,
}
