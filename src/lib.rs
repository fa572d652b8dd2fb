//! smile-match library crate.
//!
//! The scene orchestrator, capture pipeline and transition scheduler behind
//! the interactive experience, exposed for the binary and integration tests.

pub mod camera;
pub mod capture;
pub mod cli;
pub mod config;
pub mod event_loop;
pub mod input;
pub mod orchestrator;
pub mod scene;
pub mod scheduler;
pub mod services;
pub mod session;
