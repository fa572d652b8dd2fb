//! Side-channel capabilities injected into the core: analytics reporting and
//! opening the booking link.
//!
//! Both are fire-and-forget. Callers never wait on them and a failing
//! implementation must not affect the flow.

use std::collections::BTreeMap;
use std::process::{Command, Stdio};

/// Event metadata, ordered so log lines are stable.
pub type Metadata = BTreeMap<String, String>;

/// Build [`Metadata`] from string pairs.
pub fn metadata<const N: usize>(pairs: [(&str, &str); N]) -> Metadata {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Best-effort analytics sink.
pub trait Reporter: Send {
    fn report(&self, event: &str, metadata: &Metadata);
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn report(&self, _event: &str, _metadata: &Metadata) {}
}

/// Writes events to the log at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn report(&self, event: &str, metadata: &Metadata) {
        let fields: Vec<String> = metadata.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        log::info!(target: "analytics", "{} {}", event, fields.join(" "));
    }
}

/// Opens an external URL outside the experience.
pub trait Navigator: Send {
    fn open_in_new_context(&self, url: &str);
}

/// Only logs the URL. Used when no desktop is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn open_in_new_context(&self, url: &str) {
        log::info!("Open in new context: {}", url);
    }
}

/// Hands the URL to the platform opener (`open`, `xdg-open`, `start`).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemNavigator;

impl SystemNavigator {
    fn opener() -> (&'static str, &'static [&'static str]) {
        if cfg!(target_os = "macos") {
            ("open", &[])
        } else if cfg!(target_os = "windows") {
            ("cmd", &["/C", "start", ""])
        } else {
            ("xdg-open", &[])
        }
    }
}

impl Navigator for SystemNavigator {
    fn open_in_new_context(&self, url: &str) {
        let (program, args) = Self::opener();
        let result = Command::new(program)
            .args(args)
            .arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        match result {
            Ok(_) => log::info!("Opened {} with {}", url, program),
            Err(e) => log::warn!("Could not open {} with {}: {}", url, program, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_builder() {
        let meta = metadata([("to", "teaser"), ("from", "landing")]);
        let keys: Vec<&str> = meta.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["from", "to"]);
        assert_eq!(meta["to"], "teaser");
    }

    #[test]
    fn test_null_and_log_reporters_accept_events() {
        let meta = metadata([("scene", "landing")]);
        NullReporter.report("scene_advance", &meta);
        LogReporter.report("scene_advance", &meta);
    }

    #[test]
    fn test_log_navigator_does_not_spawn() {
        LogNavigator.open_in_new_context("https://example.com/tickets");
    }

    #[test]
    fn test_system_opener_is_known() {
        let (program, _) = SystemNavigator::opener();
        assert!(["open", "cmd", "xdg-open"].contains(&program));
    }
}
