//! Scene orchestrator - the single source of truth for which scene is shown.
//!
//! Scenes never talk to each other; every hand-over goes through
//! [`Orchestrator::advance`], which only accepts triggers listed in the
//! transition table for the current scene.

use crate::capture::CapturedImage;
use crate::scene::{Scene, Trigger, TriggerKind};
use crate::services::{metadata, LogNavigator, Metadata, Navigator, NullReporter, Reporter};

/// Errors returned for calls that are not legal in the current scene.
///
/// These indicate a caller defect (a stale or doubled callback), never a
/// user-facing condition. State is unchanged when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrchestratorError {
    #[error("Trigger '{trigger}' is not valid from scene '{scene}'")]
    IllegalTrigger { scene: Scene, trigger: TriggerKind },
    #[error("Booking is not offered from scene '{scene}'")]
    BookingUnavailable { scene: Scene },
}

/// Owns the current scene and the captured artifact while Matching needs it.
pub struct Orchestrator {
    current: Scene,
    artifact: Option<CapturedImage>,
    history: Vec<Scene>,
    booking_url: String,
    reporter: Box<dyn Reporter>,
    navigator: Box<dyn Navigator>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("current", &self.current)
            .field("artifact", &self.artifact)
            .field("history", &self.history)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    /// Start at `Landing` with no reporting and a log-only navigator.
    pub fn new(booking_url: impl Into<String>) -> Self {
        Self {
            current: Scene::Landing,
            artifact: None,
            history: vec![Scene::Landing],
            booking_url: booking_url.into(),
            reporter: Box::new(NullReporter),
            navigator: Box::new(LogNavigator),
        }
    }

    pub fn with_reporter(mut self, reporter: Box<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_navigator(mut self, navigator: Box<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// The scene currently presented.
    pub fn current(&self) -> Scene {
        self.current
    }

    /// The captured image, held from the capture hand-off until Matching exits.
    pub fn artifact(&self) -> Option<&CapturedImage> {
        self.artifact.as_ref()
    }

    /// Scenes visited so far, oldest first.
    pub fn history(&self) -> &[Scene] {
        &self.history
    }

    pub fn booking_url(&self) -> &str {
        &self.booking_url
    }

    /// Move to the next scene according to the transition table.
    ///
    /// A trigger that is not valid from the current scene is rejected with
    /// `OrchestratorError::IllegalTrigger` and logged; nothing changes.
    pub fn advance(&mut self, trigger: Trigger) -> Result<Scene, OrchestratorError> {
        let from = self.current;
        let kind = trigger.kind();
        let Some(to) = from.next(kind) else {
            log::warn!("Rejected trigger '{}' in scene '{}'", kind, from);
            return Err(OrchestratorError::IllegalTrigger {
                scene: from,
                trigger: kind,
            });
        };

        let mut meta = metadata([("from", from.name()), ("to", to.name()), ("trigger", kind.name())]);
        match trigger {
            Trigger::Captured(image) => {
                meta.insert("digest".to_string(), image.digest().to_string());
                if let Some(previous) = self.artifact.replace(image) {
                    log::debug!("Replaced stale artifact {}", previous.short_digest());
                }
            }
            Trigger::Retry => {
                if let Some(discarded) = self.artifact.take() {
                    log::info!("Discarding capture {} for retry", discarded.short_digest());
                }
            }
            Trigger::Done => {
                // Booking and Trailer never show the capture
                if let Some(released) = self.artifact.take() {
                    log::debug!("Released capture {}", released.short_digest());
                }
            }
            Trigger::Start | Trigger::TryNow | Trigger::WatchTrailer => {}
        }

        self.current = to;
        self.history.push(to);
        log::info!("Scene {} -> {} ({})", from, to, kind);
        self.reporter.report("scene_advance", &meta);
        Ok(to)
    }

    /// Discard the capture and go back to `Capture`. Only valid from `Matching`.
    ///
    /// The caller is expected to re-open the camera when `Capture` is entered.
    pub fn retry(&mut self) -> Result<(), OrchestratorError> {
        self.advance(Trigger::Retry).map(|_| ())
    }

    /// Open the booking link. Not a state transition; only offered from
    /// `Booking` and `Trailer`.
    pub fn open_booking(&mut self) -> Result<(), OrchestratorError> {
        if !self.current.offers_booking() {
            log::warn!("Booking requested in scene '{}'", self.current);
            return Err(OrchestratorError::BookingUnavailable {
                scene: self.current,
            });
        }
        self.navigator.open_in_new_context(&self.booking_url);
        self.reporter.report(
            "booking_opened",
            &metadata([("scene", self.current.name()), ("url", self.booking_url.as_str())]),
        );
        Ok(())
    }

    /// Forward an event to the injected reporter.
    pub fn report(&self, event: &str, metadata: &Metadata) {
        self.reporter.report(event, metadata);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ImageFormat;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<String>>>);

    impl Reporter for Recorder {
        fn report(&self, event: &str, metadata: &Metadata) {
            let to = metadata.get("to").cloned().unwrap_or_default();
            self.0.lock().unwrap().push(format!("{}:{}", event, to));
        }
    }

    impl Navigator for Recorder {
        fn open_in_new_context(&self, url: &str) {
            self.0.lock().unwrap().push(format!("open:{}", url));
        }
    }

    fn image(byte: u8) -> CapturedImage {
        CapturedImage::from_encoded(vec![byte; 8], ImageFormat::Png, 2, 2)
    }

    fn at_matching() -> Orchestrator {
        let mut o = Orchestrator::new("https://tickets.example");
        o.advance(Trigger::Start).unwrap();
        o.advance(Trigger::TryNow).unwrap();
        o.advance(Trigger::Captured(image(1))).unwrap();
        o
    }

    #[test]
    fn test_initial_scene_is_landing() {
        let o = Orchestrator::new("u");
        assert_eq!(o.current(), Scene::Landing);
        assert!(o.artifact().is_none());
    }

    #[test]
    fn test_captured_stores_artifact() {
        let o = at_matching();
        assert_eq!(o.current(), Scene::Matching);
        assert_eq!(o.artifact(), Some(&image(1)));
    }

    #[test]
    fn test_illegal_trigger_is_noop() {
        let mut o = Orchestrator::new("u");
        let err = o.advance(Trigger::Captured(image(2))).unwrap_err();
        assert_eq!(
            err,
            OrchestratorError::IllegalTrigger {
                scene: Scene::Landing,
                trigger: TriggerKind::Captured
            }
        );
        assert_eq!(o.current(), Scene::Landing);
        assert!(o.artifact().is_none());
        assert_eq!(o.history(), &[Scene::Landing]);
    }

    #[test]
    fn test_double_start_rejected() {
        let mut o = Orchestrator::new("u");
        o.advance(Trigger::Start).unwrap();
        assert!(o.advance(Trigger::Start).is_err());
        assert_eq!(o.current(), Scene::Teaser);
    }

    #[test]
    fn test_retry_discards_artifact() {
        let mut o = at_matching();
        o.retry().unwrap();
        assert_eq!(o.current(), Scene::Capture);
        assert!(o.artifact().is_none());
    }

    #[test]
    fn test_retry_outside_matching_rejected() {
        let mut o = Orchestrator::new("u");
        assert!(o.retry().is_err());
        assert_eq!(o.current(), Scene::Landing);
    }

    #[test]
    fn test_done_releases_artifact() {
        let mut o = at_matching();
        assert_eq!(o.advance(Trigger::Done).unwrap(), Scene::Booking);
        assert!(o.artifact().is_none());
    }

    #[test]
    fn test_open_booking_only_from_booking_or_trailer() {
        let recorder = Recorder::default();
        let mut o = Orchestrator::new("https://tickets.example")
            .with_navigator(Box::new(recorder.clone()));
        assert_eq!(
            o.open_booking(),
            Err(OrchestratorError::BookingUnavailable {
                scene: Scene::Landing
            })
        );
        assert!(recorder.0.lock().unwrap().is_empty());

        o.advance(Trigger::Start).unwrap();
        o.advance(Trigger::TryNow).unwrap();
        o.advance(Trigger::Captured(image(3))).unwrap();
        o.advance(Trigger::Done).unwrap();
        o.open_booking().unwrap();
        assert_eq!(o.current(), Scene::Booking);
        assert_eq!(
            recorder.0.lock().unwrap().as_slice(),
            &["open:https://tickets.example".to_string()]
        );
    }

    #[test]
    fn test_accepted_triggers_are_reported() {
        let recorder = Recorder::default();
        let mut o = Orchestrator::new("u").with_reporter(Box::new(recorder.clone()));
        o.advance(Trigger::Start).unwrap();
        let _ = o.advance(Trigger::Done);
        o.advance(Trigger::TryNow).unwrap();
        assert_eq!(
            recorder.0.lock().unwrap().as_slice(),
            &[
                "scene_advance:teaser".to_string(),
                "scene_advance:capture".to_string()
            ]
        );
    }

    #[test]
    fn test_history_records_visits() {
        let mut o = at_matching();
        o.retry().unwrap();
        assert_eq!(
            o.history(),
            &[
                Scene::Landing,
                Scene::Teaser,
                Scene::Capture,
                Scene::Matching,
                Scene::Capture
            ]
        );
    }
}
