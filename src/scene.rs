//! Scenes of the experience and the legal transitions between them.

use std::fmt;

use crate::capture::CapturedImage;

/// A full-screen presentation state. Exactly one is current at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scene {
    /// Intro screen with the start button
    Landing,
    /// The comparison image the user is asked to match
    Teaser,
    /// Live camera feed and shutter
    Capture,
    /// Side-by-side comparison of the teaser image and the capture
    Matching,
    /// Poster with booking and trailer buttons
    Booking,
    /// Trailer playback
    Trailer,
}

impl Scene {
    /// All scenes in presentation order.
    pub const ALL: [Scene; 6] = [
        Scene::Landing,
        Scene::Teaser,
        Scene::Capture,
        Scene::Matching,
        Scene::Booking,
        Scene::Trailer,
    ];

    /// Scene reached from `self` by `trigger`, or `None` if the trigger is
    /// not legal here.
    pub fn next(self, trigger: TriggerKind) -> Option<Scene> {
        match (self, trigger) {
            (Scene::Landing, TriggerKind::Start) => Some(Scene::Teaser),
            (Scene::Teaser, TriggerKind::TryNow) => Some(Scene::Capture),
            (Scene::Capture, TriggerKind::Captured) => Some(Scene::Matching),
            (Scene::Matching, TriggerKind::Done) => Some(Scene::Booking),
            (Scene::Matching, TriggerKind::Retry) => Some(Scene::Capture),
            (Scene::Booking, TriggerKind::WatchTrailer) => Some(Scene::Trailer),
            _ => None,
        }
    }

    /// True if no trigger leads anywhere from this scene.
    pub fn is_terminal(self) -> bool {
        TriggerKind::ALL.iter().all(|t| self.next(*t).is_none())
    }

    /// True if the external booking link may be opened from this scene.
    pub fn offers_booking(self) -> bool {
        matches!(self, Scene::Booking | Scene::Trailer)
    }

    /// Stable lowercase name, used in logs and analytics metadata.
    pub fn name(self) -> &'static str {
        match self {
            Scene::Landing => "landing",
            Scene::Teaser => "teaser",
            Scene::Capture => "capture",
            Scene::Matching => "matching",
            Scene::Booking => "booking",
            Scene::Trailer => "trailer",
        }
    }
}

impl fmt::Display for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Payload-free identity of a [`Trigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriggerKind {
    Start,
    TryNow,
    Captured,
    Done,
    Retry,
    WatchTrailer,
}

impl TriggerKind {
    pub const ALL: [TriggerKind; 6] = [
        TriggerKind::Start,
        TriggerKind::TryNow,
        TriggerKind::Captured,
        TriggerKind::Done,
        TriggerKind::Retry,
        TriggerKind::WatchTrailer,
    ];

    pub fn name(self) -> &'static str {
        match self {
            TriggerKind::Start => "start",
            TriggerKind::TryNow => "tryNow",
            TriggerKind::Captured => "captured",
            TriggerKind::Done => "done",
            TriggerKind::Retry => "retry",
            TriggerKind::WatchTrailer => "watchTrailer",
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A user-initiated event that may move the experience to another scene.
#[derive(Debug, Clone)]
pub enum Trigger {
    Start,
    TryNow,
    /// Capture finished; carries the artifact for the Matching scene
    Captured(CapturedImage),
    Done,
    Retry,
    WatchTrailer,
}

impl Trigger {
    pub fn kind(&self) -> TriggerKind {
        match self {
            Trigger::Start => TriggerKind::Start,
            Trigger::TryNow => TriggerKind::TryNow,
            Trigger::Captured(_) => TriggerKind::Captured,
            Trigger::Done => TriggerKind::Done,
            Trigger::Retry => TriggerKind::Retry,
            Trigger::WatchTrailer => TriggerKind::WatchTrailer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        assert_eq!(Scene::Landing.next(TriggerKind::Start), Some(Scene::Teaser));
        assert_eq!(Scene::Teaser.next(TriggerKind::TryNow), Some(Scene::Capture));
        assert_eq!(
            Scene::Capture.next(TriggerKind::Captured),
            Some(Scene::Matching)
        );
        assert_eq!(Scene::Matching.next(TriggerKind::Done), Some(Scene::Booking));
        assert_eq!(Scene::Matching.next(TriggerKind::Retry), Some(Scene::Capture));
        assert_eq!(
            Scene::Booking.next(TriggerKind::WatchTrailer),
            Some(Scene::Trailer)
        );
    }

    #[test]
    fn test_table_has_exactly_six_edges() {
        let edges = Scene::ALL
            .iter()
            .flat_map(|s| TriggerKind::ALL.iter().filter_map(move |t| s.next(*t)))
            .count();
        assert_eq!(edges, 6);
    }

    #[test]
    fn test_only_trailer_is_terminal() {
        for scene in Scene::ALL {
            assert_eq!(scene.is_terminal(), scene == Scene::Trailer, "{}", scene);
        }
    }

    #[test]
    fn test_captured_out_of_order_is_rejected() {
        for scene in Scene::ALL {
            if scene != Scene::Capture {
                assert_eq!(scene.next(TriggerKind::Captured), None);
            }
        }
    }

    #[test]
    fn test_offers_booking() {
        assert!(Scene::Booking.offers_booking());
        assert!(Scene::Trailer.offers_booking());
        assert!(!Scene::Matching.offers_booking());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(Scene::Matching.to_string(), "matching");
        assert_eq!(TriggerKind::WatchTrailer.to_string(), "watchTrailer");
        assert_eq!(Trigger::Retry.kind(), TriggerKind::Retry);
    }
}
