//! Session - wires the orchestrator, the capture pipeline and the transition
//! scheduler into one experience.
//!
//! Scenes only express intent ([`Action`]). The session plays the outgoing
//! scene's exit through the scheduler, then commits the trigger to the
//! orchestrator. Whatever a scene owns (pending timer, camera stream) is torn
//! down as soon as the scene is left.

use std::fmt;

use crate::camera::{CameraDevice, CameraError};
use crate::capture::{CaptureError, CapturePipeline, CaptureState};
use crate::config::{Config, TimingConfig};
use crate::orchestrator::{Orchestrator, OrchestratorError};
use crate::scene::{Scene, Trigger, TriggerKind};
use crate::scheduler::TransitionScheduler;
use crate::services::{metadata, Navigator, Reporter};

/// What the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Start,
    TryNow,
    Shutter,
    Done,
    Retry,
    WatchTrailer,
    BookNow,
    ReopenCamera,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Start => "start",
            Action::TryNow => "try now",
            Action::Shutter => "shutter",
            Action::Done => "done",
            Action::Retry => "retry",
            Action::WatchTrailer => "watch trailer",
            Action::BookNow => "book now",
            Action::ReopenCamera => "reopen camera",
        }
    }

    /// Trigger this action commits once the exit animation has played.
    fn trigger(&self) -> Option<TriggerKind> {
        match self {
            Action::Start => Some(TriggerKind::Start),
            Action::TryNow => Some(TriggerKind::TryNow),
            Action::Done => Some(TriggerKind::Done),
            Action::Retry => Some(TriggerKind::Retry),
            Action::WatchTrailer => Some(TriggerKind::WatchTrailer),
            Action::Shutter | Action::BookNow | Action::ReopenCamera => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Presentation phase of the current scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Scene is interactive
    Presenting,
    /// Scene's exit animation is playing; the next scene is not shown yet
    Exiting,
}

/// Deferred work held by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    /// Commit a payload-free trigger
    Commit(TriggerKind),
    /// Frozen still has been shown long enough; start the capture exit
    BeginCaptureExit,
    /// Capture exit finished; hand off the still and move to Matching
    CommitCapture,
}

/// Something the presentation layer may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    ExitStarted { scene: Scene },
    SceneChanged { from: Scene, to: Scene },
    CameraReady,
    CameraFailed(CameraError),
    CaptureTaken { digest: String },
    CaptureFrozen,
    BookingOpened,
}

/// Errors returned when an action cannot be carried out.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("'{action}' is not available in scene '{scene}'")]
    ActionNotAvailable { action: Action, scene: Scene },
    #[error("Scene '{scene}' is already leaving")]
    TransitionPending { scene: Scene },
    #[error("Session has ended")]
    Closed,
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

/// Snapshot of what should be on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub scene: Scene,
    pub phase: Phase,
    pub capture_state: CaptureState,
    /// Set when the camera could not be opened; the capture scene shows a
    /// blocked-camera prompt with a way to ask again
    pub camera_error: Option<CameraError>,
    pub has_artifact: bool,
    pub pending_ms: Option<u32>,
}

/// One user's pass through the experience.
pub struct Session {
    orchestrator: Orchestrator,
    pipeline: CapturePipeline,
    scheduler: TransitionScheduler<SessionStep>,
    timing: TimingConfig,
    phase: Phase,
    camera_error: Option<CameraError>,
    closed: bool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("view", &self.view())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(orchestrator: Orchestrator, pipeline: CapturePipeline, timing: TimingConfig) -> Self {
        Self {
            orchestrator,
            pipeline,
            scheduler: TransitionScheduler::new(),
            timing,
            phase: Phase::Presenting,
            camera_error: None,
            closed: false,
        }
    }

    /// Build a session from configuration and injected collaborators.
    pub fn from_config(
        config: &Config,
        device: Box<dyn CameraDevice>,
        reporter: Box<dyn Reporter>,
        navigator: Box<dyn Navigator>,
    ) -> Self {
        let orchestrator = Orchestrator::new(config.assets.booking_url.clone())
            .with_reporter(reporter)
            .with_navigator(navigator);
        let pipeline = CapturePipeline::new(device, config.capture_settings());
        Self::new(orchestrator, pipeline, config.timing.clone())
    }

    pub fn current(&self) -> Scene {
        self.orchestrator.current()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn pipeline(&self) -> &CapturePipeline {
        &self.pipeline
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            scene: self.orchestrator.current(),
            phase: self.phase,
            capture_state: self.pipeline.state(),
            camera_error: self.camera_error.clone(),
            has_artifact: self.orchestrator.artifact().is_some(),
            pending_ms: self.scheduler.remaining_ms(),
        }
    }

    /// Handle a user action.
    pub fn handle(&mut self, action: Action) -> Result<Vec<SessionEvent>, SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        let scene = self.current();
        let mut events = Vec::new();

        match action {
            Action::BookNow => {
                self.require_presenting(scene)?;
                self.orchestrator.open_booking()?;
                events.push(SessionEvent::BookingOpened);
            }
            Action::ReopenCamera => {
                if scene != Scene::Capture || self.pipeline.state() != CaptureState::Idle {
                    return Err(SessionError::ActionNotAvailable { action, scene });
                }
                self.open_camera(&mut events);
            }
            Action::Shutter => {
                if scene != Scene::Capture {
                    return Err(SessionError::ActionNotAvailable { action, scene });
                }
                self.require_presenting(scene)?;
                self.pipeline.capture()?;
                if let Some(still) = self.pipeline.preview() {
                    events.push(SessionEvent::CaptureTaken {
                        digest: still.digest().to_string(),
                    });
                }
                if self.pipeline.state() == CaptureState::Frozen {
                    events.push(SessionEvent::CaptureFrozen);
                }
                // The pipeline owns the flash length; hand-off needs it finished
                let hold = self
                    .pipeline
                    .settings()
                    .flash_ms
                    .saturating_add(self.timing.capture_hold_ms);
                self.scheduler.schedule(hold, SessionStep::BeginCaptureExit);
            }
            Action::Start | Action::TryNow | Action::Done | Action::Retry | Action::WatchTrailer => {
                let kind = action
                    .trigger()
                    .filter(|k| scene.next(*k).is_some())
                    .ok_or(SessionError::ActionNotAvailable { action, scene })?;
                self.require_presenting(scene)?;
                self.begin_exit(scene, self.exit_delay(scene), SessionStep::Commit(kind), &mut events);
            }
        }
        Ok(events)
    }

    /// Advance time. Runs the flash and any due transition.
    pub fn tick(&mut self, delta_ms: u32) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        if self.closed {
            return events;
        }
        if self.pipeline.tick(delta_ms) {
            events.push(SessionEvent::CaptureFrozen);
        }
        if let Some(step) = self.scheduler.tick(delta_ms) {
            self.apply(step, &mut events);
        }
        events
    }

    /// End the session: cancel pending transitions and release the camera.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.scheduler.cancel();
        self.pipeline.reset();
        self.closed = true;
        log::info!("Session ended in scene '{}'", self.current());
    }

    fn require_presenting(&self, scene: Scene) -> Result<(), SessionError> {
        if self.phase == Phase::Exiting || self.scheduler.is_pending() {
            log::warn!("Ignoring input while '{}' is leaving", scene);
            return Err(SessionError::TransitionPending { scene });
        }
        Ok(())
    }

    fn exit_delay(&self, scene: Scene) -> u32 {
        match scene {
            Scene::Landing => self.timing.landing_exit_ms,
            Scene::Teaser => self.timing.teaser_exit_ms,
            Scene::Capture => self.timing.capture_exit_ms,
            Scene::Matching => self.timing.matching_exit_ms,
            Scene::Booking => self.timing.booking_exit_ms,
            Scene::Trailer => 0,
        }
    }

    fn begin_exit(
        &mut self,
        scene: Scene,
        delay_ms: u32,
        step: SessionStep,
        events: &mut Vec<SessionEvent>,
    ) {
        self.phase = Phase::Exiting;
        self.scheduler.schedule(delay_ms, step);
        events.push(SessionEvent::ExitStarted { scene });
        log::debug!("Scene '{}' exiting over {}ms", scene, delay_ms);
    }

    fn apply(&mut self, step: SessionStep, events: &mut Vec<SessionEvent>) {
        match step {
            SessionStep::Commit(kind) => {
                let trigger = match kind {
                    TriggerKind::Start => Trigger::Start,
                    TriggerKind::TryNow => Trigger::TryNow,
                    TriggerKind::Done => Trigger::Done,
                    TriggerKind::Retry => Trigger::Retry,
                    TriggerKind::WatchTrailer => Trigger::WatchTrailer,
                    TriggerKind::Captured => {
                        debug_assert!(false, "captured trigger scheduled without an image");
                        log::error!("Captured trigger scheduled without an image");
                        self.phase = Phase::Presenting;
                        return;
                    }
                };
                self.commit(trigger, events);
            }
            SessionStep::BeginCaptureExit => {
                let scene = self.current();
                self.begin_exit(scene, self.timing.capture_exit_ms, SessionStep::CommitCapture, events);
            }
            SessionStep::CommitCapture => match self.pipeline.hand_off() {
                Ok(image) => {
                    self.orchestrator.report(
                        "capture_handoff",
                        &metadata([("digest", image.digest())]),
                    );
                    self.commit(Trigger::Captured(image), events);
                }
                Err(e) => {
                    debug_assert!(false, "capture hand-off failed: {}", e);
                    log::error!("Capture hand-off failed: {}", e);
                    self.phase = Phase::Presenting;
                    self.pipeline.reset();
                    self.open_camera(events);
                }
            },
        }
    }

    fn commit(&mut self, trigger: Trigger, events: &mut Vec<SessionEvent>) {
        let from = self.current();
        match self.orchestrator.advance(trigger) {
            Ok(to) => {
                self.leave(from);
                self.phase = Phase::Presenting;
                events.push(SessionEvent::SceneChanged { from, to });
                self.enter(to, events);
            }
            Err(e) => {
                debug_assert!(false, "scheduled transition rejected: {}", e);
                log::error!("Scheduled transition rejected: {}", e);
                self.phase = Phase::Presenting;
            }
        }
    }

    fn leave(&mut self, scene: Scene) {
        self.scheduler.cancel();
        if scene == Scene::Capture {
            self.pipeline.reset();
            self.camera_error = None;
        }
    }

    fn enter(&mut self, scene: Scene, events: &mut Vec<SessionEvent>) {
        if scene == Scene::Capture {
            self.pipeline.reset();
            self.open_camera(events);
        }
    }

    fn open_camera(&mut self, events: &mut Vec<SessionEvent>) {
        match self.pipeline.open() {
            Ok(()) => {
                self.camera_error = None;
                events.push(SessionEvent::CameraReady);
            }
            Err(CaptureError::Camera(e)) => {
                self.orchestrator.report(
                    "camera_failed",
                    &metadata([("reason", e.to_string().as_str())]),
                );
                self.camera_error = Some(e.clone());
                events.push(SessionEvent::CameraFailed(e));
            }
            Err(e) => {
                debug_assert!(false, "camera open refused: {}", e);
                log::error!("Camera open refused: {}", e);
            }
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}
