//! Async event loop driving a [`Session`] from line input and a frame tick.
//!
//! The loop is the single event queue: input lines, timer ticks and Ctrl+C
//! are handled one at a time by `tokio::select!`, so the session is never
//! entered twice at once.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{Instant, MissedTickBehavior};

use crate::capture::CaptureState;
use crate::config::AssetConfig;
use crate::input::{parse_line, InputCommand, HELP};
use crate::scene::Scene;
use crate::session::{Phase, Session, SessionEvent};

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// `quit` was entered
    Quit,
    /// Input ended and nothing was left in flight
    InputClosed,
    /// Ctrl+C
    Interrupted,
}

#[derive(Debug, Clone)]
pub struct LoopOptions {
    /// Frame tick in milliseconds
    pub tick_ms: u32,
    /// Write the still here when Matching is entered
    pub save_capture: Option<PathBuf>,
    /// Images and video shown by each scene
    pub assets: AssetConfig,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            save_capture: None,
            assets: AssetConfig::default(),
        }
    }
}

/// True while a transition or the flash is in flight. Input waits until the
/// session settles, so typed commands queue behind the running animation.
fn is_busy(session: &Session) -> bool {
    let view = session.view();
    view.pending_ms.is_some()
        || view.phase == Phase::Exiting
        || view.capture_state == CaptureState::Flashing
}

/// Run until `quit`, end of input, or Ctrl+C. Shuts the session down on exit.
pub async fn run<R, W>(
    session: &mut Session,
    input: R,
    out: &mut W,
    options: &LoopOptions,
) -> std::io::Result<LoopExit>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut input_open = true;

    let mut frame_interval = tokio::time::interval(Duration::from_millis(options.tick_ms.max(1) as u64));
    frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_tick = Instant::now();

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    render_scene(out, session, &options.assets)?;

    let exit = loop {
        if !input_open && !is_busy(session) {
            break LoopExit::InputClosed;
        }

        tokio::select! {
            maybe_line = lines.next_line(), if input_open && !is_busy(session) => {
                match maybe_line? {
                    Some(line) => {
                        if handle_line(session, &line, out, options)? {
                            break LoopExit::Quit;
                        }
                    }
                    None => {
                        log::debug!("Input closed");
                        input_open = false;
                    }
                }
            }

            _ = frame_interval.tick() => {
                let now = Instant::now();
                let delta = now.duration_since(last_tick).as_millis().min(u32::MAX as u128) as u32;
                last_tick = now;
                for event in session.tick(delta) {
                    render_event(out, session, &event, options)?;
                }
            }

            _ = &mut ctrl_c => {
                writeln!(out, "\nReceived Ctrl+C, shutting down...")?;
                break LoopExit::Interrupted;
            }
        }
    };

    session.shutdown();
    out.flush()?;
    Ok(exit)
}

/// Handle one input line. Returns true when the user asked to quit.
fn handle_line<W: Write>(
    session: &mut Session,
    line: &str,
    out: &mut W,
    options: &LoopOptions,
) -> std::io::Result<bool> {
    match parse_line(line) {
        Ok(InputCommand::Act(action)) => match session.handle(action) {
            Ok(events) => {
                for event in events {
                    render_event(out, session, &event, options)?;
                }
            }
            Err(e) => writeln!(out, "  ! {}", e)?,
        },
        Ok(InputCommand::Status) => render_status(out, session)?,
        Ok(InputCommand::Help) => {
            for (word, what) in HELP {
                writeln!(out, "  {:<8} {}", word, what)?;
            }
        }
        Ok(InputCommand::Quit) => return Ok(true),
        Ok(InputCommand::None) => {}
        Err(word) => writeln!(out, "  ! unknown command '{}' (try 'help')", word)?,
    }
    out.flush()?;
    Ok(false)
}

fn render_event<W: Write>(
    out: &mut W,
    session: &Session,
    event: &SessionEvent,
    options: &LoopOptions,
) -> std::io::Result<()> {
    match event {
        SessionEvent::ExitStarted { scene } => writeln!(out, "  ~ {} fading out", scene)?,
        SessionEvent::SceneChanged { to, .. } => {
            if *to == Scene::Matching {
                save_capture(out, session, options)?;
            }
            render_scene(out, session, &options.assets)?;
        }
        SessionEvent::CameraReady => {
            let pipeline = session.pipeline();
            match pipeline.stream_resolution() {
                Some(r) => writeln!(
                    out,
                    "  camera live ({}, {}x{})",
                    pipeline.device_name(),
                    r.width,
                    r.height
                )?,
                None => writeln!(out, "  camera live ({})", pipeline.device_name())?,
            }
        }
        SessionEvent::CameraFailed(e) => {
            writeln!(out, "  ! {}", e)?;
            writeln!(out, "  type 'camera' to ask again")?;
        }
        SessionEvent::CaptureTaken { digest } => {
            writeln!(out, "  * flash * ({})", &digest[..12.min(digest.len())])?
        }
        SessionEvent::CaptureFrozen => writeln!(out, "  still frozen")?,
        SessionEvent::BookingOpened => {
            writeln!(out, "  opened {}", session.orchestrator().booking_url())?
        }
    }
    out.flush()
}

fn render_scene<W: Write>(out: &mut W, session: &Session, assets: &AssetConfig) -> std::io::Result<()> {
    let scene = session.current();
    let hint = match scene {
        Scene::Landing => "TAKE A SELFIE / MATCH THE SMILE   [start]",
        Scene::Teaser => "MATCH THE SMILE IN THIS PICTURE   [try]",
        Scene::Capture => "look into the camera   [snap]",
        Scene::Matching => "your smile vs. the picture   [done] [retry]",
        Scene::Booking => "book your tickets   [book] [trailer]",
        Scene::Trailer => "now playing the trailer   [book]",
    };
    writeln!(out, "== {} == {}", scene, hint)?;

    match scene {
        Scene::Landing => writeln!(out, "  background: {}", assets.background_image)?,
        Scene::Teaser => writeln!(out, "  picture: {}", assets.comparison_image)?,
        Scene::Capture => {}
        Scene::Matching => {
            writeln!(out, "  picture: {}", assets.comparison_image)?;
            if let Some(still) = session.orchestrator().artifact() {
                writeln!(
                    out,
                    "  selfie: {}x{} {} ({})",
                    still.width(),
                    still.height(),
                    still.format().mime_type(),
                    still.short_digest()
                )?;
            }
        }
        Scene::Booking => writeln!(out, "  poster: {}", assets.poster_image)?,
        Scene::Trailer => writeln!(out, "  video: {}", assets.trailer_url)?,
    }
    if scene.is_terminal() {
        writeln!(out, "  that's all; [quit] when done")?;
    }
    Ok(())
}

fn render_status<W: Write>(out: &mut W, session: &Session) -> std::io::Result<()> {
    let view = session.view();
    writeln!(
        out,
        "  scene={} phase={:?} camera={} capture={}",
        view.scene,
        view.phase,
        view.capture_state,
        if view.has_artifact { "held" } else { "none" }
    )?;
    if let Some(e) = view.camera_error {
        writeln!(out, "  camera error: {}", e)?;
    }
    Ok(())
}

fn save_capture<W: Write>(
    out: &mut W,
    session: &Session,
    options: &LoopOptions,
) -> std::io::Result<()> {
    let (Some(path), Some(image)) = (&options.save_capture, session.orchestrator().artifact()) else {
        return Ok(());
    };
    match image.save(path) {
        Ok(()) => writeln!(out, "  saved selfie to {}", path.display()),
        Err(e) => {
            log::warn!("Could not save capture to {}: {}", path.display(), e);
            writeln!(out, "  ! could not save selfie: {}", e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Resolution, SyntheticCamera};
    use crate::config::{Config, TimingConfig};
    use crate::services::{LogNavigator, NullReporter};

    fn session() -> Session {
        let mut config = Config::default();
        config.timing = TimingConfig::instant();
        config.camera.width = 8;
        config.camera.height = 8;
        Session::from_config(
            &config,
            Box::new(SyntheticCamera::new(Resolution { width: 16, height: 16 })),
            Box::new(NullReporter),
            Box::new(LogNavigator),
        )
    }

    fn options() -> LoopOptions {
        LoopOptions {
            tick_ms: 1,
            ..LoopOptions::default()
        }
    }

    #[tokio::test]
    async fn test_quit_ends_loop() {
        let mut s = session();
        let mut out = Vec::new();
        let exit = run(&mut s, &b"quit\n"[..], &mut out, &options()).await.unwrap();
        assert_eq!(exit, LoopExit::Quit);
        assert!(s.is_closed());
    }

    #[tokio::test]
    async fn test_unknown_command_is_reported() {
        let mut s = session();
        let mut out = Vec::new();
        run(&mut s, &b"dance\n"[..], &mut out, &options()).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("unknown command 'dance'"));
    }

    #[tokio::test]
    async fn test_script_waits_for_each_transition() {
        let mut s = session();
        let mut out = Vec::new();
        let exit = run(&mut s, &b"start\ntry\nsnap\n"[..], &mut out, &options())
            .await
            .unwrap();
        assert_eq!(exit, LoopExit::InputClosed);
        assert_eq!(s.current(), Scene::Matching);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("== matching =="));
        assert!(text.contains("picture: /images/image-to-match.jpg"));
        assert!(text.contains("selfie: 8x8 image/png"));
        assert!(text.contains("camera live (synthetic, 16x16)"));
    }
}
