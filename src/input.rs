//! Line input handling: turns typed commands into session actions.

use crate::session::Action;

/// Result of parsing one input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    /// Forward to the session
    Act(Action),
    /// Print the current view
    Status,
    /// Print the command list
    Help,
    /// End the session
    Quit,
    /// Blank line
    None,
}

/// Commands and what they do, for `help`.
pub const HELP: &[(&str, &str)] = &[
    ("start", "leave the intro"),
    ("try", "leave the teaser and open the camera"),
    ("snap", "take the selfie"),
    ("camera", "ask for the camera again after a failure"),
    ("done", "accept the match"),
    ("retry", "discard the selfie and take another"),
    ("trailer", "watch the trailer"),
    ("book", "open the booking page"),
    ("status", "show the current scene"),
    ("quit", "end the session"),
];

/// Parse a line. Unknown words return `Err` with the offending word.
pub fn parse_line(line: &str) -> Result<InputCommand, String> {
    let word = line.trim().to_lowercase();
    let command = match word.as_str() {
        "" => InputCommand::None,
        "start" => InputCommand::Act(Action::Start),
        "try" | "try-now" | "trynow" => InputCommand::Act(Action::TryNow),
        "snap" | "shutter" | "capture" => InputCommand::Act(Action::Shutter),
        "camera" | "reopen" => InputCommand::Act(Action::ReopenCamera),
        "done" | "match" => InputCommand::Act(Action::Done),
        "retry" | "again" => InputCommand::Act(Action::Retry),
        "trailer" | "watch" => InputCommand::Act(Action::WatchTrailer),
        "book" | "book-now" => InputCommand::Act(Action::BookNow),
        "status" => InputCommand::Status,
        "help" | "?" => InputCommand::Help,
        "quit" | "exit" | "q" => InputCommand::Quit,
        _ => return Err(word),
    };
    Ok(command)
}
