//! Terminal formatting for build progress.

use std::time::Duration;

use owo_colors::{OwoColorize, Stream};
use picobuild::Event;

/// Renders a progress event as the line printed for it, or `None` if the
/// event is hidden (commands in quiet mode).
pub fn event_line(event: &Event<'_>, quiet: bool) -> Option<String> {
    let (depth, message) = match event {
        Event::CheckingDependency { name, depth } => {
            (*depth, format!("Checking dependency {name}..."))
        }
        Event::Compiling { source, depth } => (*depth, format!("Compiling source file {source}")),
        Event::SourceUpToDate { source, depth } => {
            (*depth, format!("Source file {source} is up to date"))
        }
        Event::Linking { target, depth } => (*depth, format!("Building target {target}...")),
        Event::Completed { depth, .. } => {
            let done = "Completed!".if_supports_color(Stream::Stdout, |s| s.green());
            (*depth, done.to_string())
        }
        Event::UpToDate { target, depth } => (*depth, format!("Target {target} is up to date")),
        Event::Cleaning { target } => (0, format!("Cleaning target {target}")),
        Event::Command { command, depth } => {
            if quiet {
                return None;
            }
            let line = command.to_string();
            let line = line.if_supports_color(Stream::Stdout, |s| s.bright_black());
            (*depth, line.to_string())
        }
    };
    Some(format!("{}{message}", "\t".repeat(depth)))
}

pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs == 0 {
        return "< 1s".into();
    }
    let (mins, secs) = (secs / 60, secs % 60);
    if mins > 0 {
        format!("{mins}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

pub fn print_error(err: &anyhow::Error) {
    let msg = format!("error: {err:#}");
    eprintln!("{}", msg.if_supports_color(Stream::Stderr, |s| s.red()));
}
