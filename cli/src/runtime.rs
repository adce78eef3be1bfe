use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;
use std::time::UNIX_EPOCH;

use picobuild::path::Path as BuildPath;
use picobuild::runtime::{self, CommandOutput, Timestamp};
use picobuild::{CommandLine, Event};

use crate::output;

/// Runs a build against the real filesystem, relative to `root`.
pub struct Host {
    root: PathBuf,
    quiet: bool,
}

impl Host {
    pub fn new(root: impl Into<PathBuf>, quiet: bool) -> Self {
        Self {
            root: root.into(),
            quiet,
        }
    }

    fn resolve(&self, path: &BuildPath) -> PathBuf {
        self.root.join(path.as_str())
    }
}

impl runtime::Runtime for Host {
    fn exists(&self, path: &BuildPath) -> runtime::Result<bool> {
        Ok(self.resolve(path).exists())
    }

    fn modified_time(&self, path: &BuildPath) -> runtime::Result<Timestamp> {
        let metadata = match fs::metadata(self.resolve(path)) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Timestamp::Missing),
            Err(e) => return Err(e.into()),
        };
        let nanos = metadata.modified()?.duration_since(UNIX_EPOCH)?.as_nanos();
        Ok(Timestamp::Modified(nanos))
    }

    fn run_command(&self, cmd: &CommandLine) -> runtime::Result<CommandOutput> {
        // stdout and stderr are inherited so compiler diagnostics reach the
        // terminal as they happen.
        let status = Command::new(cmd.program())
            .args(cmd.arguments())
            .current_dir(&self.root)
            .status()?;

        Ok(CommandOutput {
            returncode: status.code().unwrap_or(-1) as i64,
            ..Default::default()
        })
    }

    fn report(&self, event: &Event<'_>) {
        if let Some(line) = output::event_line(event, self.quiet) {
            println!("{line}");
        }
    }
}
