use alloc::string::String;

pub use anyhow::Result;

use crate::command::CommandLine;
use crate::event::Event;
use crate::path::Path;

/// Modification time of a file, as seen by the staleness checks.
///
/// `Missing` orders below every real modification time, so a file that does
/// not exist is older than anything that does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Timestamp {
    Missing,
    /// Nanoseconds since an arbitrary, runtime-defined epoch.
    Modified(u128),
}

impl Timestamp {
    pub fn exists(self) -> bool {
        matches!(self, Timestamp::Modified(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    pub stderr: String,
    pub returncode: i64,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.returncode == 0
    }
}

/// The environment the build engine runs in.
///
/// The engine never touches the filesystem or spawns processes itself; every
/// such interaction goes through this trait.
pub trait Runtime: 'static {
    // fs
    fn exists(&self, path: &Path) -> Result<bool>;
    fn modified_time(&self, path: &Path) -> Result<Timestamp>;

    // process
    fn run_command(&self, cmd: &CommandLine) -> Result<CommandOutput>;

    // progress
    fn report(&self, _event: &Event<'_>) {}
}
