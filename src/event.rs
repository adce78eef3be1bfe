use crate::command::CommandLine;
use crate::path::Path;

/// Progress notifications emitted while building or cleaning.
///
/// `depth` is the position in the dependency walk, 0 for the target the
/// build was requested for, so a reporter can indent nested work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event<'a> {
    CheckingDependency { name: &'a str, depth: usize },
    Compiling { source: &'a Path, depth: usize },
    SourceUpToDate { source: &'a Path, depth: usize },
    Linking { target: &'a str, depth: usize },
    Completed { target: &'a str, depth: usize },
    UpToDate { target: &'a str, depth: usize },
    Cleaning { target: &'a str },
    Command { command: &'a CommandLine, depth: usize },
}
