use alloc::string::String;
use alloc::vec::Vec;

use thiserror::Error;

use crate::path::Path;
use crate::target::TargetType;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Every way a build, clean or run can fail.
///
/// All of them are fatal: the operation stops at the first one.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown target: {0}")]
    UnknownTarget(String),

    #[error("unknown dependency '{dependency}' of target '{target}'")]
    UnknownDependency { target: String, dependency: String },

    #[error("could not find source file {file} of target '{target}'")]
    MissingSource { target: String, file: Path },

    #[error("target '{target}' can't link against {kind} '{dependency}'")]
    InvalidDependency {
        target: String,
        dependency: String,
        kind: TargetType,
    },

    #[error("circular dependency: {}", .chain.join(" -> "))]
    CircularDependency { chain: Vec<String> },

    #[error("name '{0}' is already declared")]
    DuplicateName(String),

    #[error("target '{0}' is not an executable")]
    NotExecutable(String),

    #[error("command failed with exit code {status}: {command}")]
    CommandFailed {
        command: String,
        status: i64,
        stderr: String,
    },

    #[error("{0}")]
    Runtime(anyhow::Error),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Runtime(err)
    }
}
