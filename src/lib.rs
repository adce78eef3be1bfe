//! An incremental build engine for C projects.
//!
//! A [`Session`] holds a graph of [targets](Target) and
//! [external dependencies](ExternalDependency). Building a target compares
//! file modification times to decide which sources need recompiling and which
//! artifacts need relinking, then runs only those commands. Everything that
//! touches the outside world goes through the [`Runtime`] trait.
//!
//! ```ignore
//! let mut session = Session::new(runtime);
//! session
//!     .declare_target("engine", TargetType::StaticLib)?
//!     .add_source_files(["engine/world.c", "engine/render.c"])
//!     .add_include_directories(["engine/include"]);
//! session
//!     .declare_target("game", TargetType::Executable)?
//!     .add_source_files(["main.c"])
//!     .add_dependencies(["engine"]);
//! session.build("game", false)?;
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod command;
mod error;
pub mod event;
#[cfg(test)]
mod fake;
pub mod manifest;
pub mod path;
pub mod registry;
pub mod runtime;
mod session;
pub mod stale;
pub mod target;
pub mod toolchain;

pub use crate::command::CommandLine;
pub use crate::error::{Error, Result};
pub use crate::event::Event;
pub use crate::path::Path;
pub use crate::runtime::{CommandOutput, Runtime, Timestamp};
pub use crate::session::{BuildOutcome, Session};
pub use crate::target::{ExternalDependency, ExternalDependencyType, Target, TargetType};
pub use crate::toolchain::Toolchain;
