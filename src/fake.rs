//! In-memory runtime for unit tests: a virtual filesystem on a logical clock
//! and a command executor that "produces" the outputs named on its command
//! line.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::command::CommandLine;
use crate::event::Event;
use crate::path::Path;
use crate::runtime::{CommandOutput, Result, Runtime, Timestamp};

#[derive(Default)]
struct State {
    clock: u128,
    files: HashMap<String, u128>,
    commands: Vec<CommandLine>,
    events: Vec<String>,
    fail_on: Option<String>,
}

#[derive(Clone, Default)]
pub struct FakeRuntime(Rc<RefCell<State>>);

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates `path` or bumps its modification time past every other file.
    pub fn touch(&self, path: &str) {
        let mut state = self.0.borrow_mut();
        state.clock += 1;
        let now = state.clock;
        state.files.insert(path.into(), now);
    }

    pub fn remove(&self, path: &str) {
        self.0.borrow_mut().files.remove(path);
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.0.borrow().files.contains_key(path)
    }

    /// Makes every command mentioning `arg` exit with status 1.
    pub fn fail_on(&self, arg: &str) {
        self.0.borrow_mut().fail_on = Some(arg.into());
    }

    pub fn commands(&self) -> Vec<CommandLine> {
        self.0.borrow().commands.clone()
    }

    pub fn clear_commands(&self) {
        self.0.borrow_mut().commands.clear();
    }

    pub fn clear_events(&self) {
        self.0.borrow_mut().events.clear();
    }

    pub fn events_matching(&self, f: impl Fn(&str) -> bool) -> Vec<String> {
        self.0
            .borrow()
            .events
            .iter()
            .filter(|e| f(e.as_str()))
            .cloned()
            .collect()
    }
}

impl Runtime for FakeRuntime {
    fn exists(&self, path: &Path) -> Result<bool> {
        Ok(self.file_exists(path.as_str()))
    }

    fn modified_time(&self, path: &Path) -> Result<Timestamp> {
        Ok(match self.0.borrow().files.get(path.as_str()) {
            Some(&t) => Timestamp::Modified(t),
            None => Timestamp::Missing,
        })
    }

    fn run_command(&self, cmd: &CommandLine) -> Result<CommandOutput> {
        self.0.borrow_mut().commands.push(cmd.clone());

        let fail_on = self.0.borrow().fail_on.clone();
        if let Some(arg) = fail_on {
            if cmd.arguments().iter().any(|a| *a == arg) {
                return Ok(CommandOutput {
                    stderr: format!("error: {arg}"),
                    returncode: 1,
                    ..Default::default()
                });
            }
        }

        let args = cmd.arguments();
        match cmd.program() {
            "rm" => {
                for path in args.iter().filter(|a| !a.starts_with('-')) {
                    self.remove(path);
                }
            }
            "ar" => self.touch(&args[1]),
            "gcc" => {
                if let Some(pos) = args.iter().position(|a| a == "-o") {
                    self.touch(&args[pos + 1]);
                }
            }
            _ => {}
        }

        Ok(CommandOutput::default())
    }

    fn report(&self, event: &Event<'_>) {
        let line = match event {
            Event::CheckingDependency { name, .. } => format!("checking {name}"),
            Event::Compiling { source, .. } => format!("compiling {source}"),
            Event::SourceUpToDate { source, .. } => format!("current {source}"),
            Event::Linking { target, .. } => format!("linking {target}"),
            Event::Completed { target, .. } => format!("completed {target}"),
            Event::UpToDate { target, .. } => format!("up-to-date {target}"),
            Event::Cleaning { target } => format!("cleaning {target}"),
            Event::Command { command, .. } => format!("$ {command}"),
        };
        self.0.borrow_mut().events.push(line);
    }
}
