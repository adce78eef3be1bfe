use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use hashbrown::{HashMap, HashSet};
use tracing::{debug, trace};

use crate::command::{self, CommandLine, LinkInputs};
use crate::error::{Error, Result};
use crate::event::Event;
use crate::path::Path;
use crate::registry::{Entity, Registry};
use crate::runtime::{CommandOutput, Runtime, Timestamp};
use crate::stale;
use crate::target::{ExternalDependency, ExternalDependencyType, Target, TargetType};
use crate::toolchain::Toolchain;

/// A build graph together with the environment it is built in.
pub struct Session {
    runtime: Rc<dyn Runtime>,
    toolchain: Toolchain,
    registry: Registry,
}

/// Result of a successful [`Session::build`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildOutcome {
    /// Whether the requested target's artifact was (re)produced.
    pub rebuilt: bool,
    /// Every command that ran, in order.
    pub commands: Vec<CommandLine>,
}

impl Session {
    pub fn new(runtime: impl Runtime) -> Self {
        Self::with_toolchain(runtime, Toolchain::default())
    }

    pub fn with_toolchain(runtime: impl Runtime, toolchain: Toolchain) -> Self {
        Self {
            runtime: Rc::new(runtime),
            toolchain,
            registry: Registry::new(),
        }
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn toolchain_mut(&mut self) -> &mut Toolchain {
        &mut self.toolchain
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn declare_target(
        &mut self,
        name: impl Into<String>,
        target_type: TargetType,
    ) -> Result<&mut Target> {
        self.registry.register_target(Target::new(name, target_type))
    }

    pub fn declare_external_dependency(
        &mut self,
        name: impl Into<String>,
        dep_type: ExternalDependencyType,
        path: impl Into<Path>,
    ) -> Result<&mut ExternalDependency> {
        self.registry
            .register_external(ExternalDependency::new(name, dep_type, path))
    }

    pub fn target_mut(&mut self, name: &str) -> Result<&mut Target> {
        self.registry
            .target_mut(name)
            .ok_or_else(|| Error::UnknownTarget(name.into()))
    }

    fn target(&self, name: &str) -> Result<&Target> {
        self.registry
            .target(name)
            .ok_or_else(|| Error::UnknownTarget(name.into()))
    }

    /// Brings `name` and everything it depends on up to date.
    ///
    /// The reachable graph is checked first, so a description error never
    /// leaves half of the graph rebuilt.
    pub fn build(&self, name: &str, force: bool) -> Result<BuildOutcome> {
        let target = self.target(name)?;
        debug!(name, force, "build requested");

        Validator::new(self).check(target)?;

        let mut walk = Walk::new(self, force);
        let rebuilt = walk.visit(target, Timestamp::Missing, 0)?;
        Ok(BuildOutcome {
            rebuilt,
            commands: walk.commands,
        })
    }

    /// Removes the artifacts and objects of `name` and of every target it
    /// depends on. External dependencies are left alone.
    pub fn clean(&self, name: &str) -> Result<()> {
        let target = self.target(name)?;
        let mut cleaned = HashSet::new();
        self.clean_target(target, &mut cleaned)
    }

    fn clean_target<'a>(
        &'a self,
        target: &'a Target,
        cleaned: &mut HashSet<&'a str>,
    ) -> Result<()> {
        if !cleaned.insert(target.name()) {
            return Ok(());
        }

        self.runtime.report(&Event::Cleaning {
            target: target.name(),
        });
        let cmd = command::clean(&self.toolchain, target);
        self.execute(&cmd, 0)?;

        for dep_name in target.dependencies() {
            if let Some(Entity::Target(dep)) = self.registry.resolve(dep_name) {
                self.clean_target(dep, cleaned)?;
            }
        }
        Ok(())
    }

    /// Runs the built executable `name` with `args`.
    ///
    /// The program's exit status is returned, not treated as an error.
    pub fn run<I, S>(&self, name: &str, args: I) -> Result<CommandOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let target = self.target(name)?;
        if target.target_type() != TargetType::Executable {
            return Err(Error::NotExecutable(name.into()));
        }

        let cmd = command::run(&self.toolchain, target, args);
        debug!(command = %cmd, "running executable");
        Ok(self.runtime.run_command(&cmd)?)
    }

    fn execute(&self, cmd: &CommandLine, depth: usize) -> Result<()> {
        self.runtime.report(&Event::Command {
            command: cmd,
            depth,
        });
        debug!(command = %cmd, "executing");

        let output = self.runtime.run_command(cmd)?;
        if !output.success() {
            return Err(Error::CommandFailed {
                command: cmd.to_string(),
                status: output.returncode,
                stderr: output.stderr,
            });
        }
        Ok(())
    }
}

/// Checks the graph below a target before anything runs.
struct Validator<'s> {
    session: &'s Session,
    stack: Vec<&'s str>,
    checked: HashSet<&'s str>,
}

impl<'s> Validator<'s> {
    fn new(session: &'s Session) -> Self {
        Self {
            session,
            stack: Vec::new(),
            checked: HashSet::new(),
        }
    }

    fn check(&mut self, target: &'s Target) -> Result<()> {
        if self.checked.contains(target.name()) {
            return Ok(());
        }
        if let Some(pos) = self.stack.iter().position(|&n| n == target.name()) {
            let mut chain = self.stack[pos..]
                .iter()
                .map(|&n| String::from(n))
                .collect::<Vec<_>>();
            chain.push(target.name().into());
            return Err(Error::CircularDependency { chain });
        }

        let session = self.session;
        self.stack.push(target.name());
        for dep_name in target.dependencies() {
            match session.registry.resolve(dep_name) {
                Some(Entity::Target(dep)) => self.check(dep)?,
                Some(Entity::External(_)) => {}
                None => {
                    return Err(Error::UnknownDependency {
                        target: target.name().into(),
                        dependency: dep_name.clone(),
                    });
                }
            }
        }
        self.stack.pop();

        LinkInputs::resolve(&session.toolchain, &session.registry, target)?;

        for source in target.sources() {
            if !session.runtime.exists(source)? {
                return Err(Error::MissingSource {
                    target: target.name().into(),
                    file: source.clone(),
                });
            }
        }

        self.checked.insert(target.name());
        Ok(())
    }
}

/// One depth-first pass over the graph, compiling and linking what is stale.
struct Walk<'s> {
    session: &'s Session,
    force: bool,
    visited: HashMap<&'s str, bool>,
    commands: Vec<CommandLine>,
}

impl<'s> Walk<'s> {
    fn new(session: &'s Session, force: bool) -> Self {
        Self {
            session,
            force,
            visited: HashMap::new(),
            commands: Vec::new(),
        }
    }

    /// Returns whether `target` makes its consumer (with output `reference`)
    /// out of date.
    fn visit(&mut self, target: &'s Target, reference: Timestamp, depth: usize) -> Result<bool> {
        let session = self.session;
        let runtime = &session.runtime;
        let toolchain = &session.toolchain;

        let output = target.output_path(toolchain);
        let output_time = runtime.modified_time(&output)?;

        if let Some(&rebuilt) = self.visited.get(target.name()) {
            return Ok(stale::dependency_is_stale(rebuilt, output_time, reference));
        }

        let mut rebuild = stale::output_is_stale(output_time);
        trace!(name = target.name(), %output, ?output_time, "checking target");

        for dep_name in target.dependencies() {
            match session.registry.resolve(dep_name) {
                Some(Entity::Target(dep)) => {
                    runtime.report(&Event::CheckingDependency {
                        name: dep_name,
                        depth,
                    });
                    rebuild |= self.visit(dep, output_time, depth + 1)?;
                }
                Some(Entity::External(_)) => {}
                None => {
                    return Err(Error::UnknownDependency {
                        target: target.name().into(),
                        dependency: dep_name.clone(),
                    });
                }
            }
        }

        for source in target.sources() {
            let source_time = runtime.modified_time(source)?;
            if !source_time.exists() {
                return Err(Error::MissingSource {
                    target: target.name().into(),
                    file: source.clone(),
                });
            }

            let object = Target::object_path(source, toolchain);
            let object_time = runtime.modified_time(&object)?;

            if stale::source_is_stale(source_time, object_time, output_time, self.force) {
                debug!(%source, ?source_time, ?object_time, "source is stale");
                rebuild = true;
                runtime.report(&Event::Compiling { source, depth });
                self.execute(command::compile(toolchain, target, source), depth)?;
            } else {
                runtime.report(&Event::SourceUpToDate { source, depth });
            }
        }

        if rebuild || self.force {
            rebuild = true;
            runtime.report(&Event::Linking {
                target: target.name(),
                depth,
            });
            let cmd = command::link(toolchain, &session.registry, target)?;
            self.execute(cmd, depth)?;
            runtime.report(&Event::Completed {
                target: target.name(),
                depth,
            });
        } else {
            runtime.report(&Event::UpToDate {
                target: target.name(),
                depth,
            });
        }

        self.visited.insert(target.name(), rebuild);
        Ok(stale::dependency_is_stale(rebuild, output_time, reference))
    }

    fn execute(&mut self, cmd: CommandLine, depth: usize) -> Result<()> {
        self.session.execute(&cmd, depth)?;
        self.commands.push(cmd);
        Ok(())
    }
}
