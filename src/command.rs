use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::error::{Error, Result};
use crate::path::Path;
use crate::registry::{Entity, Registry};
use crate::target::{ExternalDependencyType, Target, TargetType};
use crate::toolchain::Toolchain;

/// A program invocation: the program followed by its arguments.
///
/// Only built through [`CommandLine::new`], so the program is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine(Vec<String>);

impl CommandLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self(alloc::vec![program.into()])
    }

    pub fn arg(&mut self, arg: impl Into<String>) -> &mut Self {
        self.0.push(arg.into());
        self
    }

    pub fn args<I, S>(&mut self, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.0[0]
    }

    /// Arguments after the program.
    pub fn arguments(&self) -> &[String] {
        &self.0[1..]
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

/// What a target's dependencies contribute to its archive or link step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LinkInputs {
    /// Object files and archives, own objects first.
    pub objects: Vec<Path>,
    /// Library flags placed after the output.
    pub links: Vec<String>,
}

impl LinkInputs {
    /// Resolves `target`'s dependencies, in declaration order, into link inputs.
    pub fn resolve(toolchain: &Toolchain, registry: &Registry, target: &Target) -> Result<Self> {
        let mut inputs = LinkInputs {
            objects: target.objects(toolchain),
            links: Vec::new(),
        };

        for dep_name in target.dependencies() {
            match registry.resolve(dep_name) {
                Some(Entity::Target(dep)) => match dep.target_type() {
                    TargetType::StaticLib => inputs.objects.push(dep.output_path(toolchain)),
                    kind @ (TargetType::Executable | TargetType::DynamicLib) => {
                        return Err(Error::InvalidDependency {
                            target: target.name().into(),
                            dependency: dep_name.clone(),
                            kind,
                        });
                    }
                },
                Some(Entity::External(dep)) => match dep.dep_type() {
                    ExternalDependencyType::StaticLib => {
                        inputs.objects.push(dep.archive_path(toolchain))
                    }
                    ExternalDependencyType::SystemLib => {
                        inputs.links.push(format!("-l{}", dep.name()))
                    }
                    ExternalDependencyType::DynamicLib => {
                        if !dep.path().is_empty() {
                            inputs.links.push(format!("-L{}", dep.path()));
                        }
                        inputs.links.push(format!("-l{}", dep.name()));
                    }
                },
                None => {
                    return Err(Error::UnknownDependency {
                        target: target.name().into(),
                        dependency: dep_name.clone(),
                    });
                }
            }
        }

        Ok(inputs)
    }
}

/// `<cc> [-fPIC] -c <source> <flags...> -I<dir>... -o <object>`
pub fn compile(toolchain: &Toolchain, target: &Target, source: &Path) -> CommandLine {
    let mut cmd = CommandLine::new(&toolchain.compiler);
    if target.target_type() == TargetType::DynamicLib {
        cmd.arg("-fPIC");
    }
    cmd.arg("-c")
        .arg(source.as_str())
        .args(target.flags().iter().cloned())
        .args(
            target
                .include_directories()
                .iter()
                .map(|dir| format!("-I{dir}")),
        )
        .arg("-o")
        .arg(Target::object_path(source, toolchain));
    cmd
}

/// The archive or link command producing `target`'s output.
pub fn link(toolchain: &Toolchain, registry: &Registry, target: &Target) -> Result<CommandLine> {
    let LinkInputs { objects, links } = LinkInputs::resolve(toolchain, registry, target)?;
    let output = target.output_path(toolchain);

    let cmd = match target.target_type() {
        TargetType::Executable => {
            let mut cmd = CommandLine::new(&toolchain.compiler);
            cmd.args(target.flags().iter().cloned())
                .args(objects)
                .arg("-o")
                .arg(output)
                .args(links);
            cmd
        }
        TargetType::StaticLib => {
            let mut cmd = CommandLine::new(&toolchain.archiver);
            cmd.arg("rcs").arg(output).args(objects);
            cmd
        }
        TargetType::DynamicLib => {
            let mut cmd = CommandLine::new(&toolchain.compiler);
            cmd.args(target.flags().iter().cloned())
                .args(objects)
                .arg("-shared")
                .arg("-fPIC")
                .arg("-o")
                .arg(output)
                .args(links);
            cmd
        }
    };

    Ok(cmd)
}

/// `rm -f <output> <objects...>`
pub fn clean(toolchain: &Toolchain, target: &Target) -> CommandLine {
    let mut cmd = CommandLine::new("rm");
    cmd.arg("-f")
        .arg(target.output_path(toolchain))
        .args(target.objects(toolchain));
    cmd
}

/// Invocation of a built executable with `args`.
pub fn run<I, S>(toolchain: &Toolchain, target: &Target, args: I) -> CommandLine
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let output = target.output_path(toolchain);
    let program = if output.is_absolute() || output.as_str().contains('/') {
        String::from(output)
    } else {
        format!("./{output}")
    };
    let mut cmd = CommandLine::new(program);
    cmd.args(args);
    cmd
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::ExternalDependency;

    fn strs(cmd: &CommandLine) -> Vec<&str> {
        cmd.as_slice().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_command_line_starts_with_program() {
        let cmd = CommandLine::new("rm");
        assert_eq!(cmd.program(), "rm");
        assert!(cmd.arguments().is_empty());

        let mut cmd = CommandLine::new("ar");
        cmd.arg("rcs").args(["libx.a", "x.o"]);
        assert_eq!(cmd.program(), "ar");
        assert_eq!(cmd.arguments(), ["rcs", "libx.a", "x.o"]);
        assert_eq!(cmd.to_string(), "ar rcs libx.a x.o");
    }

    #[test]
    fn test_compile_command() {
        let toolchain = Toolchain::default();
        let mut t = Target::new("app", TargetType::Executable);
        t.add_flags(["-Wall", "-O2"])
            .add_include_directories(["include", "vendor/inc"]);

        let cmd = compile(&toolchain, &t, &Path::from("src/main.c"));
        assert_eq!(
            strs(&cmd),
            [
                "gcc", "-c", "src/main.c", "-Wall", "-O2", "-Iinclude", "-Ivendor/inc", "-o",
                "src/main.o"
            ]
        );
    }

    #[test]
    fn test_compile_command_dynamic_lib_is_pic() {
        let toolchain = Toolchain::default();
        let t = Target::new("plugin", TargetType::DynamicLib);

        let cmd = compile(&toolchain, &t, &Path::from("plugin.c"));
        assert_eq!(strs(&cmd), ["gcc", "-fPIC", "-c", "plugin.c", "-o", "plugin.o"]);
    }

    #[test]
    fn test_link_executable() {
        let toolchain = Toolchain::default();
        let mut registry = Registry::new();
        registry
            .register_target(Target::new("engine", TargetType::StaticLib))
            .unwrap()
            .set_output_dir("lib");
        registry
            .register_external(ExternalDependency::new(
                "z",
                ExternalDependencyType::StaticLib,
                "vendor",
            ))
            .unwrap();
        registry
            .register_external(ExternalDependency::new(
                "m",
                ExternalDependencyType::SystemLib,
                "",
            ))
            .unwrap();
        let app = registry
            .register_target(Target::new("app", TargetType::Executable))
            .unwrap();
        app.add_flags(["-g"])
            .add_source_files(["main.c", "cli.c"])
            .add_dependencies(["m", "engine", "z"]);
        let app = registry.target("app").unwrap();

        let cmd = link(&toolchain, &registry, app).unwrap();
        assert_eq!(
            strs(&cmd),
            [
                "gcc", "-g", "main.o", "cli.o", "lib/engine.a", "vendor/z.a", "-o", "app", "-lm"
            ]
        );
    }

    #[test]
    fn test_archive_ignores_flags_and_links() {
        let toolchain = Toolchain::default();
        let mut registry = Registry::new();
        registry
            .register_external(ExternalDependency::new(
                "m",
                ExternalDependencyType::SystemLib,
                "",
            ))
            .unwrap();
        registry
            .register_target(Target::new("util", TargetType::StaticLib))
            .unwrap()
            .add_flags(["-O2"])
            .add_source_files(["a.c", "b.c"])
            .add_dependencies(["m"]);

        let cmd = link(&toolchain, &registry, registry.target("util").unwrap()).unwrap();
        assert_eq!(strs(&cmd), ["ar", "rcs", "util.a", "a.o", "b.o"]);
    }

    #[test]
    fn test_link_dynamic_lib() {
        let toolchain = Toolchain::default();
        let mut registry = Registry::new();
        registry
            .register_target(Target::new("plugin", TargetType::DynamicLib))
            .unwrap()
            .add_flags(["-O2"])
            .add_source_files(["a.c", "b.c"]);

        let cmd = link(&toolchain, &registry, registry.target("plugin").unwrap()).unwrap();
        assert_eq!(
            strs(&cmd),
            ["gcc", "-O2", "a.o", "b.o", "-shared", "-fPIC", "-o", "plugin.so"]
        );
    }

    #[test]
    fn test_external_dynamic_lib_adds_search_path() {
        let toolchain = Toolchain::default();
        let mut registry = Registry::new();
        registry
            .register_external(ExternalDependency::new(
                "ssl",
                ExternalDependencyType::DynamicLib,
                "/opt/ssl/lib",
            ))
            .unwrap();
        registry
            .register_external(ExternalDependency::new(
                "dl",
                ExternalDependencyType::DynamicLib,
                "",
            ))
            .unwrap();
        registry
            .register_target(Target::new("app", TargetType::Executable))
            .unwrap()
            .add_source_files(["main.c"])
            .add_dependencies(["ssl", "dl"]);

        let cmd = link(&toolchain, &registry, registry.target("app").unwrap()).unwrap();
        assert_eq!(
            strs(&cmd),
            ["gcc", "main.o", "-o", "app", "-L/opt/ssl/lib", "-lssl", "-ldl"]
        );
    }

    #[test]
    fn test_invalid_link_dependencies() {
        let toolchain = Toolchain::default();
        let mut registry = Registry::new();
        registry
            .register_target(Target::new("tool", TargetType::Executable))
            .unwrap();
        registry
            .register_target(Target::new("plugin", TargetType::DynamicLib))
            .unwrap();
        registry
            .register_target(Target::new("a", TargetType::Executable))
            .unwrap()
            .add_dependencies(["tool"]);
        registry
            .register_target(Target::new("b", TargetType::Executable))
            .unwrap()
            .add_dependencies(["plugin"]);
        registry
            .register_target(Target::new("c", TargetType::Executable))
            .unwrap()
            .add_dependencies(["nope"]);

        let err = link(&toolchain, &registry, registry.target("a").unwrap()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidDependency { kind: TargetType::Executable, .. }
        ));
        let err = link(&toolchain, &registry, registry.target("b").unwrap()).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidDependency { kind: TargetType::DynamicLib, .. }
        ));
        let err = link(&toolchain, &registry, registry.target("c").unwrap()).unwrap_err();
        assert!(matches!(err, Error::UnknownDependency { ref dependency, .. } if dependency == "nope"));
    }

    #[test]
    fn test_clean_and_run_commands() {
        let toolchain = Toolchain::default();
        let mut app = Target::new("app", TargetType::Executable);
        app.add_source_files(["main.c", "src/io.c"]);

        assert_eq!(
            strs(&clean(&toolchain, &app)),
            ["rm", "-f", "app", "main.o", "src/io.o"]
        );
        assert_eq!(strs(&run(&toolchain, &app, ["--help"])), ["./app", "--help"]);

        app.set_output_dir("bin");
        assert_eq!(strs(&run(&toolchain, &app, ["x"])), ["bin/app", "x"]);
    }
}
