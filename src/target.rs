use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::path::Path;
use crate::toolchain::Toolchain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetType {
    Executable,
    StaticLib,
    DynamicLib,
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TargetType::Executable => "executable",
            TargetType::StaticLib => "static library",
            TargetType::DynamicLib => "dynamic library",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExternalDependencyType {
    StaticLib,
    DynamicLib,
    SystemLib,
}

/// A buildable unit: an executable or a library compiled from C sources.
#[derive(Debug, Clone, PartialEq)]
pub struct Target {
    name: String,
    target_type: TargetType,
    output_dir: Path,
    deps: Vec<String>,
    sources: Vec<Path>,
    flags: Vec<String>,
    include_dirs: Vec<Path>,
}

impl Target {
    pub fn new(name: impl Into<String>, target_type: TargetType) -> Self {
        Self {
            name: name.into(),
            target_type,
            output_dir: Path::new(),
            deps: Vec::new(),
            sources: Vec::new(),
            flags: Vec::new(),
            include_dirs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target_type(&self) -> TargetType {
        self.target_type
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn dependencies(&self) -> &[String] {
        &self.deps
    }

    pub fn sources(&self) -> &[Path] {
        &self.sources
    }

    pub fn flags(&self) -> &[String] {
        &self.flags
    }

    pub fn include_directories(&self) -> &[Path] {
        &self.include_dirs
    }

    pub fn add_dependencies<I, S>(&mut self, deps: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn add_source_files<I, P>(&mut self, sources: I) -> &mut Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Path>,
    {
        self.sources.extend(sources.into_iter().map(Into::into));
        self
    }

    pub fn add_include_directories<I, P>(&mut self, dirs: I) -> &mut Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Path>,
    {
        self.include_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    pub fn add_flags<I, S>(&mut self, flags: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.flags.extend(flags.into_iter().map(Into::into));
        self
    }

    pub fn set_output_dir(&mut self, dir: impl Into<Path>) -> &mut Self {
        self.output_dir = dir.into();
        self
    }

    /// Path of the artifact this target produces.
    pub fn output_path(&self, toolchain: &Toolchain) -> Path {
        let file = format!("{}{}", self.name, toolchain.output_extension(self.target_type));
        self.output_dir.join(file)
    }

    pub fn object_path(source: &Path, toolchain: &Toolchain) -> Path {
        source.with_extension(&toolchain.object_extension)
    }

    /// Object files of the target's own sources, in declaration order.
    pub fn objects(&self, toolchain: &Toolchain) -> Vec<Path> {
        self.sources
            .iter()
            .map(|s| Self::object_path(s, toolchain))
            .collect()
    }
}

/// A pre-built library the graph links against but never builds.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalDependency {
    name: String,
    dep_type: ExternalDependencyType,
    path: Path,
}

impl ExternalDependency {
    pub fn new(
        name: impl Into<String>,
        dep_type: ExternalDependencyType,
        path: impl Into<Path>,
    ) -> Self {
        Self {
            name: name.into(),
            dep_type,
            path: path.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dep_type(&self) -> ExternalDependencyType {
        self.dep_type
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_path(&mut self, path: impl Into<Path>) -> &mut Self {
        self.path = path.into();
        self
    }

    /// Location of the archive for a static external library.
    pub fn archive_path(&self, toolchain: &Toolchain) -> Path {
        self.path
            .join(format!("{}{}", self.name, toolchain.static_extension))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_path() {
        let toolchain = Toolchain::default();

        let mut app = Target::new("app", TargetType::Executable);
        assert_eq!(app.output_path(&toolchain).as_str(), "app");
        app.set_output_dir("bin");
        assert_eq!(app.output_path(&toolchain).as_str(), "bin/app");

        let lib = Target::new("engine", TargetType::StaticLib);
        assert_eq!(lib.output_path(&toolchain).as_str(), "engine.a");

        let mut dylib = Target::new("plugin", TargetType::DynamicLib);
        dylib.set_output_dir("out/");
        assert_eq!(dylib.output_path(&toolchain).as_str(), "out/plugin.so");
    }

    #[test]
    fn test_appenders_preserve_order() {
        let toolchain = Toolchain::default();
        let mut t = Target::new("app", TargetType::Executable);
        t.add_source_files(["main.c"])
            .add_source_files(["src/util.c", "src/io.c"])
            .add_dependencies(["b", "a"])
            .add_dependencies(["c"]);

        assert_eq!(t.dependencies(), ["b", "a", "c"]);
        let objects = t.objects(&toolchain);
        let objects = objects.iter().map(Path::as_str).collect::<Vec<_>>();
        assert_eq!(objects, ["main.o", "src/util.o", "src/io.o"]);
    }

    #[test]
    fn test_external_archive_path() {
        let toolchain = Toolchain::default();
        let ext = ExternalDependency::new("z", ExternalDependencyType::StaticLib, "vendor/lib");
        assert_eq!(ext.archive_path(&toolchain).as_str(), "vendor/lib/z.a");
    }
}
