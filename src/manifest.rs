//! Build description files.
//!
//! A description declares the toolchain, the external dependencies and the
//! targets of a project:
//!
//! ```text
//! [constants]
//! src = 'src'
//!
//! [toolchain]
//! compiler = 'cc'
//!
//! [external.m]
//! type = 'system'
//!
//! [target.engine]
//! type = 'static_library'
//! sources = [src / 'engine.c']
//! include_directories = ['include']
//!
//! [target.app]
//! type = 'executable'
//! output_dir = 'bin'
//! dependencies = ['engine', 'm']
//! sources = [src / 'main.c']
//! flags = ['-O2']
//! ```

mod parser;

use alloc::string::String;
use alloc::vec::Vec;

use thiserror::Error;
use tracing::debug;

pub use self::parser::{ManifestFile, ManifestValue, ParseError};
use crate::session::Session;
use crate::target::{ExternalDependencyType, TargetType};

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("unknown section [{0}]")]
    UnknownSection(String),

    #[error("unknown key '{key}' in [{section}]")]
    UnknownKey { section: String, key: String },

    #[error("'{key}' in [{section}] must be {expected}, found {found}")]
    InvalidValue {
        section: String,
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("[{section}] has no 'type'")]
    MissingType { section: String },

    #[error("unknown type '{value}' in [{section}]")]
    UnknownType { section: String, value: String },

    #[error(transparent)]
    Declaration(#[from] crate::Error),
}

type Result<T> = core::result::Result<T, ManifestError>;

const TOOLCHAIN_KEYS: &[&str] = &[
    "compiler",
    "archiver",
    "object_extension",
    "static_extension",
    "dynamic_extension",
];
const TARGET_KEYS: &[&str] = &[
    "type",
    "output_dir",
    "dependencies",
    "sources",
    "include_directories",
    "flags",
];
const EXTERNAL_KEYS: &[&str] = &["type", "path"];

/// Parses `content` and declares everything it describes in `session`.
pub fn load(session: &mut Session, content: &str) -> Result<()> {
    let manifest = ManifestFile::parse(content)?;
    apply(session, &manifest)
}

/// Declares the contents of an already parsed description in `session`.
pub fn apply(session: &mut Session, manifest: &ManifestFile) -> Result<()> {
    for name in manifest.section_names() {
        let section = Section { manifest, name };
        match name.split_once('.') {
            None if name == "constants" => {}
            None if name == "toolchain" => section.apply_toolchain(session)?,
            Some(("target", target)) => section.apply_target(session, target)?,
            Some(("external", external)) => section.apply_external(session, external)?,
            _ => return Err(ManifestError::UnknownSection(name.into())),
        }
    }
    Ok(())
}

struct Section<'a> {
    manifest: &'a ManifestFile,
    name: &'a str,
}

impl<'a> Section<'a> {
    fn check_keys(&self, allowed: &[&str]) -> Result<()> {
        let Some(entries) = self.manifest.section(self.name) else {
            return Ok(());
        };
        let mut keys = entries.keys().collect::<Vec<_>>();
        keys.sort_unstable();
        match keys.into_iter().find(|k| !allowed.contains(&k.as_str())) {
            Some(key) => Err(ManifestError::UnknownKey {
                section: self.name.into(),
                key: key.clone(),
            }),
            None => Ok(()),
        }
    }

    fn string(&self, key: &str) -> Result<Option<&'a str>> {
        match self.manifest.get(self.name, key) {
            None => Ok(None),
            Some(value) => value
                .as_string()
                .map(Some)
                .ok_or_else(|| ManifestError::InvalidValue {
                    section: self.name.into(),
                    key: key.into(),
                    expected: "a string",
                    found: value.type_name(),
                }),
        }
    }

    fn list(&self, key: &str) -> Result<Vec<String>> {
        match self.manifest.get(self.name, key) {
            None => Ok(Vec::new()),
            Some(value) => value
                .as_string_list()
                .ok_or_else(|| ManifestError::InvalidValue {
                    section: self.name.into(),
                    key: key.into(),
                    expected: "an array of strings",
                    found: value.type_name(),
                }),
        }
    }

    fn type_name(&self) -> Result<&'a str> {
        self.string("type")?
            .ok_or_else(|| ManifestError::MissingType {
                section: self.name.into(),
            })
    }

    fn unknown_type(&self, value: &str) -> ManifestError {
        ManifestError::UnknownType {
            section: self.name.into(),
            value: value.into(),
        }
    }

    fn apply_toolchain(&self, session: &mut Session) -> Result<()> {
        self.check_keys(TOOLCHAIN_KEYS)?;
        let toolchain = session.toolchain_mut();
        if let Some(compiler) = self.string("compiler")? {
            toolchain.compiler = compiler.into();
        }
        if let Some(archiver) = self.string("archiver")? {
            toolchain.archiver = archiver.into();
        }
        if let Some(ext) = self.string("object_extension")? {
            toolchain.object_extension = ext.into();
        }
        if let Some(ext) = self.string("static_extension")? {
            toolchain.static_extension = ext.into();
        }
        if let Some(ext) = self.string("dynamic_extension")? {
            toolchain.dynamic_extension = ext.into();
        }
        Ok(())
    }

    fn apply_target(&self, session: &mut Session, name: &str) -> Result<()> {
        self.check_keys(TARGET_KEYS)?;
        let target_type = match self.type_name()? {
            "executable" => TargetType::Executable,
            "static_library" => TargetType::StaticLib,
            "dynamic_library" | "shared_library" => TargetType::DynamicLib,
            other => return Err(self.unknown_type(other)),
        };

        let dependencies = self.list("dependencies")?;
        let sources = self.list("sources")?;
        let include_dirs = self.list("include_directories")?;
        let flags = self.list("flags")?;
        let output_dir = self.string("output_dir")?;

        debug!(name, ?target_type, "declaring target");
        let target = session.declare_target(name, target_type)?;
        target
            .add_dependencies(dependencies)
            .add_source_files(sources)
            .add_include_directories(include_dirs)
            .add_flags(flags);
        if let Some(dir) = output_dir {
            target.set_output_dir(dir);
        }
        Ok(())
    }

    fn apply_external(&self, session: &mut Session, name: &str) -> Result<()> {
        self.check_keys(EXTERNAL_KEYS)?;
        let dep_type = match self.type_name()? {
            "static_library" => ExternalDependencyType::StaticLib,
            "dynamic_library" | "shared_library" => ExternalDependencyType::DynamicLib,
            "system" => ExternalDependencyType::SystemLib,
            other => return Err(self.unknown_type(other)),
        };
        let path = self.string("path")?.unwrap_or_default();

        debug!(name, ?dep_type, "declaring external dependency");
        session.declare_external_dependency(name, dep_type, path)?;
        Ok(())
    }
}
