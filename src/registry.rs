use alloc::string::String;

use hashbrown::HashMap;

use crate::error::{Error, Result};
use crate::target::{ExternalDependency, Target};

/// What a dependency name refers to.
#[derive(Debug, Clone, Copy)]
pub enum Entity<'a> {
    Target(&'a Target),
    External(&'a ExternalDependency),
}

/// Every target and external dependency known to a session, by name.
///
/// Targets and external dependencies share one namespace: a name may be
/// registered once, whatever its kind.
#[derive(Debug, Default)]
pub struct Registry {
    targets: HashMap<String, Target>,
    externals: HashMap<String, ExternalDependency>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_free(&self, name: &str) -> Result<()> {
        if self.targets.contains_key(name) || self.externals.contains_key(name) {
            return Err(Error::DuplicateName(name.into()));
        }
        Ok(())
    }

    pub fn register_target(&mut self, target: Target) -> Result<&mut Target> {
        self.ensure_free(target.name())?;
        let name = String::from(target.name());
        Ok(self.targets.entry(name).or_insert(target))
    }

    pub fn register_external(
        &mut self,
        dep: ExternalDependency,
    ) -> Result<&mut ExternalDependency> {
        self.ensure_free(dep.name())?;
        let name = String::from(dep.name());
        Ok(self.externals.entry(name).or_insert(dep))
    }

    pub fn resolve(&self, name: &str) -> Option<Entity<'_>> {
        if let Some(target) = self.targets.get(name) {
            Some(Entity::Target(target))
        } else {
            self.externals.get(name).map(Entity::External)
        }
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    pub fn target_mut(&mut self, name: &str) -> Option<&mut Target> {
        self.targets.get_mut(name)
    }

    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{ExternalDependencyType, TargetType};

    #[test]
    fn test_resolve() {
        let mut registry = Registry::new();
        registry
            .register_target(Target::new("app", TargetType::Executable))
            .unwrap();
        registry
            .register_external(ExternalDependency::new(
                "m",
                ExternalDependencyType::SystemLib,
                "",
            ))
            .unwrap();

        assert!(matches!(registry.resolve("app"), Some(Entity::Target(t)) if t.name() == "app"));
        assert!(matches!(registry.resolve("m"), Some(Entity::External(e)) if e.name() == "m"));
        assert!(registry.resolve("missing").is_none());
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let mut registry = Registry::new();
        registry
            .register_target(Target::new("core", TargetType::StaticLib))
            .unwrap();

        let err = registry
            .register_target(Target::new("core", TargetType::Executable))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName(ref n) if n == "core"));

        let err = registry
            .register_external(ExternalDependency::new(
                "core",
                ExternalDependencyType::SystemLib,
                "",
            ))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName(_)));

        // The first registration is left untouched.
        assert_eq!(
            registry.target("core").map(Target::target_type),
            Some(TargetType::StaticLib)
        );
    }
}
