use alloc::string::String;

use crate::target::TargetType;

/// The programs and file naming conventions used for every target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub compiler: String,
    pub archiver: String,
    pub object_extension: String,
    pub static_extension: String,
    pub dynamic_extension: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            compiler: "gcc".into(),
            archiver: "ar".into(),
            object_extension: ".o".into(),
            static_extension: ".a".into(),
            dynamic_extension: ".so".into(),
        }
    }
}

impl Toolchain {
    /// Extension of the artifact produced for a target of type `ty`.
    pub fn output_extension(&self, ty: TargetType) -> &str {
        match ty {
            TargetType::Executable => "",
            TargetType::StaticLib => &self.static_extension,
            TargetType::DynamicLib => &self.dynamic_extension,
        }
    }
}
