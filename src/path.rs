use alloc::string::String;
use core::fmt;

/// A `/`-separated path as handed to the compiler.
///
/// Paths are kept as plain strings so that the synthesized command lines
/// contain exactly what the build description declared.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Path(String);

const SEP: &str = "/";

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Path({})", self.0)
    }
}

impl From<&str> for Path {
    fn from(path: &str) -> Self {
        Self::from(path)
    }
}

impl From<String> for Path {
    fn from(path: String) -> Self {
        Self::from(path)
    }
}

impl From<&String> for Path {
    fn from(path: &String) -> Self {
        Self::from(path)
    }
}

impl From<Path> for String {
    fn from(path: Path) -> Self {
        path.0
    }
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from(path: impl AsRef<str>) -> Self {
        Self(path.as_ref().replace('\\', SEP))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_absolute(&self) -> bool {
        self.0.starts_with(SEP)
    }

    /// Replaces the extension of the last path component.
    ///
    /// Only a `.` inside the file name counts, so `./src/a.c` becomes
    /// `./src/a.o` and `lib.d/util` becomes `lib.d/util.o`.
    pub fn with_extension(&self, ext: &str) -> Self {
        let path = &self.0;
        let search_start = path.rfind(SEP).map(|i| i + 1).unwrap_or(0);
        let stem_end = path[search_start..]
            .rfind('.')
            .filter(|&i| i > 0)
            .map(|i| search_start + i)
            .unwrap_or(path.len());

        let mut new_path = String::from(&path[..stem_end]);
        if !ext.is_empty() && !ext.starts_with('.') {
            new_path.push('.');
        }
        new_path.push_str(ext);
        Self(new_path)
    }

    pub fn join(&self, path: impl AsRef<str>) -> Self {
        if path.as_ref().starts_with(SEP) || self.0.is_empty() {
            return Self::from(path.as_ref());
        }

        let mut new_path = String::from(self.0.trim_end_matches(SEP));
        new_path.push_str(SEP);
        new_path.push_str(path.as_ref());
        Self(new_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_extension() {
        assert_eq!(Path::from("main.c").with_extension(".o").as_str(), "main.o");
        assert_eq!(Path::from("./src/a.c").with_extension(".o").as_str(), "./src/a.o");
        assert_eq!(Path::from("lib.d/util").with_extension("o").as_str(), "lib.d/util.o");
        assert_eq!(Path::from("src/.hidden").with_extension(".o").as_str(), "src/.hidden.o");
        assert_eq!(Path::from("a.tar.c").with_extension(".o").as_str(), "a.tar.o");
    }

    #[test]
    fn test_join() {
        assert_eq!(Path::from("bin").join("app").as_str(), "bin/app");
        assert_eq!(Path::from("bin/").join("app").as_str(), "bin/app");
        assert_eq!(Path::new().join("app").as_str(), "app");
        assert_eq!(Path::from("bin").join("/usr/lib").as_str(), "/usr/lib");
    }

    #[test]
    fn test_backslashes_are_normalized() {
        assert_eq!(Path::from("src\\main.c").as_str(), "src/main.c");
    }
}
