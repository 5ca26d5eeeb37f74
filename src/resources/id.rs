//! Resource identities and filename derivation

use crate::address::{escape_component, Node};
use std::fmt;
use std::path::{Path, PathBuf};

/// Logical handle on one piece of pipeline data
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId {
    pub name: String,
    pub node: Node,
}

impl ResourceId {
    pub fn new(name: impl Into<String>, node: Node) -> Self {
        Self {
            name: name.into(),
            node,
        }
    }

    /// Stable string key used by durable metadata stores
    ///
    /// The name is escaped, so the `@` separator cannot be forged by a name.
    pub fn key(&self) -> String {
        format!("{}@/{}", escape_component(&self.name), self.node.key())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.name, self.node)
    }
}

/// Derives filenames for (name, node) pairs under a directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenameCreator {
    file_dir: PathBuf,
    file_suffix: String,
}

impl FilenameCreator {
    pub fn new(file_dir: impl Into<PathBuf>, file_suffix: impl Into<String>) -> Self {
        Self {
            file_dir: file_dir.into(),
            file_suffix: file_suffix.into(),
        }
    }

    pub fn file_dir(&self) -> &Path {
        &self.file_dir
    }

    /// `<file_dir>/<node subdir>/<name><suffix>`; `name` must be relative
    pub fn filename(&self, name: &str, node: &Node) -> PathBuf {
        debug_assert!(
            !Path::new(name).is_absolute(),
            "resource name {name:?} is absolute"
        );
        self.file_dir
            .join(node.subdir())
            .join(format!("{}{}", name, self.file_suffix))
    }
}

impl fmt::Display for FilenameCreator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "FilenameCreator({}, {:?})",
            self.file_dir.display(),
            self.file_suffix
        )
    }
}
