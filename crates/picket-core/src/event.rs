//! Normalized file events.
//!
//! A [`FileEvent`] is our abstraction over raw backend notifications.
//! It captures the parts a consumer actually wants: where the change
//! happened, what the file is called, and what kind of change it was.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::filter::extension_of;

/// The kind of change a file event describes.
///
/// Exactly one kind is reported per event. Backends that describe a
/// change in more detail (data vs. metadata modification, rename
/// phases) are collapsed into this taxonomy during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    /// A file or directory was created.
    Created,
    /// A file's contents were written.
    Written,
    /// A file or directory was removed.
    Removed,
    /// A file or directory was renamed.
    Renamed,
    /// Permissions, timestamps or other metadata changed.
    MetadataChanged,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Written => "written",
            Self::Removed => "removed",
            Self::Renamed => "renamed",
            Self::MetadataChanged => "metadata",
        };
        write!(f, "{}", s)
    }
}

/// A single normalized file change.
///
/// Immutable once constructed. `name` and `extension` are derived from
/// `path` at construction time so consumers never re-parse the path.
/// The extension keeps its leading dot (`".js"`) and is empty for
/// files without one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEvent {
    /// Absolute path of the file or directory.
    pub path: PathBuf,
    /// Base name, e.g. `index.js`.
    pub name: String,
    /// File extension including the dot, e.g. `.js`, or empty.
    pub extension: String,
    /// The operation that triggered the event.
    pub op: Op,
}

impl FileEvent {
    /// Builds an event for `path`, deriving the name and extension.
    pub fn new(path: impl Into<PathBuf>, op: Op) -> Self {
        let path = path.into();
        let name = base_name(&path);
        let extension = extension_of(&path);
        Self {
            path,
            name,
            extension,
            op,
        }
    }
}

impl fmt::Display for FileEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.op, self.path.display())
    }
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
