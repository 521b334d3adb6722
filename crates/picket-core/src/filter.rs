//! Path filtering rules.
//!
//! Two rules decide whether a path is interesting: names starting with
//! `.` or `_` are ignored outright, and when an extension allow-list is
//! configured, files outside it are dropped. These predicates are pure;
//! the walker and the dispatch loop both go through them so the watch
//! set and the delivered events can never disagree.

use std::ffi::OsStr;
use std::path::Path;

/// Returns true for names that are never watched: dotfiles and
/// underscore-prefixed files or directories.
pub fn should_ignore(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_')
}

/// Extension of `path` including the leading dot (`".js"`), or an
/// empty string when the path has none.
pub fn extension_of(path: &Path) -> String {
    match path.extension().and_then(OsStr::to_str) {
        Some(ext) => format!(".{}", ext),
        None => String::new(),
    }
}

/// Decides which files are kept, given an optional extension allow-list.
///
/// An empty allow-list keeps every file. Entries are normalized to
/// include the leading dot, so callers can pass `"js"` or `".js"`
/// interchangeably. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    extensions: Vec<String>,
}

impl PathFilter {
    /// Builds a filter from plain extension strings.
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| {
                let ext = ext.as_ref();
                if ext.starts_with('.') {
                    ext.to_string()
                } else {
                    format!(".{}", ext)
                }
            })
            .collect();
        Self { extensions }
    }

    /// True when `ext` passes the allow-list (`".js"`-shaped, or empty
    /// for files without an extension).
    pub fn keeps_extension(&self, ext: &str) -> bool {
        self.extensions.is_empty() || self.extensions.iter().any(|e| e == ext)
    }

    /// True when `path` names a file worth watching: not ignored by
    /// name, and passing the extension allow-list.
    pub fn is_valid_file(&self, path: &Path) -> bool {
        let name = path.file_name().and_then(OsStr::to_str).unwrap_or_default();
        !should_ignore(name) && self.keeps_extension(&extension_of(path))
    }

    /// The normalized allow-list. Empty means everything is kept.
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }
}
