//! Initial tree discovery.
//!
//! Walks a directory tree and decides what belongs in the watch set:
//! every directory (so creations and removals inside it can be seen),
//! and every regular file the filter keeps. Ignored directory names
//! prune their whole subtree without descending.

use ignore::{WalkBuilder, WalkState};
use picket_core::{should_ignore, PathFilter};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{debug, warn};

use crate::error::{Result, WatchError};

/// Upper bound on walker threads. Traversal fans out per directory,
/// but very wide pools just contend on the same disk.
const MAX_WALK_THREADS: usize = 8;

/// Collects every path under `root` that should be watched.
///
/// Directories are always collected; regular files only when the
/// filter keeps them. Subtrees under an ignored name are skipped
/// outright — that is the designed skip signal, not a failure. The
/// walk fans out over a bounded thread pool and joins before
/// returning, so the result is complete.
///
/// A missing or unreadable root is an error. Entries that vanish or
/// turn unreadable mid-walk are logged and skipped.
pub(crate) fn collect(root: &Path, filter: &PathFilter) -> Result<Vec<PathBuf>> {
    let meta = std::fs::metadata(root).map_err(|e| WatchError::io(root, e))?;

    // A plain-file root degenerates to a single watch.
    if !meta.is_dir() {
        if filter.is_valid_file(root) {
            return Ok(vec![root.to_path_buf()]);
        }
        return Ok(Vec::new());
    }

    let threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_WALK_THREADS);

    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .follow_links(false)
        .threads(threads)
        .filter_entry(|entry| {
            // The root itself is exempt from the ignore rule.
            if entry.depth() == 0 {
                return true;
            }
            !should_ignore(&entry.file_name().to_string_lossy())
        })
        .build_parallel();

    let (tx, rx) = mpsc::channel::<PathBuf>();
    walker.run(|| {
        let tx = tx.clone();
        let filter = filter.clone();
        Box::new(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skipping unreadable entry: {}", err);
                    return WalkState::Continue;
                }
            };
            let file_type = match entry.file_type() {
                Some(file_type) => file_type,
                None => return WalkState::Continue,
            };
            if file_type.is_dir() || (file_type.is_file() && filter.is_valid_file(entry.path())) {
                // The receiver outlives the walk; a send can't fail here.
                let _ = tx.send(entry.into_path());
            }
            WalkState::Continue
        })
    });
    drop(tx);

    let mut paths: Vec<PathBuf> = rx.into_iter().collect();
    // Parents sort before their children, so watches register top-down.
    paths.sort();

    debug!("walked {} watchable paths under {}", paths.len(), root.display());
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::write(path, b"x").unwrap();
    }

    /// root/
    ///   bar2.js
    ///   t1/
    ///     bar1.md
    ///     .t3/
    ///       bazz
    ///   _skip/
    ///     kept.js
    fn scaffold(root: &Path) {
        fs::create_dir(root.join("t1")).unwrap();
        fs::create_dir(root.join("t1/.t3")).unwrap();
        fs::create_dir(root.join("_skip")).unwrap();
        touch(&root.join("bar2.js"));
        touch(&root.join("t1/bar1.md"));
        touch(&root.join("t1/.t3/bazz"));
        touch(&root.join("_skip/kept.js"));
    }

    #[test]
    fn collects_directories_and_all_files_without_allow_list() {
        let dir = tempdir().unwrap();
        scaffold(dir.path());

        let paths = collect(dir.path(), &PathFilter::default()).unwrap();

        assert!(paths.contains(&dir.path().to_path_buf()));
        assert!(paths.contains(&dir.path().join("t1")));
        assert!(paths.contains(&dir.path().join("bar2.js")));
        assert!(paths.contains(&dir.path().join("t1/bar1.md")));
    }

    #[test]
    fn never_descends_into_ignored_directories() {
        let dir = tempdir().unwrap();
        scaffold(dir.path());

        let paths = collect(dir.path(), &PathFilter::default()).unwrap();

        assert!(!paths.contains(&dir.path().join("t1/.t3")));
        assert!(!paths.contains(&dir.path().join("t1/.t3/bazz")));
        assert!(!paths.contains(&dir.path().join("_skip")));
        // Even files the filter would keep are invisible under an
        // ignored directory.
        assert!(!paths.contains(&dir.path().join("_skip/kept.js")));
    }

    #[test]
    fn allow_list_drops_files_but_keeps_directories() {
        let dir = tempdir().unwrap();
        scaffold(dir.path());

        let paths = collect(dir.path(), &PathFilter::new(["js"])).unwrap();

        assert!(paths.contains(&dir.path().join("bar2.js")));
        assert!(!paths.contains(&dir.path().join("t1/bar1.md")));
        // Directories stay watched so creations inside them are seen.
        assert!(paths.contains(&dir.path().join("t1")));
    }

    #[test]
    fn dotfile_named_root_is_still_walked() {
        let dir = tempdir().unwrap();
        let root = dir.path().join(".hidden-root");
        fs::create_dir(&root).unwrap();
        touch(&root.join("inner.js"));

        let paths = collect(&root, &PathFilter::default()).unwrap();
        assert!(paths.contains(&root.join("inner.js")));
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        let err = collect(&dir.path().join("nope"), &PathFilter::default()).unwrap_err();
        assert!(matches!(err, WatchError::Io { .. }));
    }

    #[test]
    fn file_root_degenerates_to_single_watch() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("solo.md");
        touch(&file);

        let paths = collect(&file, &PathFilter::default()).unwrap();
        assert_eq!(paths, vec![file.clone()]);

        let paths = collect(&file, &PathFilter::new(["js"])).unwrap();
        assert!(paths.is_empty());
    }
}
