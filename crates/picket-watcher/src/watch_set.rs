//! Watch-set bookkeeping over the notification backend.

use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::Result;

/// The set of paths currently registered with the notification backend.
///
/// Every path is registered non-recursively; recursion is Picket's own
/// job, which is what lets the ignore rules prune whole subtrees.
/// Membership is recorded alongside the backend handle so removal is
/// idempotent and removing a directory also forgets everything that
/// was recorded underneath it.
pub(crate) struct WatchSet {
    backend: RecommendedWatcher,
    paths: HashSet<PathBuf>,
}

impl WatchSet {
    pub(crate) fn new(backend: RecommendedWatcher) -> Self {
        Self {
            backend,
            paths: HashSet::new(),
        }
    }

    /// Registers `path` with the backend.
    ///
    /// Re-adding a member refreshes the OS-level watch, which is how a
    /// recreated path recovers after its old watch died with the file.
    pub(crate) fn add(&mut self, path: &Path) -> std::result::Result<(), notify::Error> {
        self.backend.watch(path, RecursiveMode::NonRecursive)?;
        self.paths.insert(path.to_path_buf());
        Ok(())
    }

    /// Unregisters `path` and forgets every recorded member beneath it.
    ///
    /// Removing a path that was never registered is a no-op. The
    /// backend is expected to refuse the unwatch when the OS already
    /// dropped it together with the deleted file, so that failure is
    /// not surfaced.
    pub(crate) fn remove(&mut self, path: &Path) {
        let _ = self.backend.unwatch(path);
        self.paths.retain(|p| !p.starts_with(path));
    }

    pub(crate) fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    pub(crate) fn len(&self) -> usize {
        self.paths.len()
    }
}

/// Registers a batch of discovered paths.
///
/// A path that vanished between discovery and registration is skipped
/// with a warning; any other backend refusal is surfaced, since it
/// means watches are silently missing.
pub(crate) fn register_all(set: &mut WatchSet, paths: &[PathBuf]) -> Result<()> {
    for path in paths {
        if let Err(err) = set.add(path) {
            if is_not_found(&err) {
                warn!("skipping vanished path {}", path.display());
                continue;
            }
            return Err(err.into());
        }
    }
    Ok(())
}

/// Backends report a missing path either as their own variant or as a
/// raw NotFound IO error, depending on platform.
fn is_not_found(err: &notify::Error) -> bool {
    match &err.kind {
        notify::ErrorKind::PathNotFound => true,
        notify::ErrorKind::Io(io) => io.kind() == std::io::ErrorKind::NotFound,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn empty_set() -> WatchSet {
        let backend = notify::recommended_watcher(
            |_res: std::result::Result<notify::Event, notify::Error>| {},
        )
        .unwrap();
        WatchSet::new(backend)
    }

    #[test]
    fn add_is_idempotent_on_membership() {
        let dir = tempdir().unwrap();
        let mut set = empty_set();

        set.add(dir.path()).unwrap();
        set.add(dir.path()).unwrap();

        assert!(set.contains(dir.path()));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = tempdir().unwrap();
        let mut set = empty_set();

        set.add(dir.path()).unwrap();
        set.remove(dir.path());
        assert!(!set.contains(dir.path()));

        // Removing again (or removing something never added) is fine.
        set.remove(dir.path());
        set.remove(Path::new("/definitely/not/watched"));
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn removing_a_directory_forgets_its_children() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        let file = sub.join("a.txt");
        fs::create_dir(&sub).unwrap();
        fs::write(&file, b"x").unwrap();

        let mut set = empty_set();
        set.add(dir.path()).unwrap();
        set.add(&sub).unwrap();
        set.add(&file).unwrap();

        set.remove(&sub);
        assert!(set.contains(dir.path()));
        assert!(!set.contains(&sub));
        assert!(!set.contains(&file));
    }

    #[test]
    fn register_all_skips_vanished_paths() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("here.txt");
        fs::write(&present, b"x").unwrap();
        let vanished = dir.path().join("gone.txt");

        let mut set = empty_set();
        register_all(&mut set, &[present.clone(), vanished]).unwrap();

        assert!(set.contains(&present));
        assert_eq!(set.len(), 1);
    }
}
