//! Error types for the watching module.
//!
//! Errors here are construction- and lifecycle-shaped: once the
//! dispatch loop is running, per-path problems are handled in place
//! (skipped or logged) and never travel down the event stream.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience type for watcher operations that can fail.
pub type Result<T> = std::result::Result<T, WatchError>;

/// Things that can go wrong setting up or controlling a watcher.
#[derive(Error, Debug)]
pub enum WatchError {
    /// The notification backend couldn't be opened, or refused a
    /// registration that wasn't a benign vanished-path race.
    #[error("watch backend error: {0}")]
    Backend(#[from] notify::Error),

    /// Couldn't read a path while setting up the watch set.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `watch()` was called a second time. The output stream was
    /// already handed to the first caller.
    #[error("watcher is already running")]
    AlreadyWatching,

    /// The watcher was closed before or during the requested operation.
    #[error("watcher is closed")]
    Closed,
}

impl WatchError {
    /// Creates an IO error with the path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
