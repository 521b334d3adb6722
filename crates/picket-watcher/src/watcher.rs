//! The watcher facade.
//!
//! [`Watcher`] ties the pieces together: it opens the notification
//! backend, walks the root to build the initial watch set, and hands
//! ownership of both to the dispatch loop when watching starts. From
//! that point on the loop is the only writer of the watch set; the
//! facade talks to it through channels.

use picket_core::{FileEvent, PathFilter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::dispatch::{Command, Dispatcher};
use crate::error::{Result, WatchError};
use crate::walker;
use crate::watch_set::{register_all, WatchSet};

/// Capacity of the output event stream. A consumer that falls behind
/// applies backpressure to the dispatch loop instead of growing memory.
const EVENT_BUFFER: usize = 64;

/// Watches a directory tree for file changes.
///
/// Construction walks the tree and registers everything the filter
/// keeps; [`Watcher::watch`] then starts the background dispatch loop
/// and returns the stream of [`FileEvent`]s. Directories created later
/// join the watch set automatically, removed paths leave it, and
/// dotfile/underscore names never enter it.
///
/// Dropping the watcher (or calling [`Watcher::close`]) shuts the loop
/// down; the event stream closes once the last in-flight event has
/// been processed.
pub struct Watcher {
    root: PathBuf,
    filter: PathFilter,
    /// Present until `watch()` moves it into the dispatch task.
    idle: Option<IdleParts>,
    cmd_tx: mpsc::UnboundedSender<Command>,
    handle: CloseHandle,
}

impl std::fmt::Debug for Watcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// Everything the dispatch loop takes ownership of.
struct IdleParts {
    watch_set: WatchSet,
    raw_rx: mpsc::UnboundedReceiver<notify::Event>,
    err_rx: mpsc::UnboundedReceiver<notify::Error>,
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    shutdown_rx: mpsc::UnboundedReceiver<()>,
}

/// Cloneable handle that shuts a [`Watcher`] down from any task.
#[derive(Clone)]
pub struct CloseHandle {
    shutdown_tx: mpsc::UnboundedSender<()>,
    closed: Arc<AtomicBool>,
}

impl CloseHandle {
    /// Signals shutdown. Idempotent, never blocks, and safe to call
    /// even if the dispatch loop already exited on a backend failure.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        debug!("close requested");
        // Err means the loop is already gone; nothing left to signal.
        let _ = self.shutdown_tx.send(());
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Watcher {
    /// Creates a watcher rooted at `root`.
    ///
    /// `extensions` restricts which files are watched and reported;
    /// entries are plain extension strings (`"js"`) and an empty slice
    /// keeps everything. The root is canonicalized, so delivered event
    /// paths are absolute.
    ///
    /// Blocks until the initial tree walk completes. Fails when the
    /// notification backend can't be opened or the root is missing or
    /// unreadable.
    pub fn new(root: impl AsRef<Path>, extensions: &[&str]) -> Result<Self> {
        let root = root.as_ref();
        let root = root.canonicalize().map_err(|e| WatchError::io(root, e))?;
        let filter = PathFilter::new(extensions.iter().copied());

        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let (err_tx, err_rx) = mpsc::unbounded_channel();
        let backend = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                // A failed send means the dispatch loop is gone and
                // nobody is left to care.
                Ok(event) => {
                    let _ = raw_tx.send(event);
                }
                Err(err) => {
                    let _ = err_tx.send(err);
                }
            },
        )?;

        let mut watch_set = WatchSet::new(backend);
        let paths = walker::collect(&root, &filter)?;
        register_all(&mut watch_set, &paths)?;
        info!("watching {} paths under {}", watch_set.len(), root.display());

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::unbounded_channel();

        Ok(Self {
            root,
            filter,
            idle: Some(IdleParts {
                watch_set,
                raw_rx,
                err_rx,
                cmd_rx,
                shutdown_rx,
            }),
            cmd_tx,
            handle: CloseHandle {
                shutdown_tx,
                closed: Arc::new(AtomicBool::new(false)),
            },
        })
    }

    /// Starts the dispatch loop and returns the event stream.
    ///
    /// Must be called from within a Tokio runtime. The stream yields
    /// events in the order the backend reports them per path, and
    /// closes when the watcher shuts down.
    ///
    /// Only one stream exists: a second call fails with
    /// [`WatchError::AlreadyWatching`], and a call after [`close`]
    /// fails with [`WatchError::Closed`].
    ///
    /// [`close`]: Watcher::close
    pub fn watch(&mut self) -> Result<mpsc::Receiver<FileEvent>> {
        if self.handle.is_closed() {
            return Err(WatchError::Closed);
        }
        let parts = self.idle.take().ok_or(WatchError::AlreadyWatching)?;
        let (out_tx, out_rx) = mpsc::channel(EVENT_BUFFER);
        let dispatcher = Dispatcher {
            watch_set: parts.watch_set,
            filter: self.filter.clone(),
            raw_rx: parts.raw_rx,
            err_rx: parts.err_rx,
            cmd_rx: parts.cmd_rx,
            out_tx,
            shutdown_rx: parts.shutdown_rx,
            commands_open: true,
        };
        tokio::spawn(dispatcher.run());
        debug!("dispatch loop started for {}", self.root.display());
        Ok(out_rx)
    }

    /// Adds `path` — and everything under it that the filter keeps —
    /// to the watch set, under the same rules as the initial walk.
    ///
    /// Before [`watch`] the registration happens inline; while the
    /// dispatch loop runs, the request is funneled through it so the
    /// watch set keeps a single writer.
    ///
    /// [`watch`]: Watcher::watch
    pub async fn add_files(&mut self, path: impl AsRef<Path>) -> Result<()> {
        if self.handle.is_closed() {
            return Err(WatchError::Closed);
        }
        let path = path.as_ref();
        let path = path.canonicalize().map_err(|e| WatchError::io(path, e))?;
        match self.idle.as_mut() {
            Some(parts) => {
                let paths = walker::collect(&path, &self.filter)?;
                register_all(&mut parts.watch_set, &paths)
            }
            None => {
                let (reply_tx, reply_rx) = oneshot::channel();
                self.cmd_tx
                    .send(Command::AddTree(path, reply_tx))
                    .map_err(|_| WatchError::Closed)?;
                reply_rx.await.map_err(|_| WatchError::Closed)?
            }
        }
    }

    /// Signals shutdown. Idempotent and non-blocking; see
    /// [`CloseHandle::close`].
    pub fn close(&self) {
        self.handle.close();
    }

    /// A cloneable handle for closing this watcher from another task,
    /// e.g. a signal handler.
    pub fn close_handle(&self) -> CloseHandle {
        self.handle.clone()
    }

    /// True once [`close`] was called. An event stream that ended
    /// without this flag set was shut down implicitly — a fatal
    /// backend error, or every handle dropped.
    ///
    /// [`close`]: Watcher::close
    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    /// The canonicalized root this watcher was built for.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
