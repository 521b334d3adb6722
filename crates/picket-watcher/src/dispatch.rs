//! The dispatch loop.
//!
//! One task owns the watch set and everything that mutates it. Raw
//! notifications, backend errors, external add requests and the
//! shutdown signal all arrive through channels, and the loop blocks on
//! whichever fires first. Watch-set mutation always happens before the
//! triggering event is forwarded, so a consumer reacting to `Created`
//! can rely on the new path already being subscribed.

use picket_core::{should_ignore, FileEvent, Op, PathFilter};
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

use crate::error::Result;
use crate::normalize::normalize;
use crate::walker;
use crate::watch_set::{register_all, WatchSet};

/// Requests funneled into the loop by the facade while it runs.
pub(crate) enum Command {
    /// Walk `path` and register everything the filter keeps.
    AddTree(PathBuf, oneshot::Sender<Result<()>>),
}

pub(crate) struct Dispatcher {
    pub(crate) watch_set: WatchSet,
    pub(crate) filter: PathFilter,
    pub(crate) raw_rx: mpsc::UnboundedReceiver<notify::Event>,
    pub(crate) err_rx: mpsc::UnboundedReceiver<notify::Error>,
    pub(crate) cmd_rx: mpsc::UnboundedReceiver<Command>,
    pub(crate) out_tx: mpsc::Sender<FileEvent>,
    pub(crate) shutdown_rx: mpsc::UnboundedReceiver<()>,
    /// Cleared once the facade drops its command sender, so the
    /// closed channel isn't polled in a tight loop.
    pub(crate) commands_open: bool,
}

impl Dispatcher {
    /// Runs until closed, the consumer goes away, or the backend
    /// reports a fatal error.
    ///
    /// The backend handle and the output sender drop when this
    /// returns; consumers therefore observe the stream closing only
    /// after the last in-flight event was processed.
    pub(crate) async fn run(mut self) {
        loop {
            tokio::select! {
                biased;

                // Some(()) is an explicit close; None means every close
                // handle dropped, which carries the same intent.
                _ = self.shutdown_rx.recv() => {
                    debug!("shutdown requested");
                    break;
                }

                err = self.err_rx.recv() => {
                    match err {
                        Some(err) => {
                            // Backend-reported failures (e.g. queue
                            // overflow) leave the watch state untrusted.
                            error!("watch backend failed, shutting down: {}", err);
                            break;
                        }
                        None => break,
                    }
                }

                cmd = self.cmd_rx.recv(), if self.commands_open => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd),
                        None => self.commands_open = false,
                    }
                }

                raw = self.raw_rx.recv() => {
                    match raw {
                        Some(raw) => {
                            if !self.handle_raw(raw).await {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }
        }
        debug!("dispatch loop exiting, releasing {} watches", self.watch_set.len());
    }

    /// Processes one raw notification. Returns false when the loop
    /// should stop because the consumer dropped the stream.
    async fn handle_raw(&mut self, raw: notify::Event) -> bool {
        let Some(event) = normalize(&raw) else {
            return true;
        };

        if !self.maintain(&event) {
            return true;
        }

        // Re-filter at delivery time: directories are watched
        // wholesale, but events for their children still obey the
        // allow-list individually.
        if self.filter.is_valid_file(&event.path) {
            if self.out_tx.send(event).await.is_err() {
                debug!("event consumer dropped, stopping");
                return false;
            }
        }
        true
    }

    /// Keeps the watch set in step with creations and removals.
    ///
    /// Returns false when the event's subject already vanished again
    /// (the benign create-then-delete race); such events are dropped
    /// rather than delivered for a path that no longer exists.
    fn maintain(&mut self, event: &FileEvent) -> bool {
        match event.op {
            Op::Created => {
                let Ok(meta) = std::fs::metadata(&event.path) else {
                    return false;
                };
                // Same rules the walker applies: an ignored name never
                // joins the watch set, not even as a directory.
                let watchable = if meta.is_dir() {
                    !should_ignore(&event.name)
                } else {
                    self.filter.is_valid_file(&event.path)
                };
                if watchable {
                    match self.watch_set.add(&event.path) {
                        Ok(()) => debug!("watching new path {}", event.path.display()),
                        Err(err) => {
                            warn!("could not watch {}: {}", event.path.display(), err)
                        }
                    }
                }
            }
            Op::Removed => self.watch_set.remove(&event.path),
            Op::Written | Op::Renamed | Op::MetadataChanged => {}
        }
        true
    }

    fn handle_command(&mut self, cmd: Command) {
        match cmd {
            Command::AddTree(path, reply) => {
                // The facade may have given up waiting; the work is
                // done either way.
                let _ = reply.send(self.add_tree(&path));
            }
        }
    }

    fn add_tree(&mut self, path: &Path) -> Result<()> {
        let paths = walker::collect(path, &self.filter)?;
        register_all(&mut self.watch_set, &paths)
    }
}
