//! Picket Watcher - recursive file watching with live watch-set maintenance
//!
//! This crate is the engine behind Picket:
//! - Walking a directory tree to build the initial watch set
//! - Normalizing raw backend notifications into [`FileEvent`]s
//! - Subscribing newly created directories and files on the fly,
//!   and dropping removed ones
//! - Running and cleanly shutting down the background dispatch loop
//!
//! Paths whose name starts with `.` or `_` are never watched, and an
//! optional extension allow-list narrows which files are reported.
//!
//! # Example
//!
//! ```no_run
//! use picket_watcher::Watcher;
//!
//! # #[tokio::main]
//! # async fn main() -> picket_watcher::Result<()> {
//! let mut watcher = Watcher::new("./site", &["md", "js"])?;
//! let mut events = watcher.watch()?;
//! while let Some(event) = events.recv().await {
//!     println!("{}", event);
//! }
//! # Ok(())
//! # }
//! ```

mod dispatch;
mod normalize;
mod walker;
mod watch_set;

pub mod error;
mod watcher;

pub use error::{Result, WatchError};
pub use watcher::{CloseHandle, Watcher};

// Re-exported so consumers don't need a separate picket-core import
// just to name the event types.
pub use picket_core::{FileEvent, Op};
