//! Picket Core - event model and path filtering
//!
//! This crate provides the foundational types for Picket: the normalized
//! [`FileEvent`] delivered to consumers, the [`Op`] taxonomy of file
//! operations, and the [`PathFilter`] rules deciding which paths are
//! interesting in the first place.
//!
//! The filter is deliberately the single source of truth: the same
//! predicates run when the initial watch set is built and when live
//! events are screened for delivery.
//!
//! # Example
//!
//! ```
//! use picket_core::{FileEvent, Op, PathFilter};
//!
//! let filter = PathFilter::new(["js", "md"]);
//! assert!(filter.is_valid_file("notes/todo.md".as_ref()));
//! assert!(!filter.is_valid_file("notes/.draft.md".as_ref()));
//!
//! let event = FileEvent::new("/tmp/app/index.js", Op::Written);
//! assert_eq!(event.extension, ".js");
//! ```

pub mod event;
pub mod filter;

pub use event::{FileEvent, Op};
pub use filter::{extension_of, should_ignore, PathFilter};
