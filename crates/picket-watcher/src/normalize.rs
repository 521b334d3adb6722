//! Raw event normalization.
//!
//! The backend describes changes in more detail than consumers want
//! (data vs. metadata writes, rename phases, access notifications).
//! This module collapses that taxonomy into [`Op`] and attaches the
//! path-derived fields of a [`FileEvent`].

use notify::event::{EventKind, ModifyKind};
use notify::Event;
use picket_core::{FileEvent, Op};

/// Maps a raw backend notification to a normalized event.
///
/// Returns `None` when the notification carries no path (malformed)
/// or describes an operation outside the [`Op`] taxonomy, such as a
/// pure access notification. Either way the caller treats it as a
/// no-op.
pub(crate) fn normalize(event: &Event) -> Option<FileEvent> {
    let path = event.paths.first()?;
    let op = op_for(&event.kind)?;
    Some(FileEvent::new(path.clone(), op))
}

fn op_for(kind: &EventKind) -> Option<Op> {
    match kind {
        EventKind::Create(_) => Some(Op::Created),
        EventKind::Remove(_) => Some(Op::Removed),
        EventKind::Modify(ModifyKind::Name(_)) => Some(Op::Renamed),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some(Op::MetadataChanged),
        // Data writes, plus the catch-all modify kinds some platforms
        // report for plain writes.
        EventKind::Modify(_) => Some(Op::Written),
        EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
    }
}
