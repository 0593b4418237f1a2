// src/watch/event.rs

//! Change records flowing through the pipeline.

use std::path::PathBuf;
use std::time::SystemTime;

use notify::event::{EventKind, ModifyKind};

use crate::types::ChangeKind;

/// A single raw change reported by the platform watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
    pub timestamp: SystemTime,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self::at(path, kind, SystemTime::now())
    }

    pub fn at(path: impl Into<PathBuf>, kind: ChangeKind, timestamp: SystemTime) -> Self {
        Self {
            path: path.into(),
            kind,
            timestamp,
        }
    }
}

/// A processed change, ready for responders.
///
/// One notification may stand for several raw events on the same path that
/// arrived within the debounce window (`event_count`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotification {
    pub path: PathBuf,
    /// Path relative to the watched root it was found under, `/`-separated.
    pub relative_path: String,
    pub kind: ChangeKind,
    pub first_seen: SystemTime,
    pub last_seen: SystemTime,
    pub event_count: usize,
}

/// Map a `notify` event onto zero or more [`ChangeEvent`]s.
///
/// Access notifications and catch-all kinds carry no content change and are
/// dropped. Renames become `Move` for every path involved; metadata changes
/// count as `Modify`.
pub fn events_from_notify(event: &notify::Event) -> Vec<ChangeEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Create,
        EventKind::Remove(_) => ChangeKind::Delete,
        EventKind::Modify(ModifyKind::Name(_)) => ChangeKind::Move,
        EventKind::Modify(_) => ChangeKind::Modify,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => return Vec::new(),
    };

    let now = SystemTime::now();
    event
        .paths
        .iter()
        .map(|path| ChangeEvent::at(path.clone(), kind, now))
        .collect()
}
