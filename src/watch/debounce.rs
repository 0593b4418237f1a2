// src/watch/debounce.rs

//! Per-path trailing-edge debouncing.
//!
//! Every event on a path pushes that path's deadline to `last + window`, but
//! never beyond `first + MAX_WINDOWS * window`, so a file that is written
//! continuously still produces a notification eventually.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};

use crate::types::ChangeKind;
use crate::watch::event::{ChangeEvent, ChangeNotification};

/// Upper bound on how long a path can stay pending, in windows.
pub const MAX_WINDOWS: u32 = 10;

/// Stand-in for "never" when a deadline does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceOutcome {
    /// The event was folded into a pending notification.
    Deferred,
    /// The pending notification cancelled itself out (create then delete).
    Cancelled,
}

#[derive(Debug)]
struct Pending {
    relative_path: String,
    kind: ChangeKind,
    first_at: Instant,
    deadline: Instant,
    first_seen: SystemTime,
    last_seen: SystemTime,
    event_count: usize,
}

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    observed: BTreeSet<ChangeKind>,
    pending: HashMap<PathBuf, Pending>,
}

/// Combine the kind already pending for a path with a newly observed one.
///
/// `None` means the two cancel out.
pub fn merge_kinds(pending: ChangeKind, next: ChangeKind) -> Option<ChangeKind> {
    match (pending, next) {
        (ChangeKind::Create, ChangeKind::Modify) => Some(ChangeKind::Create),
        (ChangeKind::Create, ChangeKind::Delete) => None,
        (ChangeKind::Delete, ChangeKind::Create) => Some(ChangeKind::Modify),
        (_, next) => Some(next),
    }
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            observed: ChangeKind::ALL.into_iter().collect(),
            pending: HashMap::new(),
        }
    }

    /// Restrict merged kinds to `kinds`.
    ///
    /// When merging produces a kind outside the set, the pending
    /// notification takes the kind of the latest event instead.
    pub fn observing(mut self, kinds: BTreeSet<ChangeKind>) -> Self {
        self.observed = kinds;
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn push(&mut self, event: &ChangeEvent, relative_path: String, now: Instant) -> DebounceOutcome {
        let cap = self.window.saturating_mul(MAX_WINDOWS);

        if let Some(entry) = self.pending.get_mut(&event.path) {
            let Some(merged) = merge_kinds(entry.kind, event.kind) else {
                self.pending.remove(&event.path);
                return DebounceOutcome::Cancelled;
            };
            entry.kind = if self.observed.contains(&merged) {
                merged
            } else {
                event.kind
            };
            entry.last_seen = event.timestamp;
            entry.event_count += 1;
            entry.deadline = later(now, self.window).min(later(entry.first_at, cap));
            return DebounceOutcome::Deferred;
        }

        self.pending.insert(
            event.path.clone(),
            Pending {
                relative_path,
                kind: event.kind,
                first_at: now,
                deadline: later(now, self.window),
                first_seen: event.timestamp,
                last_seen: event.timestamp,
                event_count: 1,
            },
        );
        DebounceOutcome::Deferred
    }

    /// Remove and return every notification whose deadline is `<= now`,
    /// earliest deadline first.
    pub fn take_due(&mut self, now: Instant) -> Vec<ChangeNotification> {
        let due_paths: Vec<PathBuf> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(path, _)| path.clone())
            .collect();

        let mut due: Vec<(Instant, ChangeNotification)> = due_paths
            .into_iter()
            .filter_map(|path| {
                let entry = self.pending.remove(&path)?;
                Some((entry.deadline, into_notification(path, entry)))
            })
            .collect();

        due.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.path.cmp(&b.1.path)));
        due.into_iter().map(|(_, n)| n).collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    /// Drop everything pending, returning how many notifications were lost.
    pub fn clear(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

fn later(at: Instant, after: Duration) -> Instant {
    at.checked_add(after)
        .or_else(|| at.checked_add(FAR_FUTURE))
        .unwrap_or(at)
}

fn into_notification(path: PathBuf, entry: Pending) -> ChangeNotification {
    ChangeNotification {
        path,
        relative_path: entry.relative_path,
        kind: entry.kind,
        first_seen: entry.first_seen,
        last_seen: entry.last_seen,
        event_count: entry.event_count,
    }
}
