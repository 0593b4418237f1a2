// src/watch/processor.rs

//! Turn raw change events into debounced, filtered notifications.
//!
//! The processor is synchronous and owns no timers: callers pass `now` in,
//! which keeps it deterministic under test. The observer's worker drives it
//! with `process_change` for every event and `flush_due` whenever the next
//! deadline passes.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::{debug, trace};

use crate::config::ObserverConfiguration;
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::ChangeKind;
use crate::watch::debounce::{DebounceOutcome, Debouncer};
use crate::watch::event::{ChangeEvent, ChangeNotification};
use crate::watch::filter::{ChangeFilter, FilterReason};
use crate::watch::hash::{compute_file_hash, ContentCache};

/// Result of feeding one event into the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Filtered(FilterReason),
    /// Waiting for the debounce window to close.
    Deferred,
    /// Ready for delivery right away (zero debounce window).
    Ready(ChangeNotification),
}

/// Counters kept by the processor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorStats {
    /// Raw events seen by `process_change`.
    pub received: u64,
    /// Events rejected by a filter rule.
    pub filtered: u64,
    /// Notifications handed out for delivery.
    pub emitted: u64,
    /// Notifications dropped after debouncing (transient files, unchanged
    /// content).
    pub suppressed: u64,
    /// Pending notifications thrown away by `discard_pending`.
    pub discarded: u64,
}

pub struct FileSystemChangeProcessor {
    filter: ChangeFilter,
    debouncer: Debouncer,
    fs: Arc<dyn FileSystem>,
    use_hash: bool,
    hashes: ContentCache,
    stats: ProcessorStats,
}

impl std::fmt::Debug for FileSystemChangeProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSystemChangeProcessor")
            .field("filter", &self.filter)
            .field("pending", &self.debouncer.len())
            .field("use_hash", &self.use_hash)
            .field("hashed", &self.hashes.len())
            .field("stats", &self.stats)
            .finish()
    }
}

impl FileSystemChangeProcessor {
    /// Processor backed by the real filesystem.
    pub fn new(config: &ObserverConfiguration) -> Result<Self> {
        Self::with_file_system(config, Arc::new(RealFileSystem))
    }

    pub fn with_file_system(config: &ObserverConfiguration, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let filter = ChangeFilter::from_config(config, fs.as_ref())?;
        Ok(Self {
            filter,
            debouncer: Debouncer::new(config.debounce()).observing(config.kinds().clone()),
            fs,
            use_hash: config.use_hash(),
            hashes: ContentCache::new(),
            stats: ProcessorStats::default(),
        })
    }

    pub fn filter(&self) -> &ChangeFilter {
        &self.filter
    }

    pub fn stats(&self) -> ProcessorStats {
        self.stats
    }

    /// Number of notifications waiting for their debounce window.
    pub fn pending(&self) -> usize {
        self.debouncer.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.next_deadline()
    }

    pub fn process_change(&mut self, event: ChangeEvent, now: Instant) -> ProcessOutcome {
        self.stats.received += 1;

        let rel = match self.admit(&event) {
            Ok(rel) => rel,
            Err(reason) => {
                self.stats.filtered += 1;
                trace!(path = ?event.path, kind = %event.kind, %reason, "event filtered");
                return ProcessOutcome::Filtered(reason);
            }
        };

        if self.debouncer.window().is_zero() {
            let notification = ChangeNotification {
                path: event.path,
                relative_path: rel,
                kind: event.kind,
                first_seen: event.timestamp,
                last_seen: event.timestamp,
                event_count: 1,
            };
            return match self.finalize(notification) {
                Ok(n) => ProcessOutcome::Ready(n),
                Err(reason) => ProcessOutcome::Filtered(reason),
            };
        }

        match self.debouncer.push(&event, rel, now) {
            DebounceOutcome::Deferred => ProcessOutcome::Deferred,
            DebounceOutcome::Cancelled => {
                self.stats.suppressed += 1;
                debug!(path = ?event.path, "transient file dropped");
                ProcessOutcome::Filtered(FilterReason::Transient)
            }
        }
    }

    /// Notifications whose debounce window closed at or before `now`, in
    /// deadline order.
    pub fn flush_due(&mut self, now: Instant) -> Vec<ChangeNotification> {
        self.debouncer
            .take_due(now)
            .into_iter()
            .filter_map(|n| self.finalize(n).ok())
            .collect()
    }

    /// Drop everything still pending. Returns the number dropped.
    pub fn discard_pending(&mut self) -> usize {
        let n = self.debouncer.clear();
        self.stats.discarded += n as u64;
        n
    }

    fn admit(&self, event: &ChangeEvent) -> Result<String, FilterReason> {
        let rel = self
            .filter
            .relativize(&event.path)
            .ok_or(FilterReason::OutsideRoots)?;
        self.filter.check(&rel, event.kind)?;
        if self.filter.lock_held(self.fs.as_ref()) {
            return Err(FilterReason::LockHeld);
        }
        Ok(rel)
    }

    fn finalize(&mut self, notification: ChangeNotification) -> Result<ChangeNotification, FilterReason> {
        if self.use_hash && !self.content_changed(&notification) {
            self.stats.suppressed += 1;
            debug!(path = ?notification.path, "content unchanged; notification suppressed");
            return Err(FilterReason::ContentUnchanged);
        }
        self.stats.emitted += 1;
        Ok(notification)
    }

    fn content_changed(&mut self, notification: &ChangeNotification) -> bool {
        match notification.kind {
            ChangeKind::Delete | ChangeKind::Move => {
                self.hashes.forget(&notification.path);
                true
            }
            ChangeKind::Create | ChangeKind::Modify => {
                match compute_file_hash(self.fs.as_ref(), &notification.path) {
                    Ok(hash) => {
                        let changed = self.hashes.update(&notification.path, hash);
                        changed || notification.kind == ChangeKind::Create
                    }
                    Err(err) => {
                        debug!(path = ?notification.path, error = %err, "hashing failed; letting change through");
                        true
                    }
                }
            }
        }
    }
}
