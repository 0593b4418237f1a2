//! Responders with scripted behaviour for exercising the dispatcher and
//! observer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::anyhow;
use foundation::watch::{ChangeNotification, ChangeResponder, ResponseFuture};

/// Records every notification it receives. Clones share the record.
#[derive(Debug, Clone, Default)]
pub struct RecordingResponder {
    seen: Arc<Mutex<Vec<ChangeNotification>>>,
}

impl RecordingResponder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> Vec<ChangeNotification> {
        self.seen.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn relative_paths(&self) -> Vec<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.relative_path.clone())
            .collect()
    }
}

impl ChangeResponder for RecordingResponder {
    fn name(&self) -> &str {
        "recording"
    }

    fn respond<'a>(&'a self, n: &'a ChangeNotification) -> ResponseFuture<'a> {
        Box::pin(async move {
            self.seen.lock().unwrap().push(n.clone());
            Ok(())
        })
    }
}

/// Fails on every call, counting attempts.
#[derive(Debug, Clone, Default)]
pub struct FailingResponder {
    calls: Arc<AtomicUsize>,
}

impl FailingResponder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChangeResponder for FailingResponder {
    fn name(&self) -> &str {
        "failing"
    }

    fn respond<'a>(&'a self, n: &'a ChangeNotification) -> ResponseFuture<'a> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("refusing {}", n.relative_path))
        })
    }
}

/// Panics on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanickingResponder;

impl ChangeResponder for PanickingResponder {
    fn name(&self) -> &str {
        "panicking"
    }

    fn respond<'a>(&'a self, n: &'a ChangeNotification) -> ResponseFuture<'a> {
        Box::pin(async move { blow_up(n) })
    }
}

fn blow_up(n: &ChangeNotification) -> anyhow::Result<()> {
    panic!("responder blew up on {}", n.relative_path)
}

/// Sleeps for a fixed delay before succeeding, counting completions.
#[derive(Debug, Clone)]
pub struct SlowResponder {
    delay: Duration,
    completed: Arc<AtomicUsize>,
}

impl SlowResponder {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            completed: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

impl ChangeResponder for SlowResponder {
    fn name(&self) -> &str {
        "slow"
    }

    fn respond<'a>(&'a self, _n: &'a ChangeNotification) -> ResponseFuture<'a> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            self.completed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}
