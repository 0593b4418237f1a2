// src/watch/observer.rs

//! The running side of the pipeline.
//!
//! `FileSystemObserver` owns a platform watcher and one background worker.
//! The notify callback runs on the watcher's own thread and only forwards
//! events into an unbounded channel; the worker drains that channel, feeds the
//! processor (on the blocking pool, since it reads files) and awaits the
//! dispatcher for every notification it emits.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use notify::{Config, Event, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ObserverConfiguration;
use crate::errors::{FoundationError, Result};
use crate::types::WatchBackend;
use crate::watch::dispatch::ResponderDispatcher;
use crate::watch::event::{ChangeNotification, events_from_notify};
use crate::watch::processor::{FileSystemChangeProcessor, ProcessOutcome};
use crate::watch::responder::ChangeResponder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserverState {
    Stopped,
    Running,
}

struct RunningWorker {
    // Dropped before the worker is joined so no new events arrive.
    watcher: Box<dyn Watcher + Send>,
    backend: WatchBackend,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<Option<FileSystemChangeProcessor>>,
}

pub struct FileSystemObserver {
    config: ObserverConfiguration,
    processor: Option<FileSystemChangeProcessor>,
    dispatcher: Arc<ResponderDispatcher>,
    worker: Option<RunningWorker>,
}

impl fmt::Debug for FileSystemObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSystemObserver")
            .field("state", &self.state())
            .field("paths", &self.config.paths())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl FileSystemObserver {
    /// Observer with a caller-supplied processor (e.g. one backed by a
    /// different [`FileSystem`](crate::fs::FileSystem)).
    pub fn new(
        config: ObserverConfiguration,
        processor: FileSystemChangeProcessor,
        responders: Vec<Arc<dyn ChangeResponder>>,
    ) -> Self {
        let dispatcher = ResponderDispatcher::new(responders, config.responder_timeout());
        Self {
            config,
            processor: Some(processor),
            dispatcher: Arc::new(dispatcher),
            worker: None,
        }
    }

    pub fn from_config(
        config: ObserverConfiguration,
        responders: Vec<Arc<dyn ChangeResponder>>,
    ) -> Result<Self> {
        let processor = FileSystemChangeProcessor::new(&config)?;
        Ok(Self::new(config, processor, responders))
    }

    pub fn config(&self) -> &ObserverConfiguration {
        &self.config
    }

    pub fn state(&self) -> ObserverState {
        if self.worker.is_some() {
            ObserverState::Running
        } else {
            ObserverState::Stopped
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Backend actually in use; `None` while stopped.
    pub fn active_backend(&self) -> Option<WatchBackend> {
        self.worker.as_ref().map(|w| w.backend)
    }

    /// The processor, available while the observer is stopped.
    pub fn processor(&self) -> Option<&FileSystemChangeProcessor> {
        self.processor.as_ref()
    }

    /// Start watching on the current tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Err(FoundationError::AlreadyRunning);
        }
        let handle = Handle::try_current()
            .map_err(|e| FoundationError::Runtime(format!("observer must be started inside a tokio runtime: {e}")))?;
        self.start_on(&handle)
    }

    /// Start watching, running the worker on `runtime`.
    pub fn start_on(&mut self, runtime: &Handle) -> Result<()> {
        if self.is_running() {
            return Err(FoundationError::AlreadyRunning);
        }

        let roots = self
            .config
            .paths()
            .iter()
            .map(|p| {
                p.canonicalize().map_err(|e| {
                    FoundationError::ConfigError(format!("cannot watch {}: {e}", p.display()))
                })
            })
            .collect::<Result<Vec<PathBuf>>>()?;

        let processor = match self.processor.take() {
            Some(p) => p,
            None => FileSystemChangeProcessor::new(&self.config)?,
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();
        let (watcher, backend) = match self.attach(&roots, event_tx) {
            Ok(attached) => attached,
            Err(err) => {
                self.processor = Some(processor);
                return Err(err);
            }
        };

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let dispatcher = Arc::clone(&self.dispatcher);
        let handle = runtime.spawn(run_worker(processor, dispatcher, event_rx, shutdown_rx));

        info!(paths = ?roots, %backend, "observer started");
        self.worker = Some(RunningWorker {
            watcher,
            backend,
            shutdown: shutdown_tx,
            handle,
        });
        Ok(())
    }

    /// Stop watching and wait for the worker to exit.
    ///
    /// A delivery already in progress completes; debounced notifications
    /// that are not yet due are dropped. No-op when stopped.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };

        drop(worker.watcher);
        // The worker may already be gone if it panicked.
        let _ = worker.shutdown.send(());

        match worker.handle.await {
            Ok(processor) => {
                // `None` if the processor could not be recovered; `start` rebuilds it.
                self.processor = processor;
                info!("observer stopped");
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "observer worker did not exit cleanly");
                Err(FoundationError::Runtime(format!("observer worker failed: {err}")))
            }
        }
    }

    fn attach(
        &self,
        roots: &[PathBuf],
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> Result<(Box<dyn Watcher + Send>, WatchBackend)> {
        let mode = if self.config.recursive() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        if self.config.backend() == WatchBackend::Native {
            let native = RecommendedWatcher::new(forwarder(event_tx.clone()), Config::default())
                .and_then(|mut w| {
                    for root in roots {
                        w.watch(root, mode)?;
                    }
                    Ok(w)
                });
            match native {
                Ok(w) => return Ok((Box::new(w), WatchBackend::Native)),
                Err(err) => warn!(error = %err, "native watcher unavailable; falling back to polling"),
            }
        }

        let config = Config::default().with_poll_interval(self.config.poll_interval());
        let mut poll = PollWatcher::new(forwarder(event_tx), config)?;
        for root in roots {
            poll.watch(root, mode)?;
        }
        Ok((Box::new(poll), WatchBackend::Poll))
    }
}

impl Drop for FileSystemObserver {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.handle.abort();
        }
    }
}

/// Notify callback: forward events into the worker's channel.
fn forwarder(tx: mpsc::UnboundedSender<Event>) -> impl FnMut(notify::Result<Event>) + Send + 'static {
    move |res| match res {
        Ok(event) => {
            // The receiver is gone only while shutting down.
            let _ = tx.send(event);
        }
        Err(err) => warn!(error = %err, "file watch error"),
    }
}

async fn run_worker(
    processor: FileSystemChangeProcessor,
    dispatcher: Arc<ResponderDispatcher>,
    mut events: mpsc::UnboundedReceiver<Event>,
    mut shutdown: oneshot::Receiver<()>,
) -> Option<FileSystemChangeProcessor> {
    let shared = Arc::new(Mutex::new(processor));

    loop {
        let deadline = lock(&shared).next_deadline();
        tokio::select! {
            biased;
            _ = &mut shutdown => break,
            received = events.recv() => {
                let Some(event) = received else { break };
                let changes = events_from_notify(&event);
                let ready = off_worker(&shared, move |p| {
                    let now = Instant::now();
                    changes
                        .into_iter()
                        .filter_map(|change| match p.process_change(change, now) {
                            ProcessOutcome::Ready(n) => Some(n),
                            _ => None,
                        })
                        .collect()
                })
                .await;
                for n in ready {
                    deliver(&dispatcher, &n).await;
                }
            }
            _ = sleep_until(deadline) => {
                let due = off_worker(&shared, |p| p.flush_due(Instant::now())).await;
                for n in due {
                    deliver(&dispatcher, &n).await;
                }
            }
        }
    }

    let dropped = lock(&shared).discard_pending();
    if dropped > 0 {
        debug!(dropped, "discarded pending notifications");
    }
    Arc::into_inner(shared).map(|m| m.into_inner().unwrap_or_else(PoisonError::into_inner))
}

fn lock(processor: &Mutex<FileSystemChangeProcessor>) -> MutexGuard<'_, FileSystemChangeProcessor> {
    processor.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run a processor step on the blocking pool.
///
/// Lock-file checks and content hashing touch the filesystem, which must not
/// stall the runtime thread the worker shares with responders.
async fn off_worker<F>(processor: &Arc<Mutex<FileSystemChangeProcessor>>, step: F) -> Vec<ChangeNotification>
where
    F: FnOnce(&mut FileSystemChangeProcessor) -> Vec<ChangeNotification> + Send + 'static,
{
    let shared = Arc::clone(processor);
    match tokio::task::spawn_blocking(move || step(&mut *lock(&shared))).await {
        Ok(ready) => ready,
        Err(err) => {
            error!(error = %err, "change processing failed; events dropped");
            Vec::new()
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

async fn deliver(dispatcher: &ResponderDispatcher, n: &ChangeNotification) {
    debug!(path = %n.relative_path, kind = %n.kind, events = n.event_count, "delivering change");
    let report = dispatcher.dispatch(n).await;
    if !report.is_clean() {
        warn!(
            path = %n.relative_path,
            failed = report.failed,
            timed_out = report.timed_out,
            "some responders did not complete"
        );
    }
}
