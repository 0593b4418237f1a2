// src/concurrency.rs

//! Running async code from synchronous contexts.
//!
//! [`BackgroundRuntime`] keeps a tokio runtime alive on a dedicated thread, so
//! synchronous code can hand it futures (or start a
//! [`FileSystemObserver`](crate::watch::FileSystemObserver) on it with
//! `start_on`). [`run_in_new_runtime`] is the one-shot variant.

use std::future::Future;
use std::sync::mpsc as std_mpsc;
use std::thread::{self, JoinHandle};

use tokio::runtime::{Builder, Handle};
use tokio::sync::oneshot;
use tokio::task;
use tracing::{debug, error};

use crate::errors::{FoundationError, Result};

/// A tokio runtime driven by its own named thread.
///
/// The runtime lives until [`shutdown`](Self::shutdown) is called or the
/// value is dropped; tasks still running at that point are cancelled.
#[derive(Debug)]
pub struct BackgroundRuntime {
    handle: Handle,
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl BackgroundRuntime {
    pub fn start(thread_name: &str) -> Result<Self> {
        let (handle_tx, handle_rx) = std_mpsc::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let thread = thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || {
                let runtime = match Builder::new_current_thread().enable_all().build() {
                    Ok(rt) => rt,
                    Err(err) => {
                        let _ = handle_tx.send(Err(err));
                        return;
                    }
                };
                if handle_tx.send(Ok(runtime.handle().clone())).is_err() {
                    return;
                }
                // Drives every task spawned through the handle until shutdown.
                let _ = runtime.block_on(shutdown_rx);
                debug!("background runtime stopping");
            })?;

        let handle = match handle_rx.recv() {
            Ok(Ok(handle)) => handle,
            Ok(Err(err)) => {
                let _ = thread.join();
                return Err(err.into());
            }
            Err(_) => {
                let _ = thread.join();
                return Err(FoundationError::Runtime(
                    "background runtime thread exited during startup".to_string(),
                ));
            }
        };

        debug!(thread = thread_name, "background runtime started");
        Ok(Self {
            handle,
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    pub fn spawn<F>(&self, future: F) -> task::JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }

    /// Run `future` to completion and return its output.
    ///
    /// Blocks the calling thread; must not be called from async code.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.handle.block_on(future)
    }

    /// Stop the runtime and wait for its thread to exit.
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| {
                error!("background runtime thread panicked");
                FoundationError::Runtime("background runtime thread panicked".to_string())
            }),
            None => Ok(()),
        }
    }
}

impl Drop for BackgroundRuntime {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Run a future to completion on a fresh current-thread runtime.
pub fn run_in_new_runtime<F: Future>(future: F) -> Result<F::Output> {
    let runtime = Builder::new_current_thread().enable_all().build()?;
    Ok(runtime.block_on(future))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn spawned_tasks_run_on_the_background_thread() {
        let rt = BackgroundRuntime::start("foundation-test-rt").unwrap();
        let task = rt.spawn(async { thread::current().name().map(str::to_string) });
        let name = rt.block_on(task).unwrap();
        assert_eq!(name.as_deref(), Some("foundation-test-rt"));
        rt.shutdown().unwrap();
    }

    #[test]
    fn block_on_can_use_timers() {
        let rt = BackgroundRuntime::start("foundation-timer-rt").unwrap();
        let out = rt.block_on(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            7
        });
        assert_eq!(out, 7);
    }

    #[test]
    fn run_in_new_runtime_returns_output() {
        let out = run_in_new_runtime(async { 40 + 2 }).unwrap();
        assert_eq!(out, 42);
    }
}
