// src/watch/dispatch.rs

//! Fan a notification out to every registered responder.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::watch::event::ChangeNotification;
use crate::watch::responder::ChangeResponder;

/// What happened to one notification across all responders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    /// Responders that did not accept the notification.
    pub skipped: usize,
    /// Responders that returned an error or panicked.
    pub failed: usize,
    pub timed_out: usize,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.timed_out == 0
    }
}

/// Runs responders one after another, each in its own tokio task.
///
/// A responder that errors, panics or outlives `timeout` is logged and
/// counted; the remaining responders still run.
#[derive(Clone)]
pub struct ResponderDispatcher {
    responders: Vec<Arc<dyn ChangeResponder>>,
    timeout: Option<Duration>,
}

impl fmt::Debug for ResponderDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.responders.iter().map(|r| r.name()).collect();
        f.debug_struct("ResponderDispatcher")
            .field("responders", &names)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ResponderDispatcher {
    pub fn new(responders: Vec<Arc<dyn ChangeResponder>>, timeout: Option<Duration>) -> Self {
        Self { responders, timeout }
    }

    pub fn len(&self) -> usize {
        self.responders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responders.is_empty()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub async fn dispatch(&self, notification: &ChangeNotification) -> DispatchReport {
        let mut report = DispatchReport::default();

        for responder in &self.responders {
            if !responder.accepts(notification) {
                report.skipped += 1;
                continue;
            }

            let name = responder.name().to_string();
            let responder = Arc::clone(responder);
            let n = notification.clone();
            let mut handle = tokio::spawn(async move { responder.respond(&n).await });

            let joined = match self.timeout {
                Some(limit) => match tokio::time::timeout(limit, &mut handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        handle.abort();
                        warn!(responder = %name, timeout = ?limit, path = %notification.relative_path, "responder timed out");
                        report.timed_out += 1;
                        continue;
                    }
                },
                None => handle.await,
            };

            match joined {
                Ok(Ok(())) => {
                    debug!(responder = %name, path = %notification.relative_path, "responder finished");
                    report.delivered += 1;
                }
                Ok(Err(err)) => {
                    error!(responder = %name, path = %notification.relative_path, error = %err, "responder failed");
                    report.failed += 1;
                }
                Err(join_err) => {
                    error!(responder = %name, path = %notification.relative_path, error = %join_err, "responder panicked");
                    report.failed += 1;
                }
            }
        }

        report
    }
}
