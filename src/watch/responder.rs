// src/watch/responder.rs

//! Reactions to processed change notifications.
//!
//! A [`ChangeResponder`] receives every notification the processor emits (that
//! it [`accepts`](ChangeResponder::accepts)). Responders are driven by the
//! [`ResponderDispatcher`](crate::watch::dispatch::ResponderDispatcher), which
//! runs each one in its own task, so a failing or panicking responder only
//! affects itself.
//!
//! - [`LoggingResponder`] writes a tracing event.
//! - [`CallbackResponder`] calls a closure.
//! - [`ChannelResponder`] forwards notifications over a tokio channel.
//! - [`OperationResponder`] runs an [`Operation`] per notification.
//! - [`CommandResponder`] runs a shell command with the change described in
//!   its environment.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info, trace, warn};

use crate::operation::{CommandInput, Operation, OperationExt, ShellCommand};
use crate::watch::event::ChangeNotification;

/// Environment variable holding the absolute path of the changed file.
pub const ENV_CHANGED_PATH: &str = "FOUNDATION_CHANGED_PATH";
/// Environment variable holding the change kind (`create`, `modify`, ...).
pub const ENV_CHANGE_KIND: &str = "FOUNDATION_CHANGE_KIND";
/// Environment variable holding the path relative to its watched root.
pub const ENV_RELATIVE_PATH: &str = "FOUNDATION_RELATIVE_PATH";

pub type ResponseFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

pub trait ChangeResponder: Send + Sync {
    /// Name used in logs and dispatch reports.
    fn name(&self) -> &str;

    /// Whether this responder wants `notification` at all.
    fn accepts(&self, _notification: &ChangeNotification) -> bool {
        true
    }

    fn respond<'a>(&'a self, notification: &'a ChangeNotification) -> ResponseFuture<'a>;
}

/// Logs each notification at a fixed level.
#[derive(Debug, Clone)]
pub struct LoggingResponder {
    level: Level,
}

impl LoggingResponder {
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    pub fn level(&self) -> Level {
        self.level
    }
}

impl Default for LoggingResponder {
    fn default() -> Self {
        Self::new(Level::INFO)
    }
}

impl ChangeResponder for LoggingResponder {
    fn name(&self) -> &str {
        "log"
    }

    fn respond<'a>(&'a self, n: &'a ChangeNotification) -> ResponseFuture<'a> {
        Box::pin(async move {
            // tracing needs the level at compile time.
            let level = self.level;
            if level == Level::ERROR {
                error!(path = %n.relative_path, kind = %n.kind, events = n.event_count, "file changed");
            } else if level == Level::WARN {
                warn!(path = %n.relative_path, kind = %n.kind, events = n.event_count, "file changed");
            } else if level == Level::INFO {
                info!(path = %n.relative_path, kind = %n.kind, events = n.event_count, "file changed");
            } else if level == Level::DEBUG {
                debug!(path = %n.relative_path, kind = %n.kind, events = n.event_count, "file changed");
            } else {
                trace!(path = %n.relative_path, kind = %n.kind, events = n.event_count, "file changed");
            }
            Ok(())
        })
    }
}

/// Calls a synchronous closure for each notification.
pub struct CallbackResponder<F> {
    name: String,
    callback: F,
}

impl<F> CallbackResponder<F>
where
    F: Fn(&ChangeNotification) -> Result<()> + Send + Sync,
{
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

impl<F> ChangeResponder for CallbackResponder<F>
where
    F: Fn(&ChangeNotification) -> Result<()> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn respond<'a>(&'a self, n: &'a ChangeNotification) -> ResponseFuture<'a> {
        Box::pin(async move { (self.callback)(n) })
    }
}

/// Forwards notifications to a bounded tokio channel.
///
/// Stops accepting once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelResponder {
    tx: mpsc::Sender<ChangeNotification>,
}

impl ChannelResponder {
    pub fn new(tx: mpsc::Sender<ChangeNotification>) -> Self {
        Self { tx }
    }

    /// A responder plus the receiving end of a fresh channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ChangeNotification>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

impl ChangeResponder for ChannelResponder {
    fn name(&self) -> &str {
        "channel"
    }

    fn accepts(&self, _notification: &ChangeNotification) -> bool {
        !self.tx.is_closed()
    }

    fn respond<'a>(&'a self, n: &'a ChangeNotification) -> ResponseFuture<'a> {
        Box::pin(async move {
            self.tx
                .send(n.clone())
                .await
                .map_err(|_| anyhow!("notification receiver dropped"))
        })
    }
}

/// Runs an [`Operation`] for each notification.
///
/// `to_input` maps the notification to the operation's input; the operation
/// runs on the blocking pool via [`OperationExt::spawn`]. Blocking work
/// cannot be interrupted: after a timeout the operation keeps running to
/// completion in the background, only its result is discarded.
pub struct OperationResponder<O, F> {
    operation: Arc<O>,
    to_input: F,
}

impl<O, F> OperationResponder<O, F>
where
    O: Operation,
    F: Fn(&ChangeNotification) -> O::Input + Send + Sync,
{
    pub fn new(operation: Arc<O>, to_input: F) -> Self {
        Self { operation, to_input }
    }

    pub fn operation(&self) -> &Arc<O> {
        &self.operation
    }
}

impl<O, F> ChangeResponder for OperationResponder<O, F>
where
    O: Operation,
    F: Fn(&ChangeNotification) -> O::Input + Send + Sync,
{
    fn name(&self) -> &str {
        self.operation.name()
    }

    fn respond<'a>(&'a self, n: &'a ChangeNotification) -> ResponseFuture<'a> {
        Box::pin(async move {
            let input = (self.to_input)(n);
            Arc::clone(&self.operation).spawn(input).await?;
            Ok(())
        })
    }
}

/// Runs a shell command per notification.
///
/// The command sees [`ENV_CHANGED_PATH`], [`ENV_CHANGE_KIND`] and
/// [`ENV_RELATIVE_PATH`] in its environment. A non-zero exit is a failed
/// response. The process is killed if the response is aborted.
#[derive(Debug, Clone)]
pub struct CommandResponder {
    command: ShellCommand,
}

impl CommandResponder {
    pub fn new(command: ShellCommand) -> Self {
        Self { command }
    }

    pub fn command(&self) -> &ShellCommand {
        &self.command
    }
}

/// Environment describing `n` for child processes.
pub fn command_input(n: &ChangeNotification) -> CommandInput {
    CommandInput::new()
        .env(ENV_CHANGED_PATH, n.path.to_string_lossy())
        .env(ENV_CHANGE_KIND, n.kind.as_str())
        .env(ENV_RELATIVE_PATH, n.relative_path.as_str())
}

impl ChangeResponder for CommandResponder {
    fn name(&self) -> &str {
        self.command.command()
    }

    fn respond<'a>(&'a self, n: &'a ChangeNotification) -> ResponseFuture<'a> {
        Box::pin(async move {
            let output = self.command.run(command_input(n)).await?;
            debug!(cmd = %self.command.command(), exit_code = output.exit_code, "command responder finished");
            Ok(())
        })
    }
}
