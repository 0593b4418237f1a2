// src/operation/mod.rs

//! Operations: parameterised units of work.
//!
//! An [`Operation`] carries its configuration as typed fields and exposes a
//! copy of it as [`Parameters`]. Every operation can be used from two kinds
//! of call sites:
//!
//! - synchronous code calls [`OperationExt::call`], which is exactly
//!   `execute`;
//! - async code calls [`OperationExt::spawn`] and awaits the returned
//!   [`OperationTask`], which runs `execute` on tokio's blocking pool.
//!
//! [`ParameterizedOperation`] is the untyped fallback for call sites that
//! only have a parameter map; [`ShellCommand`] runs a shell command.
//! [`OperationRegistry`] keeps untyped operations addressable by name.

pub mod dynamic;
pub mod parameters;
pub mod registry;
pub mod shell;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tracing::trace;

use crate::errors::{FoundationError, Result};

pub use dynamic::ParameterizedOperation;
pub use parameters::Parameters;
pub use registry::{DynOperation, OperationRegistry, Registry, RegistryId};
pub use shell::{CommandInput, CommandOutput, ShellCommand};

/// A unit of work with an explicit input and output.
pub trait Operation: Send + Sync + 'static {
    type Input: Send + 'static;
    type Output: Send + 'static;

    /// Human-readable name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// A copy of the parameters this operation was configured with.
    fn parameters(&self) -> Parameters;

    fn execute(&self, input: Self::Input) -> Result<Self::Output>;
}

/// Entry points shared by every [`Operation`].
pub trait OperationExt: Operation {
    /// Run the operation on the current thread.
    fn call(&self, input: Self::Input) -> Result<Self::Output> {
        trace!(operation = %self.name(), "calling operation");
        self.execute(input)
    }

    /// Run the operation on the blocking pool of the current tokio runtime.
    ///
    /// Panics if called outside a tokio runtime, like `tokio::spawn`.
    fn spawn(self: Arc<Self>, input: Self::Input) -> OperationTask<Self::Output>
    where
        Self: Sized,
    {
        trace!(operation = %self.name(), "spawning operation");
        let handle = tokio::task::spawn_blocking(move || self.execute(input));
        OperationTask { handle }
    }
}

impl<O: Operation + ?Sized> OperationExt for O {}

/// Handle to a spawned operation; resolves to the operation's result.
#[derive(Debug)]
pub struct OperationTask<T> {
    handle: tokio::task::JoinHandle<Result<T>>,
}

impl<T> OperationTask<T> {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Future for OperationTask<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.get_mut().handle).poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(err) if err.is_panic() => Err(FoundationError::OperationFailed(
                "operation panicked while executing".to_string(),
            )),
            Err(err) => Err(FoundationError::OperationFailed(err.to_string())),
        })
    }
}
