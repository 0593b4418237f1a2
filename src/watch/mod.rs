// src/watch/mod.rs

//! File watching and change delivery.
//!
//! The pipeline, in order:
//! - [`observer`] wires a `notify` watcher (native, or polling as fallback)
//!   to a background worker and manages its start/stop lifecycle.
//! - [`event`] maps raw `notify` events to [`ChangeEvent`]s.
//! - [`processor`] filters ([`filter`]), debounces ([`debounce`]) and
//!   optionally de-duplicates by content hash ([`hash`]) before emitting
//!   [`ChangeNotification`]s.
//! - [`dispatch`] hands every notification to the registered
//!   [`responder`]s, isolating their failures from each other.
//!
//! Everything except the observer is synchronous or runtime-agnostic, so
//! most of the behaviour can be tested without touching the filesystem.

pub mod debounce;
pub mod dispatch;
pub mod event;
pub mod filter;
pub mod hash;
pub mod observer;
pub mod processor;
pub mod responder;

pub use dispatch::{DispatchReport, ResponderDispatcher};
pub use event::{ChangeEvent, ChangeNotification};
pub use filter::{ChangeFilter, FilterReason};
pub use observer::{FileSystemObserver, ObserverState};
pub use processor::{FileSystemChangeProcessor, ProcessOutcome, ProcessorStats};
pub use responder::{
    CallbackResponder, ChangeResponder, ChannelResponder, CommandResponder, LoggingResponder,
    OperationResponder, ResponseFuture,
};
