#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Event system for async communication in satdl
//!
//! The lifecycle manager, the credential store and the downloader never print
//! anything. They emit domain events over an unbounded channel and the CLI
//! decides how to render and log them.
//!
//! ## Architecture
//!
//! - **Domain events**: grouped by functional domain (Request, Sweep, ...)
//! - **Unified `EventEmitter` trait**: one API for every emitter
//! - **Tracing integration**: every event carries an [`EventMeta`] with the
//!   tracing level and correlation id derived from the event

pub mod meta;
pub use meta::{EventLevel, EventMeta, EventSource};

pub mod events;
pub use events::{
    AppEvent, CredentialEvent, FailureContext, GeneralEvent, RequestEvent, SweepEvent,
    SweepFailureSummary, TransferEvent,
};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

/// An event together with its metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub meta: EventMeta,
    pub event: AppEvent,
}

impl EventMessage {
    #[must_use]
    pub fn new(event: AppEvent) -> Self {
        Self {
            meta: EventMeta::for_event(&event),
            event,
        }
    }
}

impl From<AppEvent> for EventMessage {
    fn from(event: AppEvent) -> Self {
        Self::new(event)
    }
}

/// Type alias for the event sender
pub type EventSender = UnboundedSender<EventMessage>;

/// Type alias for the event receiver
pub type EventReceiver = UnboundedReceiver<EventMessage>;

/// Create a new event channel
#[must_use]
pub fn channel() -> (EventSender, EventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// The unified trait for emitting events throughout satdl
///
/// Implemented by the raw `EventSender` and by every component that
/// optionally holds one.
pub trait EventEmitter {
    /// Get the event sender for this emitter
    fn event_sender(&self) -> Option<&EventSender>;

    /// Emit an event through this emitter
    fn emit(&self, event: AppEvent) {
        if let Some(sender) = self.event_sender() {
            // Ignore send errors - if receiver is dropped, we just continue
            let _ = sender.send(EventMessage::new(event));
        }
    }

    /// Emit a warning event
    fn emit_warning(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::warning(message)));
    }

    /// Emit an error event
    fn emit_error(&self, message: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::error(message)));
    }

    /// Emit an operation started event
    fn emit_operation_started(&self, operation: impl Into<String>) {
        self.emit(AppEvent::General(GeneralEvent::OperationStarted {
            operation: operation.into(),
        }));
    }

    /// Emit a request lifecycle event
    fn emit_request(&self, event: RequestEvent) {
        self.emit(AppEvent::Request(event));
    }

    /// Emit a sweep event
    fn emit_sweep(&self, event: SweepEvent) {
        self.emit(AppEvent::Sweep(event));
    }

    /// Emit a transfer event
    fn emit_transfer(&self, event: TransferEvent) {
        self.emit(AppEvent::Transfer(event));
    }

    /// Emit a credential event
    fn emit_credential(&self, event: CredentialEvent) {
        self.emit(AppEvent::Credential(event));
    }
}

/// Implementation of `EventEmitter` for the raw `EventSender`
/// This allows `EventSender` to be used directly where `EventEmitter` is expected
impl EventEmitter for EventSender {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(self)
    }
}
