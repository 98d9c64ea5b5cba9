//! # Junction Events
//!
//! The gateway's only structured observability channel.
//!
//! Every action and webhook execution reports its lifecycle — Started,
//! Complete or Failed — as a [`SystemEvent`] published to a broker topic
//! through [`EventPublisher`], which owns serialization and at-least-once
//! retry. Handlers wanting custom progress logs use the same primitive with
//! a [`EventType::CustomLog`] event.
//!
//! Instrumentation is explicit middleware: [`InstrumentedAction`] and
//! [`InstrumentedWebhook`] wrap a handler where it is registered, emitting
//! the lifecycle pair around each invocation and never swallowing the
//! handler's error.

/// Event envelope and payload types.
pub mod event;
/// The retrying publisher.
pub mod publisher;
/// Broker port and the in-memory test sink.
pub mod sink;
/// Handler instrumentation wrappers.
pub mod wrap;

pub use event::{EventPayload, EventType, SystemEvent, SCHEMA_VERSION};
pub use publisher::{EventPublisher, PublishError};
pub use sink::{EventSink, MemorySink, SinkError};
pub use wrap::{EmitPolicy, InstrumentedAction, InstrumentedWebhook};
