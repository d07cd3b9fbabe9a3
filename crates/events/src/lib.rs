//! Pawhub event bus and outbound delivery infrastructure.
//!
//! Building blocks for side-effect fan-out around booking transitions:
//!
//! - [`EventBus`] -- in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`; publishing never blocks the caller.
//! - [`BookingEvent`] -- the canonical domain event envelope.
//! - [`OutboxDispatcher`] -- background consumer of the durable
//!   `outbound_tasks` queue with at-least-once delivery and dead-letter
//!   parking.
//! - [`delivery`] -- the concrete channels (in-app notification rows, SMTP
//!   email).

pub mod bus;
pub mod delivery;
pub mod outbox;

pub use bus::{BookingEvent, EventBus};
pub use delivery::email::{EmailConfig, EmailDelivery};
pub use outbox::{EmailPayload, NotificationPayload, OutboxDispatcher};
