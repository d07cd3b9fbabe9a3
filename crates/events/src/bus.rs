//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the central publish/subscribe hub for [`BookingEvent`]s.
//! It is designed to be shared via `Arc<EventBus>` across the application.
//! Durable side effects go through the outbound queue, not the bus; the bus
//! exists for in-process observers (tests, future realtime surfaces).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use pawhub_core::types::DbId;

// ---------------------------------------------------------------------------
// Event type names
// ---------------------------------------------------------------------------

pub const EVENT_BOOKING_CREATED: &str = "booking.created";
pub const EVENT_BOOKING_ASSIGNED: &str = "booking.assigned";
pub const EVENT_BOOKING_CONFIRMED: &str = "booking.confirmed";
pub const EVENT_BOOKING_COMPLETED: &str = "booking.completed";
pub const EVENT_BOOKING_ARCHIVED: &str = "booking.archived";
pub const EVENT_BOOKING_CANCELLED: &str = "booking.cancelled";
pub const EVENT_OFFER_CREATED: &str = "offer.created";

// ---------------------------------------------------------------------------
// BookingEvent
// ---------------------------------------------------------------------------

/// A domain event emitted after a booking transition commits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingEvent {
    /// Dot-separated event name, e.g. `"booking.assigned"`.
    pub event_type: String,

    /// The booking the event concerns.
    pub booking_id: DbId,

    /// The user whose action produced the event, when known.
    pub actor_user_id: Option<DbId>,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: DateTime<Utc>,
}

impl BookingEvent {
    /// Create a new event for a booking.
    pub fn new(event_type: impl Into<String>, booking_id: DbId) -> Self {
        Self {
            event_type: event_type.into(),
            booking_id,
            actor_user_id: None,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    /// Attach the acting user to the event.
    pub fn with_actor(mut self, user_id: DbId) -> Self {
        self.actor_user_id = Some(user_id);
        self
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`BookingEvent`].
pub struct EventBus {
    sender: broadcast::Sender<BookingEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// durable delivery already happened through the outbound queue.
    pub fn publish(&self, event: BookingEvent) {
        // Ignore the SendError -- it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<BookingEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_receives_published_event() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            BookingEvent::new(EVENT_BOOKING_ASSIGNED, 7)
                .with_actor(1)
                .with_payload(serde_json::json!({"caregiver_id": 3})),
        );

        let event = rx.recv().await.expect("event");
        assert_eq!(event.event_type, EVENT_BOOKING_ASSIGNED);
        assert_eq!(event.booking_id, 7);
        assert_eq!(event.actor_user_id, Some(1));
        assert_eq!(event.payload["caregiver_id"], 3);
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::default();
        bus.publish(BookingEvent::new(EVENT_BOOKING_CREATED, 1));
    }
}
