//! Ticket lifecycle events.
//!
//! Notification delivery is deliberately unimplemented; this hook is the
//! extension point. The domain services publish an event on every ticket
//! state change, and an [`EventSink`] implementation decides what to do
//! with it. The default sink writes a structured log line.

use serde::Serialize;

use ticketslave_core::{CommentId, TicketId, TicketStatus, UserId};

/// Something that happened to a ticket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TicketEvent {
    Created {
        ticket_id: TicketId,
        actor_id: UserId,
    },
    Assigned {
        ticket_id: TicketId,
        actor_id: UserId,
        /// `None` means the ticket was unassigned.
        assignee_id: Option<UserId>,
    },
    StatusChanged {
        ticket_id: TicketId,
        actor_id: UserId,
        from: TicketStatus,
        to: TicketStatus,
    },
    Commented {
        ticket_id: TicketId,
        actor_id: UserId,
        comment_id: CommentId,
    },
    Deleted {
        ticket_id: TicketId,
        actor_id: UserId,
    },
}

/// Receiver for ticket events.
///
/// Implementations must be cheap and non-blocking; they run inline on the
/// request path after the database write has committed.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &TicketEvent);
}

/// Default sink: log the event and move on.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn publish(&self, event: &TicketEvent) {
        tracing::info!(event = ?event, "ticket event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Sink that records events for assertions.
    #[derive(Default)]
    pub struct RecordingSink(pub Mutex<Vec<TicketEvent>>);

    impl EventSink for RecordingSink {
        fn publish(&self, event: &TicketEvent) {
            #[allow(clippy::unwrap_used)]
            self.0.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let event = TicketEvent::StatusChanged {
            ticket_id: TicketId::new(1),
            actor_id: UserId::new(2),
            from: TicketStatus::Open,
            to: TicketStatus::Closed,
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "status_changed");
        assert_eq!(json["from"], "open");
    }

    #[test]
    fn test_recording_sink_captures() {
        let sink = RecordingSink::default();
        sink.publish(&TicketEvent::Created {
            ticket_id: TicketId::new(1),
            actor_id: UserId::new(1),
        });
        #[allow(clippy::unwrap_used)]
        let events = sink.0.lock().unwrap();
        assert_eq!(events.len(), 1);
    }
}
