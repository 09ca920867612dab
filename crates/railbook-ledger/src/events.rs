//! # Lifecycle Events
//!
//! Every successful state change publishes one [`LedgerEvent`] on a
//! bounded broadcast channel. Subscribers that fall behind by more than the
//! configured capacity observe a lag error and skip ahead; the ledger never
//! blocks on them, and publishing with no subscribers is a no-op.
//!
//! Events carry the clock reading of the operation that emitted them, so a
//! subscriber can rebuild a timeline without consulting the engine.

use railbook_core::{AccountId, Credits, StationName, TicketId, Timestamp, TrainId};
use serde::Serialize;
use tokio::sync::broadcast;

/// A completed state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A train was opened for sale.
    TrainCreated {
        /// The new train.
        train_id: TrainId,
        /// Route origin.
        origin: StationName,
        /// Route destination.
        destination: StationName,
        /// Seats offered.
        seat_capacity: u32,
        /// Per-seat fare.
        price: Credits,
        /// Sale window start.
        sale_window_start: Timestamp,
        /// Sale window end.
        sale_window_end: Timestamp,
        /// When it happened.
        at: Timestamp,
    },

    /// A seat was sold.
    TicketIssued {
        /// The train.
        train_id: TrainId,
        /// The issued ticket.
        ticket_id: TicketId,
        /// The buyer.
        holder: AccountId,
        /// The seat.
        seat_no: u32,
        /// What the buyer paid.
        paid: Credits,
        /// When it happened.
        at: Timestamp,
    },

    /// A ticket was refunded and destroyed.
    TicketRefunded {
        /// The train.
        train_id: TrainId,
        /// The destroyed ticket.
        ticket_id: TicketId,
        /// The refunded holder.
        holder: AccountId,
        /// The released seat.
        seat_no: u32,
        /// The amount paid back.
        refunded: Credits,
        /// When it happened.
        at: Timestamp,
    },

    /// A train was settled into the treasury and removed.
    TrainClosed {
        /// The closed train.
        train_id: TrainId,
        /// Escrow swept into the treasury.
        swept: Credits,
        /// Seats force-released without refund.
        released_seats: Vec<u32>,
        /// When it happened.
        at: Timestamp,
    },
}

impl LedgerEvent {
    /// The train the event concerns.
    pub fn train_id(&self) -> TrainId {
        match self {
            Self::TrainCreated { train_id, .. }
            | Self::TicketIssued { train_id, .. }
            | Self::TicketRefunded { train_id, .. }
            | Self::TrainClosed { train_id, .. } => *train_id,
        }
    }

    /// When the event happened.
    pub fn at(&self) -> Timestamp {
        match self {
            Self::TrainCreated { at, .. }
            | Self::TicketIssued { at, .. }
            | Self::TicketRefunded { at, .. }
            | Self::TrainClosed { at, .. } => *at,
        }
    }

    /// The serialized event tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TrainCreated { .. } => "train_created",
            Self::TicketIssued { .. } => "ticket_issued",
            Self::TicketRefunded { .. } => "ticket_refunded",
            Self::TrainClosed { .. } => "train_closed",
        }
    }
}

/// Sending half of the event channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    /// A bus buffering up to `capacity` events per subscriber.
    ///
    /// `capacity` must be non-zero; [`LedgerConfig::validate`](crate::config::LedgerConfig::validate)
    /// guarantees this for engine-owned buses.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// A fresh receiver that sees every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.sender.subscribe()
    }

    /// Current number of live receivers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub(crate) fn publish(&self, event: LedgerEvent) {
        let name = event.name();
        if self.sender.send(event).is_err() {
            tracing::trace!(event = name, "no subscribers for ledger event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed(train_id: TrainId) -> LedgerEvent {
        LedgerEvent::TrainClosed {
            train_id,
            swept: Credits::new(300),
            released_seats: vec![2, 5],
            at: Timestamp::from_millis(42),
        }
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = EventBus::new(4);
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish(closed(TrainId::new()));
    }

    #[test]
    fn subscribers_receive_in_order() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        let first = TrainId::new();
        let second = TrainId::new();
        bus.publish(closed(first));
        bus.publish(closed(second));
        assert_eq!(rx.try_recv().unwrap().train_id(), first);
        assert_eq!(rx.try_recv().unwrap().train_id(), second);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn slow_subscriber_lags() {
        let bus = EventBus::new(1);
        let mut rx = bus.subscribe();
        bus.publish(closed(TrainId::new()));
        bus.publish(closed(TrainId::new()));
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Lagged(1))
        ));
    }

    #[test]
    fn serialized_with_event_tag() {
        let json = serde_json::to_value(closed(TrainId::new())).unwrap();
        assert_eq!(json["event"], "train_closed");
        assert_eq!(json["swept"], 300);
        assert_eq!(json["released_seats"], serde_json::json!([2, 5]));
    }
}
