//! Read-only snapshots returned by the engine's query surface.

use railbook_core::{Credits, StationName, Timestamp, TrainId};
use serde::Serialize;

use crate::train::{SalePhase, Train, TrainStatus};

/// Point-in-time view of one train.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainSummary {
    /// The train.
    pub train_id: TrainId,
    /// Route origin.
    pub origin: StationName,
    /// Route destination.
    pub destination: StationName,
    /// Seats offered.
    pub seat_capacity: u32,
    /// Per-seat fare.
    pub price: Credits,
    /// Sale window start.
    pub sale_window_start: Timestamp,
    /// Sale window end.
    pub sale_window_end: Timestamp,
    /// Sold seat numbers, ascending.
    pub sold_seats: Vec<u32>,
    /// Value held in escrow.
    pub escrow: Credits,
    /// Where the snapshot instant falls in the sale window.
    pub phase: SalePhase,
    /// Lifecycle status.
    pub status: TrainStatus,
}

impl TrainSummary {
    pub(crate) fn of(train: &Train, now: Timestamp, refund_cutoff_ms: u64) -> Self {
        let window = train.window();
        Self {
            train_id: train.id(),
            origin: train.origin().clone(),
            destination: train.destination().clone(),
            seat_capacity: train.seat_capacity(),
            price: train.price(),
            sale_window_start: window.start,
            sale_window_end: window.end,
            sold_seats: train.sold_seats(),
            escrow: train.escrow(),
            phase: window.phase(now, refund_cutoff_ms),
            status: train.status(),
        }
    }

    /// Seats still available.
    pub fn seats_available(&self) -> u32 {
        let sold = u32::try_from(self.sold_seats.len()).unwrap_or(u32::MAX);
        self.seat_capacity.saturating_sub(sold)
    }
}

/// One row of the route table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    /// Route origin.
    pub origin: StationName,
    /// Route destination.
    pub destination: StationName,
    /// Open trains on the route, in creation order.
    pub trains: Vec<TrainId>,
}
