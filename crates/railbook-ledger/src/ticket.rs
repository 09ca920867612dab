//! # Tickets
//!
//! A ticket is the buyer's proof of purchase for exactly one seat on one
//! train. It is issued by [`Train::sell_seat`](crate::train::Train::sell_seat)
//! and destroyed by a successful refund, which takes it by value.
//!
//! Tickets are serializable so the substrate can hand them to the buyer's
//! account, which also means a stored copy can be replayed. The train
//! therefore records which ticket currently holds each seat, and a refund
//! only succeeds for that exact ticket.

use railbook_core::{AccountId, Credits, TicketId, Timestamp, TrainId};
use serde::{Deserialize, Serialize};

use crate::error::BookingError;

/// Proof of purchase for one seat.
///
/// Not `Clone`: each issued ticket has exactly one owner.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    id: TicketId,
    train_ref: TrainId,
    holder: AccountId,
    cutoff_time: Timestamp,
    seat_no: u32,
    paid: Credits,
    issued_at: Timestamp,
}

impl Ticket {
    pub(crate) fn issue(
        train_ref: TrainId,
        holder: AccountId,
        cutoff_time: Timestamp,
        seat_no: u32,
        paid: Credits,
        issued_at: Timestamp,
    ) -> Self {
        Self {
            id: TicketId::new(),
            train_ref,
            holder,
            cutoff_time,
            seat_no,
            paid,
            issued_at,
        }
    }

    /// Unique ticket identifier.
    pub fn id(&self) -> TicketId {
        self.id
    }

    /// The train this ticket was sold on.
    pub fn train_ref(&self) -> TrainId {
        self.train_ref
    }

    /// The buyer.
    pub fn holder(&self) -> &AccountId {
        &self.holder
    }

    /// The train's sale window end at the time of purchase.
    pub fn cutoff_time(&self) -> Timestamp {
        self.cutoff_time
    }

    /// The purchased seat.
    pub fn seat_no(&self) -> u32 {
        self.seat_no
    }

    /// What the buyer paid, which may exceed the fare.
    pub fn paid(&self) -> Credits {
        self.paid
    }

    /// When the ticket was issued.
    pub fn issued_at(&self) -> Timestamp {
        self.issued_at
    }

    /// The first instant at which refunds are refused.
    pub fn refund_deadline(&self, refund_cutoff_ms: u64) -> Timestamp {
        self.cutoff_time.saturating_sub_millis(refund_cutoff_ms)
    }

    /// Checks that depend only on the ticket: the caller must be the holder
    /// and the refund deadline must not have passed.
    pub fn check_refundable(
        &self,
        caller: &AccountId,
        now: Timestamp,
        refund_cutoff_ms: u64,
    ) -> Result<(), BookingError> {
        if caller != &self.holder {
            return Err(BookingError::not_holder(caller, &self.holder));
        }
        let refund_deadline = self.refund_deadline(refund_cutoff_ms);
        if now >= refund_deadline {
            return Err(BookingError::RefundWindowClosed {
                train_id: self.train_ref,
                seat_no: self.seat_no,
                refund_deadline,
                now,
            });
        }
        Ok(())
    }
}
