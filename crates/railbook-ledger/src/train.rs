//! # Train Runs
//!
//! A [`Train`] is the seat-allocation and escrow unit for one scheduled
//! run between two stations.
//!
//! ## Lifecycle
//!
//! ```text
//! create ──▶ OPEN ──sell_seat / refund_seat──▶ OPEN ──settle──▶ CLOSED
//! ```
//!
//! `CLOSED` is terminal: a closed train rejects every operation as
//! [`BookingError::TrainNotFound`], and the engine drops it from its arena.
//!
//! ## Invariants
//!
//! - Seat numbers lie in `1..=seat_capacity` and each is sold at most once.
//!   Sold seats are the key set of one map, so the seat list and the
//!   seat-to-buyer assignments cannot disagree.
//! - `escrow` equals the sum of the journal: every sale adds the full
//!   payment, every refund removes exactly the fare, the closing sweep
//!   removes the rest. Overpayment therefore stays in escrow after a refund
//!   and ends up in the station treasury.
//! - Every operation validates before it mutates. A returned `Err` means
//!   nothing changed.

use std::collections::BTreeMap;

use railbook_core::{AccountId, Credits, StationName, TicketId, Timestamp, TrainId, ValidationError};
use serde::Serialize;

use crate::error::BookingError;
use crate::ticket::Ticket;

// ── Sale Window ────────────────────────────────────────────────────────

/// Where a moment falls relative to a train's sale window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalePhase {
    /// Before `start`. Purchases are still accepted; only the end is
    /// enforced.
    BeforeStart,
    /// Seats can be bought and refunded.
    Open,
    /// Seats can be bought but no longer refunded.
    RefundCutoff,
    /// At or after `end`: sales are closed.
    Ended,
}

impl SalePhase {
    /// The canonical string name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BeforeStart => "BEFORE_START",
            Self::Open => "OPEN",
            Self::RefundCutoff => "REFUND_CUTOFF",
            Self::Ended => "ENDED",
        }
    }
}

impl std::fmt::Display for SalePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Absolute sale window of a train.
///
/// No ordering between `start` and `end` is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaleWindow {
    /// Sale window start.
    pub start: Timestamp,
    /// Sale window end; also the departure reference for refunds.
    pub end: Timestamp,
}

impl SaleWindow {
    /// Resolve minute offsets against the current clock reading.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ScheduleOverflow`] if either bound does
    /// not fit in a timestamp.
    pub fn from_offsets(
        now: Timestamp,
        start_offset_minutes: u64,
        end_offset_minutes: u64,
    ) -> Result<Self, ValidationError> {
        let resolve = |offset_minutes: u64| {
            now.checked_add_minutes(offset_minutes)
                .ok_or(ValidationError::ScheduleOverflow {
                    base_millis: now.as_millis(),
                    offset_minutes,
                })
        };
        Ok(Self {
            start: resolve(start_offset_minutes)?,
            end: resolve(end_offset_minutes)?,
        })
    }

    /// Whether the window starts after it ends.
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    /// Whether `now` lies strictly after the window, which is when a train
    /// may be closed.
    pub fn has_ended(&self, now: Timestamp) -> bool {
        now > self.end
    }

    /// Classify `now`.
    pub fn phase(&self, now: Timestamp, refund_cutoff_ms: u64) -> SalePhase {
        if now >= self.end {
            SalePhase::Ended
        } else if now >= self.end.saturating_sub_millis(refund_cutoff_ms) {
            SalePhase::RefundCutoff
        } else if now < self.start {
            SalePhase::BeforeStart
        } else {
            SalePhase::Open
        }
    }
}

// ── Seats and Escrow Journal ───────────────────────────────────────────

/// The buyer currently holding a seat, and the ticket that proves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeatAssignment {
    /// The buyer.
    pub holder: AccountId,
    /// The ticket issued for this sale.
    pub ticket_id: TicketId,
    /// What the buyer paid.
    pub paid: Credits,
    /// When the seat was sold.
    pub sold_at: Timestamp,
}

/// Kinds of escrow movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowEntryKind {
    /// A seat sale credited the full payment.
    Sale,
    /// A refund debited the fare.
    Refund,
    /// Closing swept the balance into the station treasury.
    Sweep,
}

/// One recorded escrow movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EscrowEntry {
    /// Movement type.
    pub kind: EscrowEntryKind,
    /// Amount moved.
    pub amount: Credits,
    /// The seat involved, if any.
    pub seat_no: Option<u32>,
    /// When it happened.
    pub at: Timestamp,
    /// Escrow balance after the movement.
    pub balance_after: Credits,
}

/// Lifecycle status of a train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainStatus {
    /// Accepting purchases and refunds.
    Open,
    /// Settled into the treasury. Terminal.
    Closed,
}

impl TrainStatus {
    /// Whether no further operations are allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// What closing a train moved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settlement {
    /// The closed train.
    pub train_id: TrainId,
    /// Escrow swept into the treasury.
    pub swept: Credits,
    /// Seats still sold at close time, force-released without refund.
    pub released_seats: Vec<u32>,
    /// Treasury balance after the sweep.
    pub treasury_after: Credits,
}

// ── Train ──────────────────────────────────────────────────────────────

/// One scheduled run.
#[derive(Debug, Clone, Serialize)]
pub struct Train {
    id: TrainId,
    origin: StationName,
    destination: StationName,
    seat_capacity: u32,
    price: Credits,
    window: SaleWindow,
    escrow: Credits,
    seats: BTreeMap<u32, SeatAssignment>,
    journal: Vec<EscrowEntry>,
    status: TrainStatus,
    created_at: Timestamp,
}

impl Train {
    /// Open a new train with no seats sold and empty escrow.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ZeroSeatCapacity`] if `seat_capacity` is 0.
    pub fn open(
        origin: StationName,
        destination: StationName,
        seat_capacity: u32,
        price: Credits,
        window: SaleWindow,
        now: Timestamp,
    ) -> Result<Self, ValidationError> {
        if seat_capacity == 0 {
            return Err(ValidationError::ZeroSeatCapacity);
        }
        Ok(Self {
            id: TrainId::new(),
            origin,
            destination,
            seat_capacity,
            price,
            window,
            escrow: Credits::ZERO,
            seats: BTreeMap::new(),
            journal: Vec::new(),
            status: TrainStatus::Open,
            created_at: now,
        })
    }

    /// Unique identifier; also the owner reference tickets are checked
    /// against.
    pub fn id(&self) -> TrainId {
        self.id
    }

    /// Route origin.
    pub fn origin(&self) -> &StationName {
        &self.origin
    }

    /// Route destination.
    pub fn destination(&self) -> &StationName {
        &self.destination
    }

    /// Highest seat number.
    pub fn seat_capacity(&self) -> u32 {
        self.seat_capacity
    }

    /// Fixed per-seat fare.
    pub fn price(&self) -> Credits {
        self.price
    }

    /// Absolute sale window.
    pub fn window(&self) -> SaleWindow {
        self.window
    }

    /// Value collected and not yet swept.
    pub fn escrow(&self) -> Credits {
        self.escrow
    }

    /// Current lifecycle status.
    pub fn status(&self) -> TrainStatus {
        self.status
    }

    /// When the train was created.
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Sold seat numbers in ascending order.
    pub fn sold_seats(&self) -> Vec<u32> {
        self.seats.keys().copied().collect()
    }

    /// Seat-to-buyer assignments for sold seats.
    pub fn seat_assignments(&self) -> &BTreeMap<u32, SeatAssignment> {
        &self.seats
    }

    /// Whether `seat_no` is currently sold.
    pub fn is_sold(&self, seat_no: u32) -> bool {
        self.seats.contains_key(&seat_no)
    }

    /// Escrow movements, oldest first.
    pub fn journal(&self) -> &[EscrowEntry] {
        &self.journal
    }

    fn ensure_open(&self) -> Result<(), BookingError> {
        if self.status.is_terminal() {
            return Err(BookingError::TrainNotFound(self.id));
        }
        Ok(())
    }

    /// Sell `seat_no` to `buyer`, crediting the full `payment` to escrow.
    ///
    /// Checks, in order: insufficient payment, sale closed, seat range,
    /// seat already sold.
    pub fn sell_seat(
        &mut self,
        buyer: AccountId,
        payment: Credits,
        seat_no: u32,
        now: Timestamp,
    ) -> Result<Ticket, BookingError> {
        self.ensure_open()?;
        if payment < self.price {
            return Err(BookingError::InsufficientPayment {
                train_id: self.id,
                offered: payment,
                price: self.price,
            });
        }
        if now >= self.window.end {
            return Err(BookingError::SaleClosed {
                train_id: self.id,
                sale_window_end: self.window.end,
                now,
            });
        }
        if seat_no == 0 || seat_no > self.seat_capacity {
            return Err(BookingError::InvalidSeat {
                train_id: self.id,
                seat_no,
                seat_capacity: self.seat_capacity,
            });
        }
        if self.seats.contains_key(&seat_no) {
            return Err(BookingError::SeatTaken {
                train_id: self.id,
                seat_no,
            });
        }
        let escrow = self
            .escrow
            .checked_add(payment)
            .ok_or(BookingError::ArithmeticOverflow {
                operation: "escrow credit",
            })?;

        let ticket = Ticket::issue(self.id, buyer.clone(), self.window.end, seat_no, payment, now);
        self.seats.insert(
            seat_no,
            SeatAssignment {
                holder: buyer,
                ticket_id: ticket.id(),
                paid: payment,
                sold_at: now,
            },
        );
        self.escrow = escrow;
        self.journal.push(EscrowEntry {
            kind: EscrowEntryKind::Sale,
            amount: payment,
            seat_no: Some(seat_no),
            at: now,
            balance_after: escrow,
        });
        Ok(ticket)
    }

    /// Release the ticket's seat and split exactly the fare out of escrow.
    ///
    /// Checks, in order: caller is the holder, refund deadline, ticket
    /// belongs to this train, ticket still holds its seat. The ticket is
    /// only borrowed; the caller destroys it on success.
    pub fn refund_seat(
        &mut self,
        ticket: &Ticket,
        caller: &AccountId,
        now: Timestamp,
        refund_cutoff_ms: u64,
    ) -> Result<Credits, BookingError> {
        ticket.check_refundable(caller, now, refund_cutoff_ms)?;
        if ticket.train_ref() != self.id {
            return Err(BookingError::TicketTrainMismatch {
                ticket_train: ticket.train_ref(),
                train_id: self.id,
            });
        }
        self.ensure_open()?;
        let seat_no = ticket.seat_no();
        let outstanding = self
            .seats
            .get(&seat_no)
            .is_some_and(|assignment| assignment.ticket_id == ticket.id());
        if !outstanding {
            return Err(BookingError::TicketNotOutstanding {
                ticket_id: ticket.id(),
                train_id: self.id,
                seat_no,
            });
        }
        let escrow = self
            .escrow
            .checked_sub(self.price)
            .ok_or(BookingError::ArithmeticOverflow {
                operation: "escrow refund",
            })?;

        self.seats.remove(&seat_no);
        self.escrow = escrow;
        self.journal.push(EscrowEntry {
            kind: EscrowEntryKind::Refund,
            amount: self.price,
            seat_no: Some(seat_no),
            at: now,
            balance_after: escrow,
        });
        Ok(self.price)
    }

    /// Check that the train may be closed at `now`.
    pub fn ensure_closable(&self, now: Timestamp) -> Result<(), BookingError> {
        self.ensure_open()?;
        if !self.window.has_ended(now) {
            return Err(BookingError::NotYetEnded {
                train_id: self.id,
                sale_window_end: self.window.end,
                now,
            });
        }
        Ok(())
    }

    /// Drain escrow, force-release every sold seat, and mark the train
    /// closed. Returns the swept amount and the released seats.
    ///
    /// Callers run [`ensure_closable`](Self::ensure_closable) and commit
    /// the treasury side first; this step cannot fail.
    pub(crate) fn settle(&mut self, now: Timestamp) -> (Credits, Vec<u32>) {
        let swept = self.escrow;
        let released = self.sold_seats();
        self.seats.clear();
        self.escrow = Credits::ZERO;
        self.journal.push(EscrowEntry {
            kind: EscrowEntryKind::Sweep,
            amount: swept,
            seat_no: None,
            at: now,
            balance_after: Credits::ZERO,
        });
        self.status = TrainStatus::Closed;
        (swept, released)
    }
}
