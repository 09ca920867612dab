//! # Booking Error Types
//!
//! Structured error hierarchy for the booking engine. Every variant carries
//! diagnostic context: the train, seat, amounts, or instants involved.
//!
//! All errors are synchronous and raised before any state is touched: an
//! operation that returns `Err` has changed nothing. Nothing is retried
//! internally; the substrate decides whether to resubmit.

use railbook_core::{
    AccountId, Credits, StationName, TicketId, Timestamp, TrainId, ValidationError,
};
use thiserror::Error;

use crate::ticket::Ticket;

/// Errors arising from booking operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Payment offered is below the train's fare.
    #[error("payment of {offered} is below the {price} fare for {train_id}")]
    InsufficientPayment {
        /// The train being booked.
        train_id: TrainId,
        /// What the buyer offered.
        offered: Credits,
        /// The train's fixed fare.
        price: Credits,
    },

    /// Purchase attempted at or after the end of the sale window.
    #[error("sales for {train_id} closed at {sale_window_end} (now {now})")]
    SaleClosed {
        /// The train being booked.
        train_id: TrainId,
        /// End of the sale window.
        sale_window_end: Timestamp,
        /// The clock reading of the attempt.
        now: Timestamp,
    },

    /// Seat number outside `1..=seat_capacity`.
    #[error("seat {seat_no} is outside 1..={seat_capacity} on {train_id}")]
    InvalidSeat {
        /// The train being booked.
        train_id: TrainId,
        /// The requested seat.
        seat_no: u32,
        /// The train's capacity.
        seat_capacity: u32,
    },

    /// Seat already sold.
    #[error("seat {seat_no} on {train_id} is already sold")]
    SeatTaken {
        /// The train being booked.
        train_id: TrainId,
        /// The contested seat.
        seat_no: u32,
    },

    /// Missing or foreign admin capability, or a refund requested by
    /// someone other than the ticket holder.
    #[error("unauthorized {operation}: {reason}")]
    Unauthorized {
        /// The operation that was refused.
        operation: &'static str,
        /// Why the caller was refused.
        reason: String,
    },

    /// Refund requested inside the pre-departure cutoff.
    #[error("refund window for seat {seat_no} on {train_id} closed at {refund_deadline} (now {now})")]
    RefundWindowClosed {
        /// The train the ticket was sold on.
        train_id: TrainId,
        /// The ticket's seat.
        seat_no: u32,
        /// Last instant (exclusive) at which a refund is accepted.
        refund_deadline: Timestamp,
        /// The clock reading of the attempt.
        now: Timestamp,
    },

    /// Ticket presented against a train it was not sold on.
    #[error("ticket belongs to {ticket_train}, not {train_id}")]
    TicketTrainMismatch {
        /// The train recorded on the ticket.
        ticket_train: TrainId,
        /// The train the refund was addressed to.
        train_id: TrainId,
    },

    /// Close attempted at or before the end of the sale window.
    #[error("{train_id} cannot close until after {sale_window_end} (now {now})")]
    NotYetEnded {
        /// The train being closed.
        train_id: TrainId,
        /// End of the sale window.
        sale_window_end: Timestamp,
        /// The clock reading of the attempt.
        now: Timestamp,
    },

    /// The route index disagrees with the set of open trains. This is a
    /// bug-report condition, never a user error.
    #[error("route index corrupted for {train_id} on {origin} -> {destination}: {detail}")]
    IndexCorruption {
        /// The train whose index entry is inconsistent.
        train_id: TrainId,
        /// Route origin.
        origin: StationName,
        /// Route destination.
        destination: StationName,
        /// What was inconsistent.
        detail: &'static str,
    },

    /// The train does not exist or has already been closed.
    #[error("{0} is not an open train")]
    TrainNotFound(TrainId),

    /// The ticket no longer matches the seat's current assignment: it was
    /// already refunded, or the seat has been resold since.
    #[error("{ticket_id} no longer holds seat {seat_no} on {train_id}")]
    TicketNotOutstanding {
        /// The presented ticket.
        ticket_id: TicketId,
        /// The train named on the ticket.
        train_id: TrainId,
        /// The seat named on the ticket.
        seat_no: u32,
    },

    /// Malformed train parameters.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Credit or time arithmetic overflowed.
    #[error("arithmetic overflow in {operation}")]
    ArithmeticOverflow {
        /// The computation that overflowed.
        operation: &'static str,
    },
}

impl BookingError {
    /// Whether this error indicates a broken internal invariant rather than
    /// a rejected request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::IndexCorruption { .. } | Self::ArithmeticOverflow { .. }
        )
    }

    /// Short machine-readable kind, stable across message wording changes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InsufficientPayment { .. } => "insufficient_payment",
            Self::SaleClosed { .. } => "sale_closed",
            Self::InvalidSeat { .. } => "invalid_seat",
            Self::SeatTaken { .. } => "seat_taken",
            Self::Unauthorized { .. } => "unauthorized",
            Self::RefundWindowClosed { .. } => "refund_window_closed",
            Self::TicketTrainMismatch { .. } => "ticket_train_mismatch",
            Self::NotYetEnded { .. } => "not_yet_ended",
            Self::IndexCorruption { .. } => "index_corruption",
            Self::TrainNotFound(_) => "train_not_found",
            Self::TicketNotOutstanding { .. } => "ticket_not_outstanding",
            Self::Validation(_) => "validation",
            Self::ArithmeticOverflow { .. } => "arithmetic_overflow",
        }
    }

    pub(crate) fn not_holder(caller: &AccountId, holder: &AccountId) -> Self {
        Self::Unauthorized {
            operation: "refund",
            reason: format!("{caller} is not the ticket holder {holder}"),
        }
    }
}

/// A refused refund. The ticket is handed back untouched so the holder
/// keeps their proof of purchase.
#[derive(Error, Debug)]
#[error("refund refused: {reason}")]
pub struct RefundRejected {
    /// The ticket that was presented.
    pub ticket: Ticket,
    /// Why the refund was refused.
    #[source]
    pub reason: BookingError,
}

impl RefundRejected {
    /// Split into the returned ticket and the refusal reason.
    pub fn into_parts(self) -> (Ticket, BookingError) {
        (self.ticket, self.reason)
    }
}

impl From<RefundRejected> for BookingError {
    fn from(rejected: RefundRejected) -> Self {
        rejected.reason
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seat_taken_display() {
        let train_id = TrainId::new();
        let err = BookingError::SeatTaken {
            train_id,
            seat_no: 7,
        };
        let msg = format!("{err}");
        assert!(msg.contains("seat 7"));
        assert!(msg.contains(&train_id.to_string()));
    }

    #[test]
    fn unauthorized_display_names_operation() {
        let err = BookingError::Unauthorized {
            operation: "close_train",
            reason: "capability minted by another deployment".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("close_train"));
        assert!(msg.contains("another deployment"));
    }

    #[test]
    fn index_corruption_is_internal() {
        let err = BookingError::IndexCorruption {
            train_id: TrainId::new(),
            origin: StationName::new("Lyon").unwrap(),
            destination: StationName::new("Nice").unwrap(),
            detail: "train missing from route",
        };
        assert!(err.is_internal());
        assert_eq!(err.kind(), "index_corruption");
        assert!(format!("{err}").contains("Lyon -> Nice"));
    }

    #[test]
    fn user_errors_are_not_internal() {
        let err = BookingError::TrainNotFound(TrainId::new());
        assert!(!err.is_internal());
        let err = BookingError::ArithmeticOverflow {
            operation: "escrow credit",
        };
        assert!(err.is_internal());
    }

    #[test]
    fn validation_errors_convert() {
        let err: BookingError = ValidationError::ZeroSeatCapacity.into();
        assert_eq!(err.kind(), "validation");
        assert!(format!("{err}").contains("at least 1"));
    }
}
