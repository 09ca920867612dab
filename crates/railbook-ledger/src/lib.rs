//! # railbook-ledger: Train Ticket Booking and Settlement
//!
//! An in-process ledger for a single fungible credit unit. An administrator
//! schedules trains between named stations; buyers purchase numbered seats
//! with payment held in per-train escrow; ticket holders may refund up to
//! one hour (configurable) before the sale window ends; once the window has
//! passed the administrator settles the train, sweeping its escrow into the
//! station treasury.
//!
//! ## Modules
//!
//! - [`capability`]: the once-minted admin credential and its verifier.
//! - [`train`]: seat allocation, escrow and its journal, the sale window.
//! - [`ticket`]: the transferable-by-move proof of purchase.
//! - [`station`]: treasury and route index.
//! - [`engine`]: [`BookingEngine`], the lock-per-train operation surface.
//! - [`events`]: lifecycle events on a broadcast channel.
//! - [`config`]: YAML configuration with environment overrides.
//!
//! ## Example
//!
//! ```
//! use railbook_core::{AccountId, Credits, StationName};
//! use railbook_ledger::{BookingEngine, NewTrain};
//!
//! let (engine, admin) = BookingEngine::with_defaults();
//! let train = engine
//!     .create_train(
//!         &admin,
//!         NewTrain {
//!             origin: StationName::new("Vienna").unwrap(),
//!             destination: StationName::new("Graz").unwrap(),
//!             seat_capacity: 40,
//!             price: Credits::new(25),
//!             start_offset_minutes: 0,
//!             end_offset_minutes: 240,
//!         },
//!     )
//!     .unwrap();
//!
//! let buyer = AccountId::new("anna").unwrap();
//! let ticket = engine.buy(train, buyer.clone(), Credits::new(25), 12).unwrap();
//! assert_eq!(engine.refund(train, ticket, &buyer).unwrap(), Credits::new(25));
//! ```

pub mod capability;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod query;
pub mod station;
pub mod ticket;
pub mod train;

pub use capability::AdminCapability;
pub use config::{ConfigError, LedgerConfig};
pub use engine::{BookingEngine, NewTrain};
pub use error::{BookingError, RefundRejected};
pub use events::{EventBus, LedgerEvent};
pub use query::{RouteEntry, TrainSummary};
pub use station::{RouteIndex, StationLedger};
pub use ticket::Ticket;
pub use train::{
    EscrowEntry, EscrowEntryKind, SaleWindow, SalePhase, SeatAssignment, Settlement, Train,
    TrainStatus,
};
