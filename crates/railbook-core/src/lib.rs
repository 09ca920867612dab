#![deny(missing_docs)]

//! # railbook-core: Foundational Types for Railbook
//!
//! This crate defines the types that the booking ledger and its tooling
//! share. It has no internal crate dependencies, only `serde`, `thiserror`,
//! `chrono`, and `uuid` from the external ecosystem.
//!
//! ## Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** Every identifier is a distinct
//!    type. You cannot pass a [`TicketId`] where a [`TrainId`] is expected, or
//!    a [`StationName`] where an [`AccountId`] is expected.
//!
//! 2. **Integer money.** [`Credits`] wraps a `u64` count of the single
//!    fungible unit. All arithmetic is checked; overflow surfaces as `None`
//!    and the caller decides which error to raise.
//!
//! 3. **Millisecond clock.** [`Timestamp`] is milliseconds since the Unix
//!    epoch, matching the resolution the ledger's time gates are defined in.
//!    The [`Clock`] trait is the seam to whatever substrate authenticates
//!    the current time.
//!
//! 4. **[`ValidationError`] hierarchy.** Structured errors with `thiserror`,
//!    no `.unwrap()` outside tests.

pub mod clock;
pub mod error;
pub mod identity;
pub mod money;
pub mod temporal;

// Re-export primary types at crate root for ergonomic imports.
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::ValidationError;
pub use identity::{AccountId, DeploymentId, StationName, TicketId, TrainId};
pub use money::Credits;
pub use temporal::{Timestamp, MILLIS_PER_HOUR, MILLIS_PER_MINUTE};
