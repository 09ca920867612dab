//! # Booking Engine
//!
//! The in-process ledger: owns every open train, the station ledger, the
//! admin verifier and the event bus, and exposes the booking operations
//! plus read-only queries.
//!
//! ## Locking
//!
//! Each train sits behind its own `Mutex` inside an arena map guarded by an
//! `RwLock`. Purchases and refunds on different trains never contend; the
//! arena lock is held only long enough to clone the train's handle.
//!
//! Locks are always taken in the order train, then station ledger, then
//! arena. Nothing acquires a train lock while holding the station or arena
//! lock, so the order cannot invert.
//!
//! A closed train is marked terminal under its own lock before it leaves
//! the arena, so a purchase that fetched the handle just before the close
//! fails with [`BookingError::TrainNotFound`] once it gets the lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use railbook_core::{
    AccountId, Clock, Credits, DeploymentId, StationName, SystemClock, Timestamp, TrainId,
    ValidationError,
};
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::capability::{AdminCapability, CapabilityAuthority};
use crate::config::{ConfigError, LedgerConfig};
use crate::error::{BookingError, RefundRejected};
use crate::events::{EventBus, LedgerEvent};
use crate::query::{RouteEntry, TrainSummary};
use crate::station::StationLedger;
use crate::ticket::Ticket;
use crate::train::{EscrowEntry, SaleWindow, SeatAssignment, Settlement, Train};

/// Parameters for [`BookingEngine::create_train`].
///
/// Offsets are whole minutes from the clock reading at creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NewTrain {
    /// Route origin.
    pub origin: StationName,
    /// Route destination.
    pub destination: StationName,
    /// Seats offered, numbered `1..=seat_capacity`.
    pub seat_capacity: u32,
    /// Per-seat fare.
    pub price: Credits,
    /// Minutes from now until sales open.
    pub start_offset_minutes: u64,
    /// Minutes from now until sales end.
    pub end_offset_minutes: u64,
}

/// The booking and settlement ledger for one deployment.
pub struct BookingEngine {
    config: LedgerConfig,
    authority: CapabilityAuthority,
    clock: Arc<dyn Clock>,
    trains: RwLock<HashMap<TrainId, Arc<Mutex<Train>>>>,
    station: Mutex<StationLedger>,
    events: EventBus,
}

impl std::fmt::Debug for BookingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingEngine")
            .field("deployment", &self.authority.deployment())
            .field("config", &self.config)
            .field("open_trains", &self.trains.read().len())
            .finish_non_exhaustive()
    }
}

impl BookingEngine {
    /// Initialize a deployment on the system clock. Returns the engine and
    /// the deployment's only admin capability.
    pub fn init(config: LedgerConfig) -> Result<(Self, AdminCapability), ConfigError> {
        Self::init_with_clock(config, Arc::new(SystemClock))
    }

    /// Initialize a deployment on an explicit clock.
    pub fn init_with_clock(
        config: LedgerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<(Self, AdminCapability), ConfigError> {
        config.validate()?;
        let (authority, capability) = CapabilityAuthority::mint();
        let events = EventBus::new(config.event_capacity);
        tracing::info!(
            deployment = %authority.deployment(),
            refund_cutoff_ms = config.refund_cutoff_ms,
            "booking engine initialized"
        );
        let engine = Self {
            config,
            authority,
            clock,
            trains: RwLock::new(HashMap::new()),
            station: Mutex::new(StationLedger::new()),
            events,
        };
        Ok((engine, capability))
    }

    /// Initialize with the default configuration on the system clock.
    pub fn with_defaults() -> (Self, AdminCapability) {
        let (authority, capability) = CapabilityAuthority::mint();
        let config = LedgerConfig::default();
        let events = EventBus::new(config.event_capacity);
        let engine = Self {
            config,
            authority,
            clock: Arc::new(SystemClock),
            trains: RwLock::new(HashMap::new()),
            station: Mutex::new(StationLedger::new()),
            events,
        };
        (engine, capability)
    }

    /// The deployment this engine belongs to.
    pub fn deployment(&self) -> DeploymentId {
        self.authority.deployment()
    }

    /// Active configuration.
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Current clock reading.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Subscribe to lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    fn train_handle(&self, train_id: TrainId) -> Result<Arc<Mutex<Train>>, BookingError> {
        self.trains
            .read()
            .get(&train_id)
            .cloned()
            .ok_or(BookingError::TrainNotFound(train_id))
    }

    // ── Operations ─────────────────────────────────────────────────────

    /// Open a new train and index it under its route.
    pub fn create_train(
        &self,
        admin: &AdminCapability,
        params: NewTrain,
    ) -> Result<TrainId, BookingError> {
        self.authority.verify(admin, "create_train")?;
        if params.seat_capacity > self.config.max_seat_capacity {
            return Err(ValidationError::SeatCapacityTooLarge {
                requested: params.seat_capacity,
                maximum: self.config.max_seat_capacity,
            }
            .into());
        }
        let now = self.clock.now();
        let window = SaleWindow::from_offsets(
            now,
            params.start_offset_minutes,
            params.end_offset_minutes,
        )?;
        if window.is_inverted() {
            tracing::warn!(
                origin = %params.origin,
                destination = %params.destination,
                start = %window.start,
                end = %window.end,
                "sale window starts after it ends"
            );
        }
        let train = Train::open(
            params.origin,
            params.destination,
            params.seat_capacity,
            params.price,
            window,
            now,
        )?;
        let train_id = train.id();
        let event = LedgerEvent::TrainCreated {
            train_id,
            origin: train.origin().clone(),
            destination: train.destination().clone(),
            seat_capacity: train.seat_capacity(),
            price: train.price(),
            sale_window_start: window.start,
            sale_window_end: window.end,
            at: now,
        };

        {
            let mut station = self.station.lock();
            station.register_train(&train)?;
            self.trains
                .write()
                .insert(train_id, Arc::new(Mutex::new(train)));
        }

        tracing::info!(%train_id, at = %now, "train created");
        self.events.publish(event);
        Ok(train_id)
    }

    /// Buy `seat_no` on a train for `payment`.
    pub fn buy(
        &self,
        train_id: TrainId,
        buyer: AccountId,
        payment: Credits,
        seat_no: u32,
    ) -> Result<Ticket, BookingError> {
        let handle = self.train_handle(train_id)?;
        let mut train = handle.lock();
        let now = self.clock.now();
        let ticket = train.sell_seat(buyer, payment, seat_no, now)?;
        drop(train);

        tracing::debug!(%train_id, seat_no, holder = %ticket.holder(), "seat sold");
        self.events.publish(LedgerEvent::TicketIssued {
            train_id,
            ticket_id: ticket.id(),
            holder: ticket.holder().clone(),
            seat_no,
            paid: ticket.paid(),
            at: now,
        });
        Ok(ticket)
    }

    /// Refund a ticket. On success the ticket is consumed and the fare is
    /// returned; on refusal the ticket comes back inside the error.
    pub fn refund(
        &self,
        train_id: TrainId,
        ticket: Ticket,
        caller: &AccountId,
    ) -> Result<Credits, RefundRejected> {
        match self.try_refund(train_id, &ticket, caller) {
            Ok((refunded, now)) => {
                tracing::debug!(%train_id, seat_no = ticket.seat_no(), %refunded, "ticket refunded");
                self.events.publish(LedgerEvent::TicketRefunded {
                    train_id,
                    ticket_id: ticket.id(),
                    holder: ticket.holder().clone(),
                    seat_no: ticket.seat_no(),
                    refunded,
                    at: now,
                });
                Ok(refunded)
            }
            Err(reason) => Err(RefundRejected { ticket, reason }),
        }
    }

    fn try_refund(
        &self,
        train_id: TrainId,
        ticket: &Ticket,
        caller: &AccountId,
    ) -> Result<(Credits, Timestamp), BookingError> {
        let cutoff = self.config.refund_cutoff_ms;
        ticket.check_refundable(caller, self.clock.now(), cutoff)?;
        if ticket.train_ref() != train_id {
            return Err(BookingError::TicketTrainMismatch {
                ticket_train: ticket.train_ref(),
                train_id,
            });
        }
        let handle = self.train_handle(train_id)?;
        let mut train = handle.lock();
        let now = self.clock.now();
        let refunded = train.refund_seat(ticket, caller, now, cutoff)?;
        Ok((refunded, now))
    }

    /// Settle a train whose sale window has passed: sweep escrow into the
    /// treasury, drop it from the route index and destroy it.
    pub fn close_train(
        &self,
        admin: &AdminCapability,
        train_id: TrainId,
    ) -> Result<Settlement, BookingError> {
        self.authority.verify(admin, "close_train")?;
        let handle = self.train_handle(train_id)?;
        let mut train = handle.lock();
        let now = self.clock.now();
        train.ensure_closable(now)?;

        let treasury_after = {
            let mut station = self.station.lock();
            let treasury_after = station.settle_train(&train)?;
            self.trains.write().remove(&train_id);
            treasury_after
        };
        let (swept, released_seats) = train.settle(now);
        drop(train);

        if !released_seats.is_empty() {
            tracing::warn!(
                %train_id,
                released = released_seats.len(),
                "closing train with unrefunded seats"
            );
        }
        tracing::info!(%train_id, %swept, treasury = %treasury_after, "train closed");
        self.events.publish(LedgerEvent::TrainClosed {
            train_id,
            swept,
            released_seats: released_seats.clone(),
            at: now,
        });
        Ok(Settlement {
            train_id,
            swept,
            released_seats,
            treasury_after,
        })
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Snapshot of one open train.
    pub fn train_summary(&self, train_id: TrainId) -> Result<TrainSummary, BookingError> {
        let handle = self.train_handle(train_id)?;
        let train = handle.lock();
        Ok(TrainSummary::of(
            &train,
            self.clock.now(),
            self.config.refund_cutoff_ms,
        ))
    }

    /// Sold seat numbers of an open train, ascending.
    pub fn seats(&self, train_id: TrainId) -> Result<Vec<u32>, BookingError> {
        Ok(self.train_handle(train_id)?.lock().sold_seats())
    }

    /// Capacity of an open train.
    pub fn seat_capacity(&self, train_id: TrainId) -> Result<u32, BookingError> {
        Ok(self.train_handle(train_id)?.lock().seat_capacity())
    }

    /// Who holds `seat_no`, if it is sold.
    pub fn seat_holder(
        &self,
        train_id: TrainId,
        seat_no: u32,
    ) -> Result<Option<SeatAssignment>, BookingError> {
        Ok(self
            .train_handle(train_id)?
            .lock()
            .seat_assignments()
            .get(&seat_no)
            .cloned())
    }

    /// Escrow movements of an open train, oldest first.
    pub fn train_journal(&self, train_id: TrainId) -> Result<Vec<EscrowEntry>, BookingError> {
        Ok(self.train_handle(train_id)?.lock().journal().to_vec())
    }

    /// Open trains on a route, in creation order.
    pub fn routes(&self, origin: &StationName, destination: &StationName) -> Vec<TrainId> {
        self.station.lock().routes().lookup(origin, destination)
    }

    /// Every known route, sorted by station names. Routes whose trains
    /// have all closed are listed with no trains.
    pub fn route_table(&self) -> Vec<RouteEntry> {
        self.station
            .lock()
            .routes()
            .entries()
            .map(|(origin, destination, trains)| RouteEntry {
                origin: origin.clone(),
                destination: destination.clone(),
                trains: trains.to_vec(),
            })
            .collect()
    }

    /// Accumulated swept escrow.
    pub fn treasury(&self) -> Credits {
        self.station.lock().treasury()
    }

    /// Snapshots of every open train, sorted by id.
    pub fn open_trains(&self) -> Vec<TrainSummary> {
        let handles: Vec<Arc<Mutex<Train>>> = self.trains.read().values().cloned().collect();
        let now = self.clock.now();
        let mut summaries: Vec<TrainSummary> = handles
            .iter()
            .map(|handle| TrainSummary::of(&handle.lock(), now, self.config.refund_cutoff_ms))
            .filter(|summary| !summary.status.is_terminal())
            .collect();
        summaries.sort_by_key(|summary| summary.train_id);
        summaries
    }
}
