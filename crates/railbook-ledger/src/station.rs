//! # Station Ledger
//!
//! The deployment-wide singleton: the treasury that receives swept escrow
//! and the route index mapping `origin -> destination -> [TrainId]` over
//! every open train.
//!
//! Route lists keep insertion order. A bucket that empties when its last
//! train closes stays in the index, so a route once served keeps reporting
//! an empty list rather than disappearing.

use std::collections::BTreeMap;

use railbook_core::{Credits, StationName, TrainId};
use serde::Serialize;

use crate::error::BookingError;
use crate::train::Train;

/// Open trains grouped by origin, then destination.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct RouteIndex {
    routes: BTreeMap<StationName, BTreeMap<StationName, Vec<TrainId>>>,
}

impl RouteIndex {
    /// Append a train to its route, creating the buckets if needed.
    pub fn register(
        &mut self,
        origin: &StationName,
        destination: &StationName,
        train_id: TrainId,
    ) -> Result<(), BookingError> {
        let bucket = self
            .routes
            .entry(origin.clone())
            .or_default()
            .entry(destination.clone())
            .or_default();
        if bucket.contains(&train_id) {
            return Err(BookingError::IndexCorruption {
                train_id,
                origin: origin.clone(),
                destination: destination.clone(),
                detail: "train already registered on route",
            });
        }
        bucket.push(train_id);
        Ok(())
    }

    /// Position of a train within its route list.
    pub fn position(
        &self,
        origin: &StationName,
        destination: &StationName,
        train_id: TrainId,
    ) -> Option<usize> {
        self.routes
            .get(origin)
            .and_then(|dests| dests.get(destination))
            .and_then(|bucket| bucket.iter().position(|id| *id == train_id))
    }

    /// Remove the entry at `position` on a route, preserving the order of
    /// the rest.
    fn remove_at(&mut self, origin: &StationName, destination: &StationName, position: usize) {
        if let Some(bucket) = self
            .routes
            .get_mut(origin)
            .and_then(|dests| dests.get_mut(destination))
        {
            if position < bucket.len() {
                bucket.remove(position);
            }
        }
    }

    /// Trains on a route, in creation order. Unknown routes are empty.
    pub fn lookup(&self, origin: &StationName, destination: &StationName) -> Vec<TrainId> {
        self.routes
            .get(origin)
            .and_then(|dests| dests.get(destination))
            .cloned()
            .unwrap_or_default()
    }

    /// Every known route as `(origin, destination, trains)`, sorted by
    /// station names.
    pub fn entries(&self) -> impl Iterator<Item = (&StationName, &StationName, &[TrainId])> + '_ {
        self.routes.iter().flat_map(|(origin, dests)| {
            dests
                .iter()
                .map(move |(destination, trains)| (origin, destination, trains.as_slice()))
        })
    }

    /// Total number of indexed trains.
    pub fn len(&self) -> usize {
        self.entries().map(|(_, _, trains)| trains.len()).sum()
    }

    /// Whether no train is indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Treasury plus route index.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StationLedger {
    treasury: Credits,
    routes: RouteIndex,
}

impl StationLedger {
    /// An empty ledger: zero treasury, no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated swept escrow.
    pub fn treasury(&self) -> Credits {
        self.treasury
    }

    /// The route index.
    pub fn routes(&self) -> &RouteIndex {
        &self.routes
    }

    /// Index a newly opened train under its route.
    pub fn register_train(&mut self, train: &Train) -> Result<(), BookingError> {
        self.routes
            .register(train.origin(), train.destination(), train.id())
    }

    /// Sweep a closing train's escrow into the treasury and drop it from
    /// the route index. Both checks run before either side changes.
    pub fn settle_train(&mut self, train: &Train) -> Result<Credits, BookingError> {
        let position = self
            .routes
            .position(train.origin(), train.destination(), train.id())
            .ok_or_else(|| {
                tracing::error!(
                    train_id = %train.id(),
                    origin = %train.origin(),
                    destination = %train.destination(),
                    "open train missing from route index"
                );
                BookingError::IndexCorruption {
                    train_id: train.id(),
                    origin: train.origin().clone(),
                    destination: train.destination().clone(),
                    detail: "train missing from route",
                }
            })?;
        let treasury = self
            .treasury
            .checked_add(train.escrow())
            .ok_or(BookingError::ArithmeticOverflow {
                operation: "treasury sweep",
            })?;

        self.routes
            .remove_at(train.origin(), train.destination(), position);
        self.treasury = treasury;
        Ok(treasury)
    }
}
