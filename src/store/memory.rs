//! In-memory reference implementations of the store traits.
//!
//! Used by the demo binary and the test suite. A single `RwLock` per
//! store gives `replace_trip_detections` the atomicity the trait
//! contract requires: a concurrent `scan_all` sees the map before or
//! after the swap, never mid-write.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{DetectionStore, TripStore};
use crate::error::{CoreError, Result};
use crate::model::{DetectionEvent, TripDocument};

#[derive(Default)]
pub struct InMemoryTripStore {
    trips: RwLock<HashMap<String, TripDocument>>,
}

impl InMemoryTripStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TripStore for InMemoryTripStore {
    async fn put(&self, trip_id: &str, doc: TripDocument) -> Result<()> {
        let mut trips = self
            .trips
            .write()
            .map_err(|_| CoreError::StoreUnavailable("trip store lock poisoned".into()))?;
        trips.insert(trip_id.to_string(), doc);
        Ok(())
    }

    async fn get(&self, trip_id: &str) -> Result<Option<TripDocument>> {
        let trips = self
            .trips
            .read()
            .map_err(|_| CoreError::StoreUnavailable("trip store lock poisoned".into()))?;
        Ok(trips.get(trip_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryDetectionStore {
    by_trip: RwLock<HashMap<String, Vec<DetectionEvent>>>,
}

impl InMemoryDetectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DetectionStore for InMemoryDetectionStore {
    async fn replace_trip_detections(&self, trip_id: &str, events: Vec<DetectionEvent>) -> Result<()> {
        let mut by_trip = self
            .by_trip
            .write()
            .map_err(|_| CoreError::StoreUnavailable("detection store lock poisoned".into()))?;
        by_trip.insert(trip_id.to_string(), events);
        Ok(())
    }

    async fn scan_all(&self) -> Result<Vec<DetectionEvent>> {
        let by_trip = self
            .by_trip
            .read()
            .map_err(|_| CoreError::StoreUnavailable("detection store lock poisoned".into()))?;
        Ok(by_trip.values().flatten().cloned().collect())
    }

    async fn count(&self) -> Result<usize> {
        let by_trip = self
            .by_trip
            .read()
            .map_err(|_| CoreError::StoreUnavailable("detection store lock poisoned".into()))?;
        Ok(by_trip.values().map(|v| v.len()).sum())
    }
}
