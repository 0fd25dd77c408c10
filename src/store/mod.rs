//! Store interfaces (spec §6)
//!
//! The core treats persistence as two opaque collaborators. Only an
//! in-memory reference implementation lives here; a production backend
//! would swap in a database-backed implementation of the same traits
//! without touching the pipeline above it.

mod memory;

pub use memory::{InMemoryDetectionStore, InMemoryTripStore};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{DetectionEvent, TripDocument};

/// Raw trip persistence. `put`/`get` are idempotent by `trip_id`.
#[async_trait]
pub trait TripStore: Send + Sync {
    async fn put(&self, trip_id: &str, doc: TripDocument) -> Result<()>;
    async fn get(&self, trip_id: &str) -> Result<Option<TripDocument>>;
}

/// Detection persistence. `replace_trip_detections` must be atomic with
/// respect to concurrent `scan_all` calls: a scan observes either the
/// old or the new set for a given trip, never a mixture.
#[async_trait]
pub trait DetectionStore: Send + Sync {
    async fn replace_trip_detections(&self, trip_id: &str, events: Vec<DetectionEvent>) -> Result<()>;
    async fn scan_all(&self) -> Result<Vec<DetectionEvent>>;
    async fn count(&self) -> Result<usize>;
}
