//! Pothole detection-and-clustering core.
//!
//! Converts raw phone sensor trips into a ranked, deduplicated map of
//! probable road defects. Four components compose the pipeline, leaves
//! first: the sample normalizer, the per-trip detector, the cross-trip
//! cluster aggregator, and the confidence/priority scorer. Trip and
//! detection persistence are modeled as the [`store::TripStore`] and
//! [`store::DetectionStore`] traits; everything else here is a pure
//! function of its inputs.

pub mod aggregator;
pub mod config;
pub mod detector;
pub mod error;
pub mod ingest;
pub mod model;
pub mod normalizer;
pub mod query;
pub mod scorer;
pub mod store;

pub use config::Config;
pub use error::{CoreError, Result};
pub use ingest::{ingest, IngestResult};
pub use model::{ClusterSummary, DetectionEvent, Likelihood, Trip, TripDocument};
pub use query::{query_clusters, query_detections, ClusterQuery, DetectionQuery};
