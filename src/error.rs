//! Core error types
//!
//! Exhaustive error kinds for the detection-and-clustering pipeline.
//! Normalizer/Detector failures are local to one trip; Aggregator/Scorer
//! failures only ever reject a query outright — there is no partial
//! success anywhere in this crate.

use thiserror::Error;

/// Errors surfaced by the pipeline's three exposed operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed trip document: missing ids, empty samples, or fewer than
    /// 50 usable (gyro-bearing) samples.
    #[error("invalid trip: {0}")]
    InvalidTrip(String),

    /// The detector exceeded its per-trip processing budget.
    #[error("processing timed out after {0:?}")]
    ProcessingTimeout(std::time::Duration),

    /// Trip or detection store I/O failed; caller should retry.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A query filter was unrecognized or out of its valid range.
    #[error("invalid query: {0}")]
    InvalidQuery(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
