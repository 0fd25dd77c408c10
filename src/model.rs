//! Core data model
//!
//! Wire-shaped types (`TripDocument`, `SampleDocument`) mirror the JSON a
//! mobile collector uploads; the rest (`Sample`, `Trip`, `DetectionEvent`,
//! `ClusterSummary`) are the pipeline's internal, validated forms.

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// A trip document as uploaded by the mobile collector (spec §6).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TripDocument {
    pub user_id: String,
    pub trip_id: String,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub sample_count: Option<i64>,
    pub samples: Vec<SampleDocument>,
}

/// A single wire-format sample. Timestamps may arrive as ISO-8601 strings
/// or millisecond integers; either is accepted.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SampleDocument {
    pub timestamp: TimestampValue,
    pub uptime_ms: i64,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub accuracy_m: Option<f64>,
    #[serde(default)]
    pub speed_mps: Option<f64>,
    #[serde(default)]
    pub accel: Option<Vec<f64>>,
    pub gyro: Option<Vec<f64>>,
}

/// A timestamp expressed either as milliseconds-since-epoch or an
/// ISO-8601 string.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TimestampValue {
    Millis(i64),
    Iso(String),
}

impl TimestampValue {
    /// Parse into a UTC instant. Returns `None` for an unparseable string.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            TimestampValue::Millis(ms) => DateTime::from_timestamp_millis(*ms),
            TimestampValue::Iso(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok(),
        }
    }
}

/// A validated GPS fix attached to a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: f64,
    pub speed_mps: f64,
}

/// One time-ordered, validated sensor reading produced by the normalizer.
#[derive(Debug, Clone)]
pub struct Sample {
    pub wall_time: DateTime<Utc>,
    pub uptime_ms: i64,
    pub position: Option<Position>,
    pub accel: Option<Vector3<f64>>,
    pub gyro: Vector3<f64>,
}

/// An ordered, validated sequence of samples for one recording session.
#[derive(Debug, Clone)]
pub struct Trip {
    pub user_id: String,
    pub trip_id: String,
    pub samples: Vec<Sample>,
}

/// A confirmed bump, located in space and time (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectionEvent {
    pub trip_id: String,
    pub user_id: String,
    pub wall_time: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    pub intensity: f64,
    pub stability: f64,
    pub speed_mps: f64,
}

/// Raw per-cluster aggregates produced by the spatial aggregator, before
/// the scorer derives confidence/priority/likelihood from them.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterStats {
    pub cluster_id: String,
    pub centroid_lat: f64,
    pub centroid_lon: f64,
    pub hits: usize,
    pub users: usize,
    pub last_seen: DateTime<Utc>,
    pub avg_intensity: f64,
    pub avg_stability: f64,
}

/// Categorical summary of a cluster's confidence band (spec §4.4).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Likelihood {
    VeryLikely,
    Likely,
    Uncertain,
}

/// A spatially-coincident group of detections, recomputed on demand
/// (spec §3 — clusters are derived, never stored as authoritative state).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClusterSummary {
    pub cluster_id: String,
    pub centroid_lat: f64,
    pub centroid_lon: f64,
    pub hits: usize,
    pub users: usize,
    pub last_seen: DateTime<Utc>,
    pub avg_intensity: f64,
    pub avg_stability: f64,
    pub confidence: f64,
    pub priority: f64,
    pub likelihood: Likelihood,
}
