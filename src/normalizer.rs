//! Sample Normalizer (spec §4.1)
//!
//! Converts one uploaded trip document into a validated, time-ordered
//! `Trip`. This is a one-pass filter over the document's own sample
//! order, not a sort: a sample is kept only if its `uptime_ms` exceeds
//! every prior kept sample's, which leaves the output non-decreasing in
//! `uptime_ms` without ever reordering anything.

use chrono::{DateTime, Duration, Utc};
use nalgebra::Vector3;

use crate::error::{CoreError, Result};
use crate::model::{Position, Sample, SampleDocument, Trip, TripDocument};

/// Maximum backward jump, in seconds, tolerated in `wall_time` before a
/// sample is dropped as a clock regression (spec §3 invariants).
const MAX_WALL_TIME_REGRESSION_S: i64 = 5;

/// Parse and validate one trip document into a normalized `Trip`.
pub fn normalize(doc: TripDocument, min_usable_samples: usize) -> Result<Trip> {
    if doc.user_id.trim().is_empty() {
        return Err(CoreError::InvalidTrip("user_id is missing or empty".into()));
    }
    if doc.trip_id.trim().is_empty() {
        return Err(CoreError::InvalidTrip("trip_id is missing or empty".into()));
    }
    if doc.samples.is_empty() {
        return Err(CoreError::InvalidTrip("samples array is empty".into()));
    }

    let mut samples = Vec::with_capacity(doc.samples.len());
    let mut max_uptime_ms: Option<i64> = None;
    let mut max_wall_time: Option<DateTime<Utc>> = None;

    for raw in &doc.samples {
        let Some(sample) = normalize_one(raw) else {
            continue;
        };

        if let Some(running_max) = max_uptime_ms {
            if sample.uptime_ms <= running_max {
                continue;
            }
        }

        if let Some(running_max) = max_wall_time {
            if running_max - sample.wall_time > Duration::seconds(MAX_WALL_TIME_REGRESSION_S) {
                continue;
            }
        }

        max_uptime_ms = Some(sample.uptime_ms);
        max_wall_time = Some(match max_wall_time {
            Some(prev) if prev > sample.wall_time => prev,
            _ => sample.wall_time,
        });
        samples.push(sample);
    }

    if samples.len() < min_usable_samples {
        return Err(CoreError::InvalidTrip(format!(
            "only {} usable samples, need at least {}",
            samples.len(),
            min_usable_samples
        )));
    }

    Ok(Trip {
        user_id: doc.user_id,
        trip_id: doc.trip_id,
        samples,
    })
}

/// Validate one wire sample. Returns `None` if the sample has no usable
/// gyro reading (the sample-level alignment beat the rest of the
/// pipeline depends on).
fn normalize_one(raw: &SampleDocument) -> Option<Sample> {
    let wall_time = raw.timestamp.to_datetime()?;
    let gyro = vec3_from_slice(raw.gyro.as_deref())?;
    let accel = raw.accel.as_deref().and_then(vec3_from_slice);
    let position = normalize_position(raw);

    Some(Sample {
        wall_time,
        uptime_ms: raw.uptime_ms,
        position,
        accel,
        gyro,
    })
}

fn vec3_from_slice(values: Option<&[f64]>) -> Option<Vector3<f64>> {
    match values {
        Some([x, y, z]) => Some(Vector3::new(*x, *y, *z)),
        _ => None,
    }
}

fn normalize_position(raw: &SampleDocument) -> Option<Position> {
    let latitude = raw.latitude?;
    let longitude = raw.longitude?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return None;
    }
    Some(Position {
        latitude,
        longitude,
        accuracy_m: raw.accuracy_m.unwrap_or(0.0).max(0.0),
        speed_mps: raw.speed_mps.unwrap_or(0.0).max(0.0),
    })
}
