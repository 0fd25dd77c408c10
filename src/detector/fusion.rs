//! Sensor fusion without a shared clock (spec §4.2 step 1, §9 design notes)
//!
//! The mobile collector does not guarantee accel and GPS samples line up
//! with gyro samples index-for-index, so alignment is modeled as explicit
//! "last-known reading + staleness" state rather than positional zip.

use nalgebra::Vector3;

use crate::config::DetectorConfig;
use crate::model::{Position, Sample};

/// A gyro-paced row carrying the most recent accel/position reading that
/// is still fresh enough to trust.
#[derive(Debug, Clone, Copy)]
pub struct FusedRow {
    pub wall_time: chrono::DateTime<chrono::Utc>,
    pub uptime_ms: i64,
    pub gyro: Vector3<f64>,
    pub accel: Option<Vector3<f64>>,
    pub position: Option<Position>,
}

/// Align accel and position onto the gyro-paced sample sequence, holding
/// the most recent reading of each as long as it is within its own
/// staleness window of the current sample.
pub fn fuse(samples: &[Sample], config: &DetectorConfig) -> Vec<FusedRow> {
    let mut last_accel: Option<(i64, Vector3<f64>)> = None;
    let mut last_position: Option<(i64, Position)> = None;
    let position_window_ms = (config.max_position_age_s * 1000.0) as i64;

    samples
        .iter()
        .map(|sample| {
            if let Some(accel) = sample.accel {
                last_accel = Some((sample.uptime_ms, accel));
            }
            if let Some(position) = sample.position {
                last_position = Some((sample.uptime_ms, position));
            }

            let accel = last_accel
                .filter(|(t, _)| sample.uptime_ms - t <= config.fusion_window_ms)
                .map(|(_, v)| v);
            let position = last_position
                .filter(|(t, _)| sample.uptime_ms - t <= position_window_ms)
                .map(|(_, v)| v);

            FusedRow {
                wall_time: sample.wall_time,
                uptime_ms: sample.uptime_ms,
                gyro: sample.gyro,
                accel,
                position,
            }
        })
        .collect()
}

/// Approximate the device's "vertical" as the mean accel vector over the
/// whole trip (a stationary-baseline estimate of gravity's direction).
/// Returns `None` if no row carries accel, or if the resulting baseline
/// is too weak to trust as an orientation reference.
pub fn estimate_vertical_axis(rows: &[FusedRow], min_magnitude: f64) -> Option<Vector3<f64>> {
    let mut sum = Vector3::new(0.0, 0.0, 0.0);
    let mut count = 0usize;
    for row in rows {
        if let Some(accel) = row.accel {
            sum += accel;
            count += 1;
        }
    }
    if count == 0 {
        return None;
    }
    let mean = sum / count as f64;
    if mean.norm() < min_magnitude {
        return None;
    }
    Some(mean.normalize())
}
