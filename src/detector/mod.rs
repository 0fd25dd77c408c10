//! Per-Trip Detector (spec §4.2)
//!
//! Turns one normalized trip into a set of debounced bump detections.
//! The algorithm is a pipeline of small, independently testable stages:
//! sensor fusion (this module's `fusion` submodule), a trailing robust
//! z-score over the fused vertical-acceleration series (`stats`), and a
//! candidate/debounce pass over the result (below).

mod fusion;
mod stats;

use std::collections::VecDeque;

use crate::config::DetectorConfig;
use crate::model::{DetectionEvent, Trip};

/// One sample that cleared the z-score/speed/stability/position gates,
/// before debouncing collapses nearby candidates into a single event.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    uptime_ms: i64,
    wall_time: chrono::DateTime<chrono::Utc>,
    latitude: f64,
    longitude: f64,
    intensity: f64,
    stability: f64,
    speed_mps: f64,
}

/// Run the full detector over one normalized trip. Never errors: a trip
/// that yields zero detections is a valid outcome (spec §4.2 failure
/// semantics).
pub fn detect(trip: &Trip, config: &DetectorConfig) -> Vec<DetectionEvent> {
    let fused = fusion::fuse(&trip.samples, config);

    let Some(unit_gravity) = fusion::estimate_vertical_axis(&fused, config.min_gravity_magnitude)
    else {
        return Vec::new();
    };

    let raw_vertical: Vec<Option<f64>> = fused
        .iter()
        .map(|row| row.accel.map(|a| a.dot(&unit_gravity)))
        .collect();
    let mean_vertical = stats::mean(raw_vertical.iter().filter_map(|v| *v));

    let candidates = find_candidates(&fused, &raw_vertical, mean_vertical, config);
    debounce(&candidates, config.debounce_s)
        .into_iter()
        .map(|c| DetectionEvent {
            trip_id: trip.trip_id.clone(),
            user_id: trip.user_id.clone(),
            wall_time: c.wall_time,
            latitude: c.latitude,
            longitude: c.longitude,
            intensity: c.intensity,
            stability: c.stability,
            speed_mps: c.speed_mps,
        })
        .collect()
}

fn find_candidates(
    fused: &[fusion::FusedRow],
    raw_vertical: &[Option<f64>],
    mean_vertical: f64,
    config: &DetectorConfig,
) -> Vec<Candidate> {
    let jitter_window_ms = (config.jitter_window_s * 1000.0) as i64;
    let mad_window_ms = (config.mad_window_s * 1000.0) as i64;

    let mut jitter_window: VecDeque<(i64, f64)> = VecDeque::new();
    let mut vertical_window: VecDeque<(i64, f64)> = VecDeque::new();
    let mut candidates = Vec::new();

    for (row, raw) in fused.iter().zip(raw_vertical.iter()) {
        jitter_window.push_back((row.uptime_ms, row.gyro.norm()));
        while let Some(&(t0, _)) = jitter_window.front() {
            if row.uptime_ms - t0 > jitter_window_ms {
                jitter_window.pop_front();
            } else {
                break;
            }
        }
        let jitter = stats::mean(jitter_window.iter().map(|&(_, v)| v));
        let stability = (-config.stability_k * jitter).exp().clamp(0.0, 1.0);

        let Some(raw_v) = raw else { continue };
        let vertical = raw_v - mean_vertical;

        vertical_window.push_back((row.uptime_ms, vertical));
        while let Some(&(t0, _)) = vertical_window.front() {
            if row.uptime_ms - t0 > mad_window_ms {
                vertical_window.pop_front();
            } else {
                break;
            }
        }

        if vertical_window.len() < config.min_window_samples {
            continue;
        }

        let values: Vec<f64> = vertical_window.iter().map(|&(_, v)| v).collect();
        let median = stats::median(&values);
        let mad = stats::median_absolute_deviation(&values, median);
        let z = (vertical - median).abs() / (1.4826 * mad + config.mad_epsilon);

        if z < config.z_threshold {
            continue;
        }
        if stability < config.min_stability {
            continue;
        }
        let Some(position) = row.position else { continue };
        if position.speed_mps < config.min_speed_mps {
            continue;
        }
        if position.accuracy_m > config.max_accuracy_m {
            continue;
        }

        candidates.push(Candidate {
            uptime_ms: row.uptime_ms,
            wall_time: row.wall_time,
            latitude: position.latitude,
            longitude: position.longitude,
            intensity: z,
            stability,
            speed_mps: position.speed_mps,
        });
    }

    candidates
}

/// Collapse candidates into debounced events: anchor a window at the
/// first not-yet-consumed candidate, absorb every later candidate within
/// `debounce_s` of that anchor, and emit the one with the largest
/// intensity in the window. Scanning then resumes strictly after
/// `debounce_s` past the *emitted* candidate's own timestamp, not past
/// the window's anchor — otherwise a candidate just beyond the anchor
/// window but still within `debounce_s` of the emitted (later-in-window)
/// candidate would escape suppression.
fn debounce(candidates: &[Candidate], debounce_s: f64) -> Vec<Candidate> {
    let debounce_ms = (debounce_s * 1000.0) as i64;
    let mut emitted = Vec::new();
    let mut i = 0;
    while i < candidates.len() {
        let window_start = candidates[i].uptime_ms;
        let mut best = i;
        let mut j = i;
        while j < candidates.len() && candidates[j].uptime_ms - window_start <= debounce_ms {
            if candidates[j].intensity > candidates[best].intensity {
                best = j;
            }
            j += 1;
        }
        let best_uptime_ms = candidates[best].uptime_ms;
        emitted.push(candidates[best]);

        i = j;
        while i < candidates.len() && candidates[i].uptime_ms - best_uptime_ms <= debounce_ms {
            i += 1;
        }
    }
    emitted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Position, Sample};
    use chrono::{TimeZone, Utc};
    use nalgebra::Vector3;

    /// Small deterministic jitter standing in for `N(0, 0.05)` sensor
    /// noise, so MAD windows aren't degenerately zero (as the spec's
    /// scenario 1 flat-calibration trip assumes).
    fn noise(i: i64) -> f64 {
        0.05 * (i as f64 * 0.37).sin()
    }

    fn flat_sample(uptime_ms: i64) -> Sample {
        let i = uptime_ms / 20;
        Sample {
            wall_time: Utc.timestamp_millis_opt(1_700_000_000_000 + uptime_ms).unwrap(),
            uptime_ms,
            position: Some(Position {
                latitude: 40.0,
                longitude: -105.0,
                accuracy_m: 5.0,
                speed_mps: 10.0,
            }),
            accel: Some(Vector3::new(0.0, 0.0, 9.81 + noise(i))),
            gyro: Vector3::new(0.0, 0.0, 0.0),
        }
    }

    fn flat_trip(n: usize) -> Trip {
        let samples = (0..n as i64).map(|i| flat_sample(i * 20)).collect();
        Trip {
            user_id: "u1".into(),
            trip_id: "t1".into(),
            samples,
        }
    }

    #[test]
    fn flat_trip_yields_no_detections() {
        let trip = flat_trip(15_000); // 5 minutes at 50Hz
        let detections = detect(&trip, &DetectorConfig::default());
        assert!(detections.is_empty());
    }

    #[test]
    fn single_sharp_bump_detected() {
        let mut trip = flat_trip(15_000);
        let bump_idx = 6_000; // t = 120s
        trip.samples[bump_idx].accel = Some(Vector3::new(0.0, 0.0, 9.81 + 25.0));
        let detections = detect(&trip, &DetectorConfig::default());
        assert_eq!(detections.len(), 1);
        assert!(detections[0].intensity > 30.0);
        assert!(detections[0].stability > 0.9);
    }

    #[test]
    fn hand_held_phone_suppresses_detection() {
        let mut trip = flat_trip(15_000);
        let bump_idx = 6_000;
        trip.samples[bump_idx].accel = Some(Vector3::new(0.0, 0.0, 9.81 + 25.0));
        for sample in trip.samples.iter_mut().take(bump_idx + 1).skip(bump_idx.saturating_sub(60)) {
            sample.gyro = Vector3::new(1.5, 0.0, 0.0);
        }
        let detections = detect(&trip, &DetectorConfig::default());
        assert!(detections.is_empty());
    }

    #[test]
    fn debounce_keeps_first_and_later_bump() {
        let mut trip = flat_trip(15_000);
        // 50Hz => 20ms/sample. t=120.0s -> idx 6000, t=120.3s -> idx 6015, t=121.0s -> idx 6050.
        for (idx, extra) in [(6_000, 25.0), (6_015, 20.0), (6_050, 25.0)] {
            trip.samples[idx].accel = Some(Vector3::new(0.0, 0.0, 9.81 + extra));
        }
        let detections = detect(&trip, &DetectorConfig::default());
        assert_eq!(detections.len(), 2);
        let dt = (detections[1].wall_time - detections[0].wall_time).num_milliseconds();
        assert!(dt >= 700);
    }

    /// Regression for a debounce anchor bug: when the highest-intensity
    /// candidate in a window isn't the window's first candidate, scanning
    /// must resume `debounce_s` past the *emitted* candidate, not past the
    /// window's anchor — otherwise a candidate just outside the anchor
    /// window can still land within `debounce_s` of what was actually
    /// emitted.
    #[test]
    fn debounce_resumes_after_the_emitted_candidate_not_the_window_anchor() {
        let base_wall = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let candidates = [
            Candidate {
                uptime_ms: 0,
                wall_time: base_wall,
                latitude: 40.0,
                longitude: -105.0,
                intensity: 1.0,
                stability: 1.0,
                speed_mps: 10.0,
            },
            Candidate {
                uptime_ms: 690,
                wall_time: base_wall + chrono::Duration::milliseconds(690),
                latitude: 40.0,
                longitude: -105.0,
                intensity: 100.0,
                stability: 1.0,
                speed_mps: 10.0,
            },
            Candidate {
                uptime_ms: 750,
                wall_time: base_wall + chrono::Duration::milliseconds(750),
                latitude: 40.0,
                longitude: -105.0,
                intensity: 2.0,
                stability: 1.0,
                speed_mps: 10.0,
            },
        ];
        let emitted = debounce(&candidates, 0.7);
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].uptime_ms, 690);
    }

    #[test]
    fn constant_gravity_baseline_yields_no_detections() {
        let samples = (0..10_000i64)
            .map(|i| Sample {
                wall_time: Utc.timestamp_millis_opt(1_700_000_000_000 + i * 20).unwrap(),
                uptime_ms: i * 20,
                position: Some(Position {
                    latitude: 40.0,
                    longitude: -105.0,
                    accuracy_m: 5.0,
                    speed_mps: 10.0,
                }),
                accel: None,
                gyro: Vector3::new(0.0, 0.0, 0.0),
            })
            .collect();
        let trip = Trip {
            user_id: "u1".into(),
            trip_id: "t1".into(),
            samples,
        };
        let detections = detect(&trip, &DetectorConfig::default());
        assert!(detections.is_empty());
    }
}
