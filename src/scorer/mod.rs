//! Confidence & Priority Scorer (spec §4.4)
//!
//! Pure functions over a cluster's aggregate statistics. `now` is always
//! an explicit parameter — recency is never computed against a clock
//! read deep inside this module — so scoring stays deterministic and
//! replayable in tests.

use chrono::{DateTime, Utc};

use crate::config::ScorerConfig;
use crate::model::{ClusterStats, ClusterSummary, Likelihood};

/// Derive confidence, priority, and likelihood for one cluster.
pub fn score(stats: &ClusterStats, now: DateTime<Utc>, config: &ScorerConfig) -> ClusterSummary {
    let coverage = (stats.users as f64 / config.coverage_saturation_users).min(1.0);
    let hits_n = (stats.hits as f64 / config.hits_saturation).min(1.0);
    let intensity_n = ((stats.avg_intensity - config.intensity_floor) / config.intensity_span)
        .max(0.0)
        .min(1.0);
    let stability_n = stats.avg_stability.clamp(0.0, 1.0);

    let delta_days = (now - stats.last_seen).num_milliseconds() as f64 / 86_400_000.0;
    let recency = (-delta_days.max(0.0) / config.recency_decay_days).exp();

    let confidence =
        (0.45 * coverage + 0.25 * hits_n + 0.20 * intensity_n + 0.10 * stability_n) * recency;
    let confidence = confidence.clamp(0.0, 1.0);

    let priority = (0.7 * confidence + 0.3 * intensity_n * (1.0 - stability_n)).clamp(0.0, 1.0);

    let likelihood = if confidence >= config.very_likely_threshold {
        Likelihood::VeryLikely
    } else if confidence >= config.likely_threshold {
        Likelihood::Likely
    } else {
        Likelihood::Uncertain
    };

    ClusterSummary {
        cluster_id: stats.cluster_id.clone(),
        centroid_lat: stats.centroid_lat,
        centroid_lon: stats.centroid_lon,
        hits: stats.hits,
        users: stats.users,
        last_seen: stats.last_seen,
        avg_intensity: stats.avg_intensity,
        avg_stability: stats.avg_stability,
        confidence,
        priority,
        likelihood,
    }
}

/// Score every cluster in `stats` against the same `now`.
pub fn score_all(stats: &[ClusterStats], now: DateTime<Utc>, config: &ScorerConfig) -> Vec<ClusterSummary> {
    stats.iter().map(|s| score(s, now, config)).collect()
}

/// Apply the dashboard "high-priority" view: keep only clusters whose
/// confidence is at or above the 66th percentile of the current set,
/// with `dashboard_min_confidence` as an absolute floor. This is an
/// output-time filter — nothing about a cluster's stored state changes.
pub fn dashboard_filter(clusters: &[ClusterSummary], config: &ScorerConfig) -> Vec<ClusterSummary> {
    if clusters.is_empty() {
        return Vec::new();
    }

    let mut confidences: Vec<f64> = clusters.iter().map(|c| c.confidence).collect();
    confidences.sort_by(|a, b| a.partial_cmp(b).unwrap());

    let rank = ((config.dashboard_percentile / 100.0) * confidences.len() as f64).ceil() as usize;
    let rank = rank.clamp(1, confidences.len()) - 1;
    let percentile_threshold = confidences[rank];
    let threshold = percentile_threshold.max(config.dashboard_min_confidence);

    clusters
        .iter()
        .filter(|c| c.confidence >= threshold)
        .cloned()
        .collect()
}
