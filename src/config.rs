//! Pipeline configuration
//!
//! Every numeric threshold the detector, aggregator, and scorer use is a
//! named field here rather than a literal buried in logic, so tests can
//! pin the values the specification names and experiments can vary them
//! without touching algorithm code.

/// Tunable parameters for the per-trip detector (spec §4.2).
#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    /// Maximum staleness, in milliseconds, for an accel reading to be
    /// fused onto a gyro-bearing sample.
    pub fusion_window_ms: i64,
    /// Trailing window, in seconds, used to smooth gyro jitter into a
    /// stability estimate.
    pub jitter_window_s: f64,
    /// `k` such that `stability = exp(-k * jitter)`; chosen so that
    /// `jitter = 1.0 rad/s` maps to `stability ≈ 0.37` (k = 1.0).
    pub stability_k: f64,
    /// Trailing window, in seconds, over which the robust z-score's
    /// median and MAD are computed.
    pub mad_window_s: f64,
    /// Floor added to `1.4826 * MAD` to avoid division by zero.
    pub mad_epsilon: f64,
    /// Minimum robust z-score magnitude to trigger a candidate.
    pub z_threshold: f64,
    /// Minimum speed, in m/s, for a candidate to be considered.
    pub min_speed_mps: f64,
    /// Minimum stability for a candidate to be considered.
    pub min_stability: f64,
    /// Maximum GPS accuracy, in meters, for a candidate's position to
    /// count as fresh.
    pub max_accuracy_m: f64,
    /// Maximum position staleness, in seconds, before a fix is treated
    /// as a GPS drop.
    pub max_position_age_s: f64,
    /// Minimum time, in seconds, between two emitted detections.
    pub debounce_s: f64,
    /// Minimum samples required before the MAD window is trusted enough
    /// for detections to fire.
    pub min_window_samples: usize,
    /// Below this gravity-vector magnitude the trip's orientation
    /// baseline is considered unusable.
    pub min_gravity_magnitude: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            fusion_window_ms: 50,
            jitter_window_s: 1.0,
            stability_k: 1.0,
            mad_window_s: 10.0,
            mad_epsilon: 1e-3,
            z_threshold: 5.0,
            min_speed_mps: 2.0,
            min_stability: 0.5,
            max_accuracy_m: 25.0,
            max_position_age_s: 2.0,
            debounce_s: 0.7,
            min_window_samples: 50,
            min_gravity_magnitude: 4.0,
        }
    }
}

/// Tunable parameters for cross-trip spatial aggregation (spec §4.3).
#[derive(Debug, Clone, Copy)]
pub struct AggregatorConfig {
    /// DBSCAN neighborhood radius, in meters.
    pub eps_m: f64,
    /// DBSCAN minimum points to form a core.
    pub min_pts: usize,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            eps_m: 5.0,
            min_pts: 2,
        }
    }
}

/// Tunable parameters for the confidence/priority scorer (spec §4.4).
#[derive(Debug, Clone, Copy)]
pub struct ScorerConfig {
    /// Distinct users at which `coverage` saturates to 1.0.
    pub coverage_saturation_users: f64,
    /// Hit count at which `hits_n` saturates to 1.0.
    pub hits_saturation: f64,
    /// Lower bound subtracted from `avg_intensity` before normalizing.
    pub intensity_floor: f64,
    /// Span over which `intensity_n` climbs from 0 to 1.
    pub intensity_span: f64,
    /// Recency half-life-ish decay constant, in days.
    pub recency_decay_days: f64,
    /// Confidence threshold at/above which a cluster is `very_likely`.
    pub very_likely_threshold: f64,
    /// Confidence threshold at/above which a cluster is `likely`.
    pub likely_threshold: f64,
    /// Minimum confidence the dashboard view will ever show, regardless
    /// of the 66th-percentile cutoff.
    pub dashboard_min_confidence: f64,
    /// Percentile (0-100) used for the dashboard "high-priority" filter.
    pub dashboard_percentile: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            coverage_saturation_users: 3.0,
            hits_saturation: 10.0,
            intensity_floor: 5.0,
            intensity_span: 10.0,
            recency_decay_days: 30.0,
            very_likely_threshold: 0.66,
            likely_threshold: 0.40,
            dashboard_min_confidence: 0.40,
            dashboard_percentile: 66.0,
        }
    }
}

/// Top-level pipeline configuration, composed of the per-component configs
/// plus the ingest scheduling knobs from spec §5.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    pub detector: DetectorConfig,
    pub aggregator: AggregatorConfig,
    pub scorer: ScorerConfig,
    /// Hard wall-clock budget for processing one trip before
    /// `CoreError::ProcessingTimeout` is raised.
    pub ingest_timeout: std::time::Duration,
    /// Minimum gyro-bearing samples required for a trip to normalize.
    pub min_usable_samples: usize,
    /// Default result cap for `QueryClusters`/`QueryDetections`.
    pub default_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            aggregator: AggregatorConfig::default(),
            scorer: ScorerConfig::default(),
            ingest_timeout: std::time::Duration::from_secs(60),
            min_usable_samples: 50,
            default_limit: 1000,
        }
    }
}
