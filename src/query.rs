//! Query operations (spec §6)
//!
//! `QueryClusters` recomputes clusters and scores from a snapshot of the
//! current detection set; `QueryDetections` pages over the same
//! snapshot's raw events. Neither operation mutates stored state.

use chrono::{DateTime, Utc};

use crate::aggregator;
use crate::config::Config;
use crate::error::{CoreError, Result};
use crate::model::{ClusterSummary, DetectionEvent};
use crate::scorer;
use crate::store::DetectionStore;

/// Recognized `QueryClusters` filters (spec §6).
#[derive(Debug, Clone, Copy)]
pub struct ClusterQuery {
    pub min_confidence: f64,
    pub limit: usize,
    pub dashboard: bool,
    pub eps_m: Option<f64>,
}

impl Default for ClusterQuery {
    fn default() -> Self {
        Self {
            min_confidence: 0.0,
            limit: 1000,
            dashboard: false,
            eps_m: None,
        }
    }
}

/// `QueryDetections` pagination (spec §6).
#[derive(Debug, Clone, Copy)]
pub struct DetectionQuery {
    pub limit: usize,
    pub offset: usize,
}

impl Default for DetectionQuery {
    fn default() -> Self {
        Self {
            limit: 1000,
            offset: 0,
        }
    }
}

/// Recompute clusters from the current detection set and rank them.
pub async fn query_clusters(
    detection_store: &dyn DetectionStore,
    filters: ClusterQuery,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<Vec<ClusterSummary>> {
    if !(0.0..=1.0).contains(&filters.min_confidence) {
        return Err(CoreError::InvalidQuery(
            "min_confidence must be in [0, 1]".into(),
        ));
    }
    if filters.limit == 0 {
        return Err(CoreError::InvalidQuery("limit must be >= 1".into()));
    }
    if let Some(eps_m) = filters.eps_m {
        if eps_m <= 0.0 {
            return Err(CoreError::InvalidQuery("eps_m must be > 0".into()));
        }
    }

    // Snapshot: everything downstream operates on this one `Vec`, so a
    // concurrent write can't shift results mid-query.
    let detections = detection_store.scan_all().await?;

    let mut aggregator_config = config.aggregator;
    if let Some(eps_m) = filters.eps_m {
        aggregator_config.eps_m = eps_m;
    }

    let stats = aggregator::aggregate(&detections, &aggregator_config);
    let mut summaries = scorer::score_all(&stats, now, &config.scorer);

    summaries.retain(|c| c.confidence >= filters.min_confidence);

    if filters.dashboard {
        summaries = scorer::dashboard_filter(&summaries, &config.scorer);
    }

    summaries.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap());
    summaries.truncate(filters.limit);

    Ok(summaries)
}

/// Page over the current detection set, newest first.
pub async fn query_detections(
    detection_store: &dyn DetectionStore,
    pagination: DetectionQuery,
) -> Result<Vec<DetectionEvent>> {
    if pagination.limit == 0 {
        return Err(CoreError::InvalidQuery("limit must be >= 1".into()));
    }

    let mut detections = detection_store.scan_all().await?;
    detections.sort_by(|a, b| b.wall_time.cmp(&a.wall_time));

    Ok(detections
        .into_iter()
        .skip(pagination.offset)
        .take(pagination.limit)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryDetectionStore;
    use chrono::TimeZone;

    fn event(id: &str, ts: i64) -> DetectionEvent {
        DetectionEvent {
            trip_id: id.into(),
            user_id: "u1".into(),
            wall_time: Utc.timestamp_opt(ts, 0).unwrap(),
            latitude: 40.0,
            longitude: -105.0,
            intensity: 10.0,
            stability: 0.9,
            speed_mps: 5.0,
        }
    }

    #[tokio::test]
    async fn rejects_out_of_range_min_confidence() {
        let store = InMemoryDetectionStore::new();
        let filters = ClusterQuery {
            min_confidence: 1.5,
            ..Default::default()
        };
        let result = query_clusters(&store, filters, &Config::default(), Utc::now()).await;
        assert!(matches!(result, Err(CoreError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn rejects_zero_limit() {
        let store = InMemoryDetectionStore::new();
        let result = query_detections(
            &store,
            DetectionQuery {
                limit: 0,
                offset: 0,
            },
        )
        .await;
        assert!(matches!(result, Err(CoreError::InvalidQuery(_))));
    }

    #[tokio::test]
    async fn detections_are_ordered_newest_first() {
        let store = InMemoryDetectionStore::new();
        store
            .replace_trip_detections("t1", vec![event("t1", 100), event("t1", 300), event("t1", 200)])
            .await
            .unwrap();
        let results = query_detections(&store, DetectionQuery::default()).await.unwrap();
        let timestamps: Vec<i64> = results.iter().map(|d| d.wall_time.timestamp()).collect();
        assert_eq!(timestamps, vec![300, 200, 100]);
    }

    #[tokio::test]
    async fn pagination_respects_limit_and_offset() {
        let store = InMemoryDetectionStore::new();
        store
            .replace_trip_detections(
                "t1",
                (0..5).map(|i| event("t1", 100 + i)).collect(),
            )
            .await
            .unwrap();
        let page = query_detections(&store, DetectionQuery { limit: 2, offset: 1 })
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
    }
}
