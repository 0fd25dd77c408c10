//! Ingest operation (spec §6, §5 concurrency model)
//!
//! Runs Normalizer + Detector for one trip and persists its detections,
//! replacing any prior detections for the same `trip_id`. Detection work
//! is CPU-bound, so it runs on the blocking-task pool while the caller's
//! upload reply is free to return as soon as this future resolves; a
//! hard timeout aborts the trip without writing partial detections.

use tracing::{info, warn};

use crate::config::Config;
use crate::detector;
use crate::error::{CoreError, Result};
use crate::model::TripDocument;
use crate::normalizer;
use crate::store::{DetectionStore, TripStore};

/// Result of a successful ingest.
#[derive(Debug, Clone)]
pub struct IngestResult {
    pub trip_id: String,
    pub detection_count: usize,
}

pub async fn ingest(
    trip_store: &dyn TripStore,
    detection_store: &dyn DetectionStore,
    doc: TripDocument,
    config: &Config,
) -> Result<IngestResult> {
    let trip_id = doc.trip_id.clone();
    trip_store.put(&trip_id, doc.clone()).await?;

    let min_usable_samples = config.min_usable_samples;
    let detector_config = config.detector;
    let detect_task = tokio::task::spawn_blocking(move || {
        let trip = normalizer::normalize(doc, min_usable_samples)?;
        Ok::<_, CoreError>(detector::detect(&trip, &detector_config))
    });

    let detections = match tokio::time::timeout(config.ingest_timeout, detect_task).await {
        Ok(Ok(Ok(detections))) => detections,
        Ok(Ok(Err(e))) => {
            warn!(trip_id = %trip_id, error = %e, "trip failed to normalize or detect");
            return Err(e);
        }
        Ok(Err(_join_err)) => {
            return Err(CoreError::StoreUnavailable(
                "detector task panicked or was cancelled".into(),
            ))
        }
        Err(_elapsed) => {
            warn!(trip_id = %trip_id, "ingest exceeded processing budget");
            return Err(CoreError::ProcessingTimeout(config.ingest_timeout));
        }
    };

    let detection_count = detections.len();
    detection_store
        .replace_trip_detections(&trip_id, detections)
        .await?;

    info!(trip_id = %trip_id, detection_count, "trip ingested");
    Ok(IngestResult {
        trip_id,
        detection_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SampleDocument, TimestampValue};
    use crate::store::{InMemoryDetectionStore, InMemoryTripStore};

    fn flat_doc(trip_id: &str, n: usize) -> TripDocument {
        let samples = (0..n as i64)
            .map(|i| SampleDocument {
                timestamp: TimestampValue::Millis(1_700_000_000_000 + i * 20),
                uptime_ms: i * 20,
                latitude: Some(40.0),
                longitude: Some(-105.0),
                accuracy_m: Some(5.0),
                speed_mps: Some(10.0),
                accel: Some(vec![0.0, 0.0, 9.81]),
                gyro: Some(vec![0.0, 0.0, 0.0]),
            })
            .collect();
        TripDocument {
            user_id: "u1".into(),
            trip_id: trip_id.into(),
            start_time: None,
            end_time: None,
            sample_count: Some(n as i64),
            samples,
        }
    }

    #[tokio::test]
    async fn ingest_rejects_invalid_trip() {
        let trip_store = InMemoryTripStore::new();
        let detection_store = InMemoryDetectionStore::new();
        let mut doc = flat_doc("t1", 60);
        doc.user_id = "".into();
        let result = ingest(&trip_store, &detection_store, doc, &Config::default()).await;
        assert!(matches!(result, Err(CoreError::InvalidTrip(_))));
    }

    #[tokio::test]
    async fn reingesting_same_trip_replaces_not_duplicates() {
        let trip_store = InMemoryTripStore::new();
        let detection_store = InMemoryDetectionStore::new();
        let doc = flat_doc("t1", 60);

        ingest(&trip_store, &detection_store, doc.clone(), &Config::default())
            .await
            .unwrap();
        let first_count = detection_store.count().await.unwrap();

        ingest(&trip_store, &detection_store, doc, &Config::default())
            .await
            .unwrap();
        let second_count = detection_store.count().await.unwrap();

        assert_eq!(first_count, second_count);
    }
}
