//! Pothole detection demo CLI.
//!
//! Ingests one or more trip JSON files (or, with none given, a synthetic
//! demo trip with a single injected bump) through the full pipeline and
//! logs a ranked cluster summary to stdout.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
use rand_distr::{Distribution, Normal};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pothole_core::model::{SampleDocument, TimestampValue, TripDocument};
use pothole_core::store::{InMemoryDetectionStore, InMemoryTripStore};
use pothole_core::{query_clusters, ClusterQuery, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pothole_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    info!("starting pothole detection pipeline");

    let config = Arc::new(Config::default());
    let trip_store = Arc::new(InMemoryTripStore::new());
    let detection_store = Arc::new(InMemoryDetectionStore::new());

    let paths: Vec<PathBuf> = std::env::args().skip(1).map(PathBuf::from).collect();
    let docs = if paths.is_empty() {
        info!("no trip files given, generating a synthetic demo trip");
        vec![synthetic_bump_trip("demo-user", "demo-trip-1")]
    } else {
        let mut docs = Vec::with_capacity(paths.len());
        for path in &paths {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading trip file {}", path.display()))?;
            let doc: TripDocument = serde_json::from_str(&raw)
                .with_context(|| format!("parsing trip file {}", path.display()))?;
            docs.push(doc);
        }
        docs
    };

    let mut handles = Vec::with_capacity(docs.len());
    for doc in docs {
        let trip_store = trip_store.clone();
        let detection_store = detection_store.clone();
        let config = config.clone();
        handles.push(tokio::spawn(async move {
            let trip_id = doc.trip_id.clone();
            match pothole_core::ingest(trip_store.as_ref(), detection_store.as_ref(), doc, &config)
                .await
            {
                Ok(result) => info!(
                    trip_id = %result.trip_id,
                    detections = result.detection_count,
                    "ingested trip"
                ),
                Err(e) => error!(trip_id = %trip_id, error = %e, "failed to ingest trip"),
            }
        }));
    }
    for handle in handles {
        if let Err(e) = handle.await {
            warn!("ingest task panicked: {}", e);
        }
    }

    let clusters = query_clusters(
        detection_store.as_ref(),
        ClusterQuery::default(),
        &config,
        Utc::now(),
    )
    .await?;

    info!("ranked cluster summary ({} clusters):", clusters.len());
    for cluster in &clusters {
        info!(
            cluster_id = %cluster.cluster_id,
            lat = cluster.centroid_lat,
            lon = cluster.centroid_lon,
            hits = cluster.hits,
            users = cluster.users,
            confidence = %format!("{:.3}", cluster.confidence),
            priority = %format!("{:.3}", cluster.priority),
            likelihood = ?cluster.likelihood,
            "cluster"
        );
    }

    Ok(())
}

/// A five-minute synthetic trip at a near-constant pace with one injected
/// vertical-acceleration bump at t=120s, used when no trip file is given.
fn synthetic_bump_trip(user_id: &str, trip_id: &str) -> TripDocument {
    let mut rng = rand::thread_rng();
    // N(0, 0.05) accel noise, N(0, 0.01) gyro noise — the same
    // Normal-distribution noise model spec scenario 1's flat-calibration
    // trip assumes, sampled the way the teacher's IMU simulator samples
    // its own accel/gyro noise.
    let accel_noise = Normal::new(0.0, 0.05).expect("valid accel noise stddev");
    let gyro_noise = Normal::new(0.0, 0.01).expect("valid gyro noise stddev");

    let start: DateTime<Utc> = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    let sample_interval_ms: i64 = 20; // 50 Hz
    let duration_s = 300;
    let n = (duration_s * 1000) / sample_interval_ms;

    let lat0 = 40.015_f64;
    let lon0 = -105.270_f64;
    let speed_mps = 12.0;

    let mut samples = Vec::with_capacity(n as usize);
    for i in 0..n {
        let uptime_ms = i * sample_interval_ms;
        let t_s = uptime_ms as f64 / 1000.0;
        let wall_time = start + ChronoDuration::milliseconds(uptime_ms);

        // Straight-line drift north at a fixed speed.
        let meters_north = speed_mps * t_s;
        let lat = lat0 + meters_north / 111_111.0;
        let lon = lon0;

        let is_bump = (119.8..=120.3).contains(&t_s);
        let vertical = if is_bump {
            9.81 + 6.5 * ((t_s - 120.0) * std::f64::consts::PI / 0.25).cos()
        } else {
            9.81 + accel_noise.sample(&mut rng)
        };

        samples.push(SampleDocument {
            timestamp: TimestampValue::Millis(wall_time.timestamp_millis()),
            uptime_ms,
            latitude: Some(lat),
            longitude: Some(lon),
            accuracy_m: Some(4.0),
            speed_mps: Some(speed_mps),
            accel: Some(vec![
                accel_noise.sample(&mut rng),
                accel_noise.sample(&mut rng),
                vertical,
            ]),
            gyro: Some(vec![
                gyro_noise.sample(&mut rng),
                gyro_noise.sample(&mut rng),
                gyro_noise.sample(&mut rng),
            ]),
        });
    }

    TripDocument {
        user_id: user_id.into(),
        trip_id: trip_id.into(),
        start_time: None,
        end_time: None,
        sample_count: Some(n),
        samples,
    }
}
