//! Cluster Aggregator (spec §4.3)
//!
//! Groups the current detection set into spatially-coincident clusters
//! and computes per-cluster summary aggregates. Clusters are derived,
//! not stored: every call recomputes from the detection set handed in.

mod cluster_id;
mod dbscan;

use std::collections::HashMap;

use crate::config::AggregatorConfig;
use crate::model::{ClusterStats, DetectionEvent};

/// Group `detections` into clusters. Noise points (DBSCAN label -1) are
/// discarded; singleton detections are never reported as clusters.
pub fn aggregate(detections: &[DetectionEvent], config: &AggregatorConfig) -> Vec<ClusterStats> {
    if detections.is_empty() {
        return Vec::new();
    }

    let points: Vec<(f64, f64)> = detections.iter().map(|d| (d.latitude, d.longitude)).collect();
    let labels = dbscan::cluster(&points, config.eps_m, config.min_pts);

    let mut members_by_cluster: HashMap<usize, Vec<usize>> = HashMap::new();
    for (idx, label) in labels.iter().enumerate() {
        if let dbscan::Label::Cluster(cluster_idx) = label {
            members_by_cluster.entry(*cluster_idx).or_default().push(idx);
        }
    }

    let mut summaries: Vec<ClusterStats> = members_by_cluster
        .into_values()
        .map(|member_indices| summarize(detections, &member_indices))
        .collect();
    summaries.sort_by(|a, b| a.cluster_id.cmp(&b.cluster_id));
    summaries
}

fn summarize(detections: &[DetectionEvent], member_indices: &[usize]) -> ClusterStats {
    let members: Vec<&DetectionEvent> = member_indices.iter().map(|&i| &detections[i]).collect();
    let n = members.len() as f64;

    let centroid_lat = members.iter().map(|d| d.latitude).sum::<f64>() / n;
    let centroid_lon = members.iter().map(|d| d.longitude).sum::<f64>() / n;
    let avg_intensity = members.iter().map(|d| d.intensity).sum::<f64>() / n;
    let avg_stability = members.iter().map(|d| d.stability).sum::<f64>() / n;
    let last_seen = members.iter().map(|d| d.wall_time).max().expect("non-empty cluster");

    let mut users: Vec<&str> = members.iter().map(|d| d.user_id.as_str()).collect();
    users.sort_unstable();
    users.dedup();

    let coords: Vec<(f64, f64)> = members.iter().map(|d| (d.latitude, d.longitude)).collect();
    let cluster_id = cluster_id::compute(&coords);

    ClusterStats {
        cluster_id,
        centroid_lat,
        centroid_lon,
        hits: members.len(),
        users: users.len(),
        last_seen,
        avg_intensity,
        avg_stability,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn detection(user: &str, lat: f64, lon: f64, intensity: f64) -> DetectionEvent {
        DetectionEvent {
            trip_id: format!("trip-{user}"),
            user_id: user.into(),
            wall_time: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            latitude: lat,
            longitude: lon,
            intensity,
            stability: 0.9,
            speed_mps: 10.0,
        }
    }

    #[test]
    fn singleton_produces_no_cluster() {
        let detections = vec![detection("u1", 40.0, -105.0, 20.0)];
        let clusters = aggregate(&detections, &AggregatorConfig::default());
        assert!(clusters.is_empty());
    }

    #[test]
    fn two_users_same_spot_form_one_cluster() {
        let detections = vec![
            detection("u1", 40.0, -105.0, 25.0),
            detection("u2", 40.00001, -105.00001, 30.0),
        ];
        let clusters = aggregate(&detections, &AggregatorConfig::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].hits, 2);
        assert_eq!(clusters[0].users, 2);
    }

    #[test]
    fn determinism_independent_of_insertion_order() {
        let mut forward = vec![
            detection("u1", 40.0, -105.0, 25.0),
            detection("u2", 40.00001, -105.0, 30.0),
            detection("u3", 40.00002, -105.0, 28.0),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();

        let a = aggregate(&forward, &AggregatorConfig::default());
        let b = aggregate(&reversed, &AggregatorConfig::default());
        forward.sort_by(|x, y| x.user_id.cmp(&y.user_id));

        assert_eq!(a.len(), 1);
        assert_eq!(b.len(), 1);
        assert_eq!(a[0].cluster_id, b[0].cluster_id);
        assert_eq!(a[0].hits, b[0].hits);
        assert!((a[0].centroid_lat - b[0].centroid_lat).abs() < 1e-12);
        let _ = forward;
    }
}
