//! Deterministic cluster identifiers (spec §4.3, §9 design notes).
//!
//! A cluster's id is a content hash over its members' rounded
//! coordinates, not a random or sequential id, so recomputing clusters
//! from a stable detection set always yields the same ids — letting a
//! dashboard attach "maintenance status" annotations that survive
//! recomputation.

use sha2::{Digest, Sha256};

/// Hash a sorted list of `(lat, lon)` pairs rounded to 6 decimal places
/// into a 16-byte, hex-encoded cluster id.
pub fn compute(members: &[(f64, f64)]) -> String {
    let mut rounded: Vec<(i64, i64)> = members
        .iter()
        .map(|&(lat, lon)| ((lat * 1e6).round() as i64, (lon * 1e6).round() as i64))
        .collect();
    rounded.sort_unstable();

    let mut hasher = Sha256::new();
    for (lat, lon) in &rounded {
        hasher.update(lat.to_le_bytes());
        hasher.update(lon.to_le_bytes());
    }
    let digest = hasher.finalize();

    digest[..16]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_across_member_order() {
        let a = [(40.0, -105.0), (40.00001, -105.00001)];
        let b = [(40.00001, -105.00001), (40.0, -105.0)];
        assert_eq!(compute(&a), compute(&b));
    }

    #[test]
    fn changes_with_membership() {
        let a = [(40.0, -105.0)];
        let b = [(40.0, -105.0), (40.00001, -105.00001)];
        assert_ne!(compute(&a), compute(&b));
    }
}
