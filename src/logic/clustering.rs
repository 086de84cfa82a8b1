use crate::error::{AgroDashError, Result};
use crate::models::{ClusterPartition, FieldCandidate, FieldCluster, FieldPoint};
use std::collections::HashSet;

/// Mean Earth radius in kilometres
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points given in degrees
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();
    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

pub fn distance_km(a: &FieldPoint, b: &FieldPoint) -> f64 {
    haversine_km(a.latitude, a.longitude, b.latitude, b.longitude)
}

fn check_radius(radius_km: f64) -> Result<()> {
    if radius_km.is_finite() && radius_km > 0.0 {
        Ok(())
    } else {
        Err(AgroDashError::InvalidRadius(radius_km))
    }
}

/// Group points into clusters by chained proximity.
///
/// A point joins a cluster when it lies within `radius_km` (inclusive) of any
/// member already in it, so members can be further apart than the radius when
/// linked through intermediate points. Seeds are taken in input order, which
/// makes cluster ids and member order stable for identical input. Repeated ids
/// after the first occurrence and points with non-finite coordinates are ignored.
pub fn cluster(points: &[FieldPoint], radius_km: f64) -> Result<Vec<FieldCluster>> {
    check_radius(radius_km)?;

    let mut seen = HashSet::new();
    let mut unassigned: Vec<&FieldPoint> = Vec::with_capacity(points.len());
    for point in points {
        if !(point.latitude.is_finite() && point.longitude.is_finite()) {
            tracing::debug!("Field {} has non-finite coordinates, not clustered", point.id);
            continue;
        }
        if seen.insert(point.id.as_str()) {
            unassigned.push(point);
        } else {
            tracing::debug!("Duplicate field id {} ignored for clustering", point.id);
        }
    }

    let mut clusters = Vec::new();
    while !unassigned.is_empty() {
        let seed = unassigned.remove(0);
        let mut members = vec![seed];

        // Each accepted member is scanned once against what is still unassigned.
        let mut frontier = 0;
        while frontier < members.len() && !unassigned.is_empty() {
            let current = members[frontier];
            let (near, far): (Vec<&FieldPoint>, Vec<&FieldPoint>) = unassigned
                .into_iter()
                .partition(|p| distance_km(current, p) <= radius_km);
            members.extend(near);
            unassigned = far;
            frontier += 1;
        }

        clusters.push(FieldCluster {
            id: format!("cluster-{}", clusters.len() + 1),
            members: members.into_iter().cloned().collect(),
        });
    }

    tracing::info!(
        "Clustered {} fields into {} clusters (radius {} km)",
        seen.len(),
        clusters.len(),
        radius_km
    );

    Ok(clusters)
}

/// Cluster the located candidates and return the rest as a separate unlocated list.
pub fn partition_fields(candidates: &[FieldCandidate], radius_km: f64) -> Result<ClusterPartition> {
    check_radius(radius_km)?;

    let mut located = Vec::new();
    let mut unlocated = Vec::new();
    for candidate in candidates {
        match candidate.located() {
            Some(point) => located.push(point),
            None => {
                tracing::debug!("Field {} has no usable coordinates", candidate.id);
                unlocated.push(candidate.clone());
            }
        }
    }

    Ok(ClusterPartition {
        clusters: cluster(&located, radius_km)?,
        unlocated,
    })
}
