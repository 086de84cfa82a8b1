use serde::{Deserialize, Serialize};

/// A field as read from upstream, coordinates possibly unresolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCandidate {
    pub id: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl FieldCandidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude: None,
            longitude: None,
        }
    }

    pub fn with_coordinates(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Promote to a clusterable point when both coordinates are finite and in range.
    pub fn located(&self) -> Option<FieldPoint> {
        let lat = self.latitude?;
        let lon = self.longitude?;
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return None;
        }
        Some(FieldPoint {
            id: self.id.clone(),
            name: self.name.clone(),
            latitude: lat,
            longitude: lon,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldPoint {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl FieldPoint {
    pub fn new(id: impl Into<String>, name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCluster {
    pub id: String,
    pub members: Vec<FieldPoint>,
}

impl FieldCluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, field_id: &str) -> bool {
        self.members.iter().any(|m| m.id == field_id)
    }

    /// Mean member coordinate, used as the shared weather location
    pub fn center(&self) -> Option<(f64, f64)> {
        if self.members.is_empty() {
            return None;
        }
        let n = self.members.len() as f64;
        let lat = self.members.iter().map(|m| m.latitude).sum::<f64>() / n;
        let lon = self.members.iter().map(|m| m.longitude).sum::<f64>() / n;
        Some((lat, lon))
    }
}

/// Clustering output: spatial clusters plus fields that could not be located
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClusterPartition {
    pub clusters: Vec<FieldCluster>,
    pub unlocated: Vec<FieldCandidate>,
}

impl ClusterPartition {
    pub fn cluster_of(&self, field_id: &str) -> Option<&FieldCluster> {
        self.clusters.iter().find(|c| c.contains(field_id))
    }

    pub fn is_unlocated(&self, field_id: &str) -> bool {
        self.unlocated.iter().any(|f| f.id == field_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CentroidSource {
    Direct,
    Farm,
    Boundary,
}

impl CentroidSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CentroidSource::Direct => "direct",
            CentroidSource::Farm => "farm",
            CentroidSource::Boundary => "boundary",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldCentroid {
    pub latitude: f64,
    pub longitude: f64,
    pub source: CentroidSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_located_requires_valid_coordinates() {
        let f = FieldCandidate::new("a", "North").with_coordinates(35.0, 139.0);
        assert_eq!(f.located().unwrap().latitude, 35.0);

        assert!(FieldCandidate::new("b", "No coords").located().is_none());
        assert!(FieldCandidate::new("c", "NaN")
            .with_coordinates(f64::NAN, 139.0)
            .located()
            .is_none());
        assert!(FieldCandidate::new("d", "Out of range")
            .with_coordinates(120.0, 200.0)
            .located()
            .is_none());
    }

    #[test]
    fn cluster_center_is_member_mean() {
        let cluster = FieldCluster {
            id: "cluster-1".into(),
            members: vec![
                FieldPoint::new("a", "A", 10.0, 20.0),
                FieldPoint::new("b", "B", 12.0, 22.0),
            ],
        };
        let (lat, lon) = cluster.center().unwrap();
        assert!((lat - 11.0).abs() < 1e-9);
        assert!((lon - 21.0).abs() < 1e-9);
        assert!(cluster.contains("b"));
        assert!(!cluster.contains("z"));
    }
}
