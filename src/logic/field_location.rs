//! Field coordinate resolution from loosely-shaped upstream records.
//!
//! Sources are tried in order: `location.center`, `centroid`/`center`/
//! `centerPoint`, flat latitude/longitude keys, the owning farm, and finally
//! the area-weighted centroid of the GeoJSON boundary.

use crate::models::{CentroidSource, FieldCandidate, FieldCentroid, FieldRecord};
use serde_json::{Map, Value};

const LAT_KEYS: &[&str] = &["latitude", "lat"];
const LON_KEYS: &[&str] = &["longitude", "lon"];
const FLAT_LAT_KEYS: &[&str] = &["latitude", "lat", "centroidLatitude"];
const FLAT_LON_KEYS: &[&str] = &["longitude", "lon", "lng", "centroidLongitude"];

fn number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn first_number(obj: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| obj.get(*k).and_then(number))
}

/// Swap obviously transposed pairs (latitude outside ±90 while longitude fits).
pub fn normalize_lat_lon(lat: f64, lon: f64) -> (f64, f64) {
    if lat.abs() > 90.0 && lon.abs() <= 90.0 {
        (lon, lat)
    } else {
        (lat, lon)
    }
}

fn pair_from(obj: &Map<String, Value>, lat_keys: &[&str], lon_keys: &[&str]) -> Option<(f64, f64)> {
    let lat = first_number(obj, lat_keys)?;
    let lon = first_number(obj, lon_keys)?;
    Some(normalize_lat_lon(lat, lon))
}

fn centroid(pair: (f64, f64), source: CentroidSource) -> FieldCentroid {
    FieldCentroid {
        latitude: pair.0,
        longitude: pair.1,
        source,
    }
}

pub fn extract_field_centroid(field: &Map<String, Value>) -> Option<FieldCentroid> {
    let location_center = field
        .get("location")
        .and_then(Value::as_object)
        .and_then(|loc| loc.get("center"))
        .and_then(Value::as_object)
        .and_then(|c| pair_from(c, LAT_KEYS, LON_KEYS));
    if let Some(pair) = location_center {
        return Some(centroid(pair, CentroidSource::Direct));
    }

    for key in ["centroid", "center", "centerPoint"] {
        if let Some(pair) = field
            .get(key)
            .and_then(Value::as_object)
            .and_then(|c| pair_from(c, LAT_KEYS, LON_KEYS))
        {
            return Some(centroid(pair, CentroidSource::Direct));
        }
    }

    if let Some(pair) = pair_from(field, FLAT_LAT_KEYS, FLAT_LON_KEYS) {
        return Some(centroid(pair, CentroidSource::Direct));
    }

    for key in ["farmV2", "farm"] {
        if let Some(pair) = field
            .get(key)
            .and_then(Value::as_object)
            .and_then(|f| pair_from(f, LAT_KEYS, LON_KEYS))
        {
            return Some(centroid(pair, CentroidSource::Farm));
        }
    }

    let geometry = field.get("boundary").and_then(extract_geometry)?;
    let (lat, lon) = centroid_from_geometry(&geometry)?;
    Some(centroid((lat, lon), CentroidSource::Boundary))
}

/// Build a clustering candidate from a combined-fetch field record.
pub fn field_candidate(record: &FieldRecord) -> FieldCandidate {
    let candidate = FieldCandidate::new(record.uuid.clone(), record.display_name());
    match extract_field_centroid(&record.extra) {
        Some(c) => candidate.with_coordinates(c.latitude, c.longitude),
        None => candidate,
    }
}

fn is_polygonal(candidate: &Value) -> bool {
    let Some(obj) = candidate.as_object() else {
        return false;
    };
    let polygonal = matches!(
        obj.get("type").and_then(Value::as_str),
        Some("Polygon") | Some("MultiPolygon")
    );
    let has_coordinates = obj
        .get("coordinates")
        .and_then(Value::as_array)
        .is_some_and(|c| !c.is_empty());
    polygonal && has_coordinates
}

fn extract_geometry(boundary: &Value) -> Option<Value> {
    match boundary {
        Value::Object(obj) => ["geojson", "geoJson", "geometry"]
            .iter()
            .filter_map(|k| obj.get(*k))
            .chain(std::iter::once(boundary))
            .find(|c| is_polygonal(c))
            .cloned(),
        Value::String(text) => {
            let text = text.trim();
            if text.starts_with('{') && text.ends_with('}') {
                let parsed: Value = serde_json::from_str(text).ok()?;
                extract_geometry(&parsed)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// `[lon, lat]` GeoJSON position, normalized
fn position(pt: &Value) -> Option<(f64, f64)> {
    let arr = pt.as_array()?;
    if arr.len() < 2 {
        return None;
    }
    let lon = number(&arr[0])?;
    let lat = number(&arr[1])?;
    let (lat, lon) = normalize_lat_lon(lat, lon);
    Some((lon, lat))
}

/// Shoelace area and centroid of a closed ring of `(x, y)` points
fn ring_area_centroid(points: &[(f64, f64)]) -> (f64, f64, f64) {
    let mut area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for pair in points.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        let cross = x0 * y1 - x1 * y0;
        area += cross;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }
    area *= 0.5;

    if area.abs() < 1e-12 {
        // degenerate ring: vertex mean, excluding the closing point
        let open = &points[..points.len() - 1];
        let n = open.len() as f64;
        let mx = open.iter().map(|p| p.0).sum::<f64>() / n;
        let my = open.iter().map(|p| p.1).sum::<f64>() / n;
        return (0.0, mx, my);
    }

    (area, cx / (6.0 * area), cy / (6.0 * area))
}

/// Area-weighted centroid of the exterior rings, as `(lat, lon)`
fn centroid_from_geometry(geometry: &Value) -> Option<(f64, f64)> {
    let coordinates = geometry.get("coordinates")?.as_array()?;
    let rings: Vec<&Value> = match geometry.get("type").and_then(Value::as_str)? {
        "Polygon" => coordinates.first().into_iter().collect(),
        "MultiPolygon" => coordinates
            .iter()
            .filter_map(|poly| poly.as_array().and_then(|p| p.first()))
            .collect(),
        _ => return None,
    };

    let mut total_weight = 0.0;
    let mut weighted_x = 0.0;
    let mut weighted_y = 0.0;
    let mut fallback: Option<(f64, f64)> = None;

    for ring in rings {
        let mut points: Vec<(f64, f64)> = ring
            .as_array()
            .map(|pts| pts.iter().filter_map(position).collect())
            .unwrap_or_default();
        if fallback.is_none() {
            fallback = points.first().copied();
        }
        if points.len() < 3 {
            continue;
        }
        if points.first() != points.last() {
            points.push(points[0]);
        }

        let (area, cx, cy) = ring_area_centroid(&points);
        let weight = if area == 0.0 { 1e-9 } else { area.abs() };
        total_weight += weight;
        weighted_x += cx * weight;
        weighted_y += cy * weight;
    }

    let (lon, lat) = if total_weight == 0.0 {
        fallback?
    } else {
        (weighted_x / total_weight, weighted_y / total_weight)
    };

    Some(normalize_lat_lon(lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn prefers_location_center() {
        let field = obj(json!({
            "location": {"center": {"latitude": 35.5, "longitude": 139.5}},
            "center": {"latitude": 1.0, "longitude": 2.0}
        }));
        let c = extract_field_centroid(&field).unwrap();
        assert_eq!((c.latitude, c.longitude), (35.5, 139.5));
        assert_eq!(c.source, CentroidSource::Direct);
    }

    #[test]
    fn accepts_short_keys_and_numeric_strings() {
        let field = obj(json!({"centerPoint": {"lat": "43.06", "lon": "141.35"}}));
        let c = extract_field_centroid(&field).unwrap();
        assert!((c.latitude - 43.06).abs() < 1e-9);
        assert!((c.longitude - 141.35).abs() < 1e-9);
    }

    #[test]
    fn flat_keys_and_swapped_pairs() {
        let field = obj(json!({"lat": 139.7, "lng": 35.6}));
        let c = extract_field_centroid(&field).unwrap();
        assert_eq!((c.latitude, c.longitude), (35.6, 139.7));
    }

    #[test]
    fn falls_back_to_farm() {
        let field = obj(json!({"farmV2": {"latitude": 36.0, "longitude": 140.0}}));
        let c = extract_field_centroid(&field).unwrap();
        assert_eq!(c.source, CentroidSource::Farm);
    }

    #[test]
    fn boundary_polygon_centroid() {
        let field = obj(json!({
            "boundary": {"geojson": {
                "type": "Polygon",
                "coordinates": [[[139.0, 35.0], [139.2, 35.0], [139.2, 35.2], [139.0, 35.2], [139.0, 35.0]]]
            }}
        }));
        let c = extract_field_centroid(&field).unwrap();
        assert_eq!(c.source, CentroidSource::Boundary);
        assert!((c.latitude - 35.1).abs() < 1e-6);
        assert!((c.longitude - 139.1).abs() < 1e-6);
    }

    #[test]
    fn boundary_as_json_string_multipolygon() {
        let geometry = json!({
            "type": "MultiPolygon",
            "coordinates": [
                [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]]],
                [[[10.0, 0.0], [11.0, 0.0], [11.0, 1.0], [10.0, 1.0]]]
            ]
        });
        let field = obj(json!({"boundary": geometry.to_string()}));
        let c = extract_field_centroid(&field).unwrap();
        // areas 4 and 1: x = (1*4 + 10.5*1) / 5, y = (1*4 + 0.5*1) / 5
        assert!((c.longitude - 2.9).abs() < 1e-9);
        assert!((c.latitude - 0.9).abs() < 1e-9);
    }

    #[test]
    fn unresolvable_fields_yield_none() {
        assert!(extract_field_centroid(&obj(json!({"name": "x"}))).is_none());
        assert!(extract_field_centroid(&obj(json!({"center": {"latitude": null}}))).is_none());
        assert!(extract_field_centroid(&obj(json!({"boundary": "not json"}))).is_none());
        assert!(extract_field_centroid(&obj(json!({"boundary": {"type": "Point"}}))).is_none());
    }

    #[test]
    fn candidate_from_record() {
        let record: FieldRecord = serde_json::from_value(json!({
            "uuid": "f1",
            "name": "East",
            "center": {"latitude": 35.0, "longitude": 139.0}
        }))
        .unwrap();
        let candidate = field_candidate(&record);
        assert_eq!(candidate.latitude, Some(35.0));
        assert!(candidate.located().is_some());

        let record: FieldRecord = serde_json::from_value(json!({"uuid": "f2"})).unwrap();
        let candidate = field_candidate(&record);
        assert_eq!(candidate.name, "f2");
        assert!(candidate.located().is_none());
    }
}
