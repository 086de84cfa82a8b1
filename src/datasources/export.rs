//! Exported API responses read from disk.
//!
//! Both loaders accept the raw GraphQL envelope as saved from the API as well
//! as the unwrapped payload, so a response can be piped to a file unchanged.

use crate::error::{AgroDashError, Result};
use crate::models::{parse_field_records, CombinedData, HourlyWeather};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const FIELD_KEYS: &[&str] = &["fieldsV2", "fields"];
const WEATHER_KEY: &str = "weatherHistoricForecastHourly";
const SEASONS_KEY: &str = "cropSeasonsV2";

fn read_json(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Unwrap a top-level `data` envelope when present.
fn unwrap_data(value: Value) -> Value {
    match value {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

pub fn load_combined(path: &Path) -> Result<CombinedData> {
    let data = parse_combined(read_json(path)?)?;
    tracing::info!("Loaded {} fields from {}", data.fields.len(), path.display());
    Ok(data)
}

/// Load several partial exports (base, insights, predictions, per-farm chunks)
/// and merge them by field and crop-season uuid. Later files win.
pub fn load_combined_many(paths: &[PathBuf]) -> Result<CombinedData> {
    let lists = paths
        .iter()
        .map(|path| read_json(path).and_then(field_values))
        .collect::<Result<Vec<_>>>()?;
    let data = CombinedData {
        fields: parse_field_records(merge_field_lists(lists)),
    };
    tracing::info!("Merged {} fields from {} exports", data.fields.len(), paths.len());
    Ok(data)
}

pub fn parse_combined(value: Value) -> Result<CombinedData> {
    Ok(CombinedData {
        fields: parse_field_records(field_values(value)?),
    })
}

/// Raw field objects of one combined export.
fn field_values(value: Value) -> Result<Vec<Value>> {
    let fields = match unwrap_data(value) {
        array @ Value::Array(_) => array,
        Value::Object(mut map) => FIELD_KEYS
            .iter()
            .find_map(|key| map.remove(*key))
            .ok_or_else(|| {
                AgroDashError::InvalidData("no fieldsV2 or fields array in export".into())
            })?,
        _ => {
            return Err(AgroDashError::InvalidData(
                "combined export must be an object or array".into(),
            ))
        }
    };

    match fields {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        _ => Err(AgroDashError::InvalidData("fields must be an array".into())),
    }
}

fn uuid_key(record: &Map<String, Value>) -> Option<String> {
    match record.get("uuid")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Merge objects keyed by uuid in first-seen order; later keys override earlier ones.
fn merge_by_uuid<F>(lists: impl IntoIterator<Item = Value>, mut combine: F) -> Vec<Value>
where
    F: FnMut(&Map<String, Value>, &Map<String, Value>) -> Map<String, Value>,
{
    let mut merged: Vec<Map<String, Value>> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for item in lists {
        let Value::Object(record) = item else {
            tracing::debug!("Non-object record skipped during merge");
            continue;
        };
        let Some(key) = uuid_key(&record) else {
            tracing::debug!("Record without uuid skipped during merge");
            continue;
        };
        match positions.get(&key).copied() {
            Some(pos) => {
                let updated = combine(&merged[pos], &record);
                merged[pos] = updated;
            }
            None => {
                positions.insert(key, merged.len());
                merged.push(combine(&Map::new(), &record));
            }
        }
    }

    merged.into_iter().map(Value::Object).collect()
}

fn overlay(prev: &Map<String, Value>, next: &Map<String, Value>) -> Map<String, Value> {
    let mut out = prev.clone();
    out.extend(next.iter().map(|(k, v)| (k.clone(), v.clone())));
    out
}

fn list_items(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    }
}

/// Merge field lists from several partial responses.
///
/// Fields are matched by `uuid` and their keys overlaid, later lists winning.
/// Crop seasons inside a field are merged the same way by their own `uuid`.
/// Non-object records and records without a uuid are skipped; `null` season
/// lists count as empty.
pub fn merge_field_lists(lists: Vec<Vec<Value>>) -> Vec<Value> {
    merge_by_uuid(lists.into_iter().flatten(), |prev, next| {
        let mut combined = overlay(prev, next);
        let prev_seasons = prev.get(SEASONS_KEY).filter(|v| !v.is_null());
        let next_seasons = next.get(SEASONS_KEY).filter(|v| !v.is_null());
        if prev_seasons.is_some() || next_seasons.is_some() {
            let seasons = list_items(prev_seasons)
                .into_iter()
                .chain(list_items(next_seasons));
            combined.insert(
                SEASONS_KEY.to_string(),
                Value::Array(merge_by_uuid(seasons, overlay)),
            );
        }
        combined
    })
}

pub fn load_weather(path: &Path) -> Result<Vec<HourlyWeather>> {
    let hours = parse_weather(read_json(path)?)?;
    tracing::info!("Loaded {} weather hours from {}", hours.len(), path.display());
    Ok(hours)
}

pub fn parse_weather(value: Value) -> Result<Vec<HourlyWeather>> {
    let hours = match unwrap_data(value) {
        array @ Value::Array(_) => array,
        Value::Object(mut map) => {
            let nested = map
                .remove("fieldV2")
                .and_then(|field| match field {
                    Value::Object(mut f) => f.remove(WEATHER_KEY),
                    _ => None,
                });
            nested.or_else(|| map.remove(WEATHER_KEY)).ok_or_else(|| {
                AgroDashError::InvalidData(format!("no {} array in export", WEATHER_KEY))
            })?
        }
        _ => {
            return Err(AgroDashError::InvalidData(
                "weather export must be an object or array".into(),
            ))
        }
    };

    // null means the API had no data for the field
    if hours.is_null() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_value(hours)?)
}
