//! Raw records from the combined farm/field/crop-season fetch.
//!
//! Only the parts the analysis reads are typed; everything else on a field
//! (location variants, boundary, farm) is kept as raw JSON for
//! [`crate::logic::field_location`] to resolve.

use super::growth_stage::GrowthStagePrediction;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// `null` or a missing key reads as an empty list.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize each element on its own, dropping (and logging) the ones that fail.
pub fn parse_records<T: DeserializeOwned>(values: Vec<Value>, what: &str) -> Vec<T> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::debug!("{} #{} skipped: {}", what, i, e);
                None
            }
        })
        .collect()
}

fn has_uuid(uuid: &str, what: &str) -> bool {
    if uuid.trim().is_empty() {
        tracing::debug!("{} without uuid skipped", what);
        false
    } else {
        true
    }
}

/// Crop seasons tolerate `null`, malformed entries, and entries without a uuid.
fn lenient_seasons<'de, D>(deserializer: D) -> Result<Vec<CropSeasonRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Vec<Value> = null_as_empty(deserializer)?;
    Ok(parse_records::<CropSeasonRecord>(values, "crop season")
        .into_iter()
        .filter(|cs| has_uuid(&cs.uuid, "crop season"))
        .collect())
}

fn lenient_fields<'de, D>(deserializer: D) -> Result<Vec<FieldRecord>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(parse_field_records(null_as_empty(deserializer)?))
}

/// Parse raw field objects, dropping malformed ones and ones without a uuid.
pub fn parse_field_records(values: Vec<Value>) -> Vec<FieldRecord> {
    parse_records::<FieldRecord>(values, "field")
        .into_iter()
        .filter(|f| has_uuid(&f.uuid, "field"))
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CombinedData {
    #[serde(default, deserialize_with = "lenient_fields")]
    pub fields: Vec<FieldRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldRecord {
    pub uuid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(
        rename = "cropSeasonsV2",
        alias = "cropSeasons",
        default,
        deserialize_with = "lenient_seasons"
    )]
    pub crop_seasons: Vec<CropSeasonRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldRecord {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.uuid)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropSeasonRecord {
    pub uuid: String,
    #[serde(default)]
    pub crop: Option<NamedRef>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub country_crop_growth_stage_predictions: Vec<RawStagePrediction>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub spray_weather: Vec<SprayWeatherEntry>,
}

impl CropSeasonRecord {
    pub fn crop_name(&self) -> Option<&str> {
        self.crop.as_ref().and_then(|c| c.name.as_deref())
    }

    pub fn stage_predictions(&self) -> Vec<GrowthStagePrediction> {
        self.country_crop_growth_stage_predictions
            .iter()
            .map(RawStagePrediction::to_prediction)
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStagePrediction {
    #[serde(default)]
    pub index: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub crop_growth_stage_v2: Option<NamedRef>,
}

impl RawStagePrediction {
    /// Missing strings become empty and are rejected during normalization.
    pub fn to_prediction(&self) -> GrowthStagePrediction {
        let index = self.index.clone().unwrap_or_default();
        let stage_name = self
            .crop_growth_stage_v2
            .as_ref()
            .and_then(|s| s.name.clone())
            .unwrap_or_else(|| format!("BBCH {}", index));

        GrowthStagePrediction::new(
            index,
            self.start_date.clone().unwrap_or_default(),
            self.end_date.as_deref(),
            stage_name,
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SprayWeatherEntry {
    #[serde(default)]
    pub from_date: Option<String>,
    #[serde(default)]
    pub to_date: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub factors: Vec<RawSprayFactor>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSprayFactor {
    #[serde(default)]
    pub factor: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_combined_field_record() {
        let json = r#"{
            "fields": [{
                "uuid": "f1",
                "name": "North paddy",
                "location": {"center": {"latitude": 35.1, "longitude": 139.2}},
                "cropSeasonsV2": [{
                    "uuid": "cs1",
                    "crop": {"name": "Rice"},
                    "countryCropGrowthStagePredictions": [
                        {"index": "13", "startDate": "2024-05-01", "endDate": "2024-05-09",
                         "cropGrowthStageV2": {"name": "3 leaves"}},
                        {"startDate": "2024-05-10"}
                    ],
                    "sprayWeather": [
                        {"fromDate": "2024-05-01T06:00:00+09:00", "result": "RECOMMENDED",
                         "factors": [{"factor": "WIND", "result": "RECOMMENDED"}]}
                    ]
                }]
            }]
        }"#;
        let data: CombinedData = serde_json::from_str(json).unwrap();
        let field = &data.fields[0];
        assert_eq!(field.display_name(), "North paddy");
        assert!(field.extra.contains_key("location"));

        let season = &field.crop_seasons[0];
        assert_eq!(season.crop_name(), Some("Rice"));
        let predictions = season.stage_predictions();
        assert_eq!(predictions[0].stage_name, "3 leaves");
        assert_eq!(predictions[1].index, "");
        assert_eq!(season.spray_weather[0].factors.len(), 1);
    }

    #[test]
    fn null_lists_read_as_empty() {
        let data: CombinedData = serde_json::from_value(serde_json::json!({
            "fields": [
                {"uuid": "f1", "cropSeasonsV2": [{
                    "uuid": "cs1",
                    "countryCropGrowthStagePredictions": null,
                    "sprayWeather": [{"fromDate": "2024-05-01T06:00:00Z", "factors": null}]
                }]},
                {"uuid": "f2", "cropSeasonsV2": null},
                {"uuid": "f3", "cropSeasonsV2": [{"uuid": "cs3", "sprayWeather": null}]}
            ]
        }))
        .unwrap();

        assert_eq!(data.fields.len(), 3);
        let cs1 = &data.fields[0].crop_seasons[0];
        assert!(cs1.country_crop_growth_stage_predictions.is_empty());
        assert!(cs1.spray_weather[0].factors.is_empty());
        assert!(data.fields[1].crop_seasons.is_empty());
        assert!(data.fields[2].crop_seasons[0].spray_weather.is_empty());
    }

    #[test]
    fn records_without_uuid_are_dropped() {
        let data: CombinedData = serde_json::from_value(serde_json::json!({
            "fields": [
                {"uuid": "f1", "cropSeasonsV2": [
                    {"uuid": "cs1"},
                    {"crop": {"name": "Rice"}},
                    {"uuid": ""},
                    "not a season"
                ]},
                {"name": "no uuid"},
                {"uuid": null},
                {"uuid": "  "}
            ]
        }))
        .unwrap();

        assert_eq!(data.fields.len(), 1);
        let seasons: Vec<&str> = data.fields[0]
            .crop_seasons
            .iter()
            .map(|cs| cs.uuid.as_str())
            .collect();
        assert_eq!(seasons, vec!["cs1"]);
    }

    #[test]
    fn null_field_list_is_empty() {
        let data: CombinedData = serde_json::from_str(r#"{"fields": null}"#).unwrap();
        assert!(data.fields.is_empty());
    }
}
