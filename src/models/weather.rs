use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One hourly weather record as supplied by the weather fetch
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourlyWeather {
    pub start_datetime: Option<String>,
    #[serde(default)]
    pub end_datetime: Option<String>,
    #[serde(default)]
    pub air_temp_c_avg: Option<f64>,
    #[serde(default)]
    pub precipitation_best_mm: Option<f64>,
    #[serde(default)]
    pub wind_speed_m_s_avg: Option<f64>,
    #[serde(default)]
    pub wind_direction_deg: Option<f64>,
    #[serde(default)]
    pub relative_humidity_pct_avg: Option<f64>,
    #[serde(default)]
    pub leaf_wetness_bool: Option<bool>,
}

/// Aggregated local-day weather
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyWeather {
    pub date: NaiveDate,
    pub hours: usize,
    pub temp_min_c: Option<f64>,
    pub temp_max_c: Option<f64>,
    pub temp_avg_c: Option<f64>,
    pub total_precipitation_mm: f64,
    pub avg_wind_speed_m_s: Option<f64>,
    pub max_wind_speed_m_s: Option<f64>,
    pub avg_humidity_pct: Option<f64>,
    pub leaf_wet_hours: usize,
}

impl DailyWeather {
    pub fn is_dry(&self, threshold_mm: f64) -> bool {
        self.total_precipitation_mm < threshold_mm
    }
}
