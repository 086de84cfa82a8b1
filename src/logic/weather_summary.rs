use super::normalize::normalize_or_skip;
use crate::models::{DailyWeather, HourlyWeather};
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::collections::BTreeMap;

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn finite(values: impl Iterator<Item = Option<f64>>) -> Vec<f64> {
    values.flatten().filter(|v| v.is_finite()).collect()
}

/// Aggregate hourly records into local days, sorted by date.
pub fn summarize_daily(records: &[HourlyWeather], tz: Tz) -> Vec<DailyWeather> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&HourlyWeather>> = BTreeMap::new();
    for record in records {
        if let Some(key) = normalize_or_skip(record.start_datetime.as_deref(), tz, "weather") {
            by_date.entry(key.date).or_default().push(record);
        }
    }

    by_date
        .into_iter()
        .map(|(date, hours)| aggregate_day(date, &hours))
        .collect()
}

fn aggregate_day(date: NaiveDate, hours: &[&HourlyWeather]) -> DailyWeather {
    let temps = finite(hours.iter().map(|h| h.air_temp_c_avg));
    let winds = finite(hours.iter().map(|h| h.wind_speed_m_s_avg));
    let humidity = finite(hours.iter().map(|h| h.relative_humidity_pct_avg));
    let precipitation = finite(hours.iter().map(|h| h.precipitation_best_mm));

    DailyWeather {
        date,
        hours: hours.len(),
        temp_min_c: temps.iter().copied().reduce(f64::min),
        temp_max_c: temps.iter().copied().reduce(f64::max),
        temp_avg_c: mean(&temps),
        total_precipitation_mm: precipitation.iter().filter(|p| **p >= 0.0).sum(),
        avg_wind_speed_m_s: mean(&winds),
        max_wind_speed_m_s: winds.iter().copied().reduce(f64::max),
        avg_humidity_pct: mean(&humidity),
        leaf_wet_hours: hours
            .iter()
            .filter(|h| h.leaf_wetness_bool == Some(true))
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::{Asia, UTC};

    fn hour(start: &str, temp: Option<f64>, rain: Option<f64>) -> HourlyWeather {
        HourlyWeather {
            start_datetime: Some(start.to_string()),
            air_temp_c_avg: temp,
            precipitation_best_mm: rain,
            wind_speed_m_s_avg: Some(2.0),
            ..Default::default()
        }
    }

    #[test]
    fn aggregates_by_local_day() {
        let records = vec![
            hour("2024-05-01T00:00:00Z", Some(12.0), Some(0.5)),
            hour("2024-05-01T01:00:00Z", Some(16.0), Some(1.0)),
            hour("2024-05-01T15:00:00Z", Some(9.0), None),
        ];
        let days = summarize_daily(&records, Asia::Tokyo);
        assert_eq!(days.len(), 2);

        let first = &days[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(first.hours, 2);
        assert_eq!(first.temp_min_c, Some(12.0));
        assert_eq!(first.temp_max_c, Some(16.0));
        assert_eq!(first.temp_avg_c, Some(14.0));
        assert!((first.total_precipitation_mm - 1.5).abs() < 1e-9);
        assert!(!first.is_dry(1.0));

        // 15:00 UTC is midnight of the next day in Tokyo
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert!(days[1].is_dry(0.1));
    }

    #[test]
    fn missing_values_are_skipped_per_metric() {
        let mut wet = hour("2024-05-01T03:00:00Z", None, None);
        wet.leaf_wetness_bool = Some(true);
        wet.wind_speed_m_s_avg = Some(6.0);
        let records = vec![wet, hour("2024-05-01T04:00:00Z", Some(f64::NAN), None)];

        let day = &summarize_daily(&records, UTC)[0];
        assert_eq!(day.temp_avg_c, None);
        assert_eq!(day.leaf_wet_hours, 1);
        assert_eq!(day.max_wind_speed_m_s, Some(6.0));
        assert_eq!(day.avg_wind_speed_m_s, Some(4.0));
    }

    #[test]
    fn records_without_valid_start_are_dropped() {
        let records = vec![HourlyWeather::default(), hour("bad", Some(1.0), None)];
        assert!(summarize_daily(&records, UTC).is_empty());
    }
}
