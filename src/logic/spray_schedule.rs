use super::interval_merge::merge;
use super::normalize::normalize_or_skip;
use crate::models::{
    DailySprayPlan, HourlyClassification, SprayFactor, SprayHour, SprayWeatherEntry, Suitability,
};
use chrono::NaiveDate;
use chrono_tz::Tz;
use std::collections::BTreeMap;

/// Group spray-weather entries into local days and merge each day into windows.
///
/// Entries whose `fromDate` cannot be parsed are dropped. Within a day the
/// first entry for an hour wins; later duplicates are ignored.
pub fn build_spray_plans(entries: &[SprayWeatherEntry], tz: Tz) -> Vec<DailySprayPlan> {
    let mut by_day: BTreeMap<NaiveDate, BTreeMap<u32, SprayHour>> = BTreeMap::new();

    for entry in entries {
        let Some(key) = normalize_or_skip(entry.from_date.as_deref(), tz, "sprayWeather") else {
            continue;
        };
        let result = Suitability::from_code(entry.result.as_deref().unwrap_or_default());

        by_day
            .entry(key.date)
            .or_default()
            .entry(key.hour)
            .or_insert_with(|| SprayHour {
                hour: key.hour,
                result,
                factors: entry
                    .factors
                    .iter()
                    .filter_map(|f| {
                        Some(SprayFactor {
                            factor: f.factor.clone()?,
                            result: Suitability::from_code(f.result.as_deref().unwrap_or_default()),
                        })
                    })
                    .collect(),
            });
    }

    by_day
        .into_iter()
        .map(|(date, hours)| {
            let hours: Vec<SprayHour> = hours.into_values().collect();
            let classifications: Vec<HourlyClassification> = hours
                .iter()
                .filter_map(|h| HourlyClassification::new(h.hour, h.result))
                .collect();
            DailySprayPlan {
                date,
                windows: merge(&classifications),
                hours,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawSprayFactor, WindowType};
    use chrono_tz::{Asia, UTC};

    fn entry(from: &str, result: &str) -> SprayWeatherEntry {
        SprayWeatherEntry {
            from_date: Some(from.to_string()),
            result: Some(result.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn groups_by_local_day_and_merges() {
        let entries = vec![
            entry("2024-05-01T06:00:00+09:00", "RECOMMENDED"),
            entry("2024-05-01T07:00:00+09:00", "RECOMMENDED"),
            entry("2024-05-01T08:00:00+09:00", "moderate"),
            entry("2024-05-01T09:00:00+09:00", "NOT_RECOMMENDED"),
            // 23:00 UTC on Apr 30 is 08:00 on May 1 in Tokyo; hour already taken
            entry("2024-04-30T23:00:00Z", "NOT_RECOMMENDED"),
            entry("2024-05-02T10:00:00+09:00", "POSSIBLE"),
        ];
        let plans = build_spray_plans(&entries, Asia::Tokyo);
        assert_eq!(plans.len(), 2);

        let first = &plans[0];
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(first.hours.len(), 4);
        assert_eq!(first.windows.len(), 2);
        assert_eq!(first.windows[0].start, 6);
        assert_eq!(first.windows[0].end, 7);
        assert_eq!(first.windows[1].window_type, WindowType::Possible);
        assert_eq!(first.recommended_hours(), 2);

        assert_eq!(plans[1].first_window_of(WindowType::Possible).unwrap().start, 10);
    }

    #[test]
    fn unparseable_entries_are_dropped() {
        let entries = vec![
            entry("yesterday", "RECOMMENDED"),
            SprayWeatherEntry::default(),
            entry("2024-05-01T05:00:00Z", "RECOMMENDED"),
        ];
        let plans = build_spray_plans(&entries, UTC);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].hours.len(), 1);
    }

    #[test]
    fn factors_are_kept_per_hour() {
        let mut e = entry("2024-05-01T05:00:00Z", "POSSIBLE");
        e.factors = vec![
            RawSprayFactor {
                factor: Some("WIND".into()),
                result: Some("POSSIBLE".into()),
            },
            RawSprayFactor {
                factor: None,
                result: Some("RECOMMENDED".into()),
            },
        ];
        let plans = build_spray_plans(&[e], UTC);
        let factors = &plans[0].hours[0].factors;
        assert_eq!(factors.len(), 1);
        assert_eq!(factors[0].factor, "WIND");
        assert_eq!(factors[0].result, Suitability::Possible);
    }

    #[test]
    fn empty_input() {
        assert!(build_spray_plans(&[], UTC).is_empty());
    }
}
