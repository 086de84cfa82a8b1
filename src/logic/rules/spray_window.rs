use super::{Rule, SeasonContext};
use crate::models::{
    DailySprayPlan, Recommendation, RecommendationCategory, Severity, SprayWindow, WindowType,
};
use chrono::{NaiveDate, Timelike};

/// Next spray window from the as-of hour onward.
///
/// Recommended windows win; possible windows are offered only when no
/// recommended window remains and the context allows it. A forecast with no
/// remaining window at all produces a warning.
pub struct SprayWindowRule;

impl Rule for SprayWindowRule {
    fn id(&self) -> &'static str {
        "spray_window"
    }

    fn name(&self) -> &'static str {
        "Next Spray Window"
    }

    fn evaluate(&self, ctx: &SeasonContext<'_>) -> Option<Recommendation> {
        if ctx.spray_plans.is_empty() {
            return None;
        }

        let local = ctx.as_of.with_timezone(&ctx.tz);
        let today = local.date_naive();
        let hour = local.hour();

        let next = next_window(ctx.spray_plans, today, hour, WindowType::Recommended).or_else(|| {
            if ctx.prefer_possible {
                next_window(ctx.spray_plans, today, hour, WindowType::Possible)
            } else {
                None
            }
        });

        match next {
            Some((date, window)) => Some(self.window_found(ctx, date, window)),
            None => Some(self.no_window(ctx)),
        }
    }
}

/// First window of `window_type` that has not fully passed at `(today, hour)`
fn next_window(
    plans: &[DailySprayPlan],
    today: NaiveDate,
    hour: u32,
    window_type: WindowType,
) -> Option<(NaiveDate, SprayWindow)> {
    plans
        .iter()
        .filter(|p| p.date >= today)
        .flat_map(|p| p.windows.iter().map(move |w| (p.date, *w)))
        .find(|(date, w)| w.window_type == window_type && (*date > today || w.end >= hour))
}

impl SprayWindowRule {
    fn window_found(&self, ctx: &SeasonContext<'_>, date: NaiveDate, window: SprayWindow) -> Recommendation {
        let severity = match window.window_type {
            WindowType::Recommended => Severity::Info,
            WindowType::Possible => Severity::Advisory,
        };

        let title = format!(
            "{} spray window: {} {}",
            window.window_type,
            date.format("%b %d"),
            window.label()
        );

        let description = format!(
            "{} has a {} spraying window of {} hour(s) on {}.",
            ctx.subject_label(),
            window.window_type.as_str().to_lowercase(),
            window.hours(),
            date.format("%Y-%m-%d")
        );

        let mut rec = Recommendation::new(
            self.id(),
            ctx.season_uuid,
            RecommendationCategory::SprayTiming,
            severity,
            title,
            description,
        )
        .with_data_point("Date", date.format("%Y-%m-%d"), "sprayWeather")
        .with_data_point("Window", window.label(), "sprayWeather")
        .with_data_point("Type", window.window_type, "sprayWeather");

        rec = match window.window_type {
            WindowType::Recommended => {
                rec.with_action("Schedule the application inside this window.")
            }
            WindowType::Possible => rec.with_action(
                "Conditions are acceptable but not ideal. Check wind and rain before spraying.",
            ),
        };
        rec
    }

    fn no_window(&self, ctx: &SeasonContext<'_>) -> Recommendation {
        let days = ctx.spray_plans.len();
        Recommendation::new(
            self.id(),
            ctx.season_uuid,
            RecommendationCategory::SprayTiming,
            Severity::Warning,
            "No suitable spray window",
            format!(
                "No upcoming spraying window for {} in the {} day(s) of spray forecast.",
                ctx.subject_label(),
                days
            ),
        )
        .with_data_point("Forecast days", days, "sprayWeather")
        .with_action("Postpone spraying and re-check the forecast.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::rules::test_support::context;
    use crate::models::Timeline;
    use chrono::{TimeZone, Utc};

    fn plan(day: u32, windows: &[(u32, u32, WindowType)]) -> DailySprayPlan {
        DailySprayPlan {
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            hours: Vec::new(),
            windows: windows
                .iter()
                .map(|(start, end, window_type)| SprayWindow {
                    start: *start,
                    end: *end,
                    window_type: *window_type,
                })
                .collect(),
        }
    }

    #[test]
    fn no_plans_no_recommendation() {
        let timeline = Timeline::default();
        let as_of = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        assert!(SprayWindowRule.evaluate(&context(as_of, &[], &timeline)).is_none());
    }

    #[test]
    fn picks_next_recommended_window() {
        let plans = vec![
            plan(1, &[(5, 7, WindowType::Recommended), (9, 10, WindowType::Possible)]),
            plan(2, &[(6, 9, WindowType::Recommended)]),
        ];
        let timeline = Timeline::default();
        let as_of = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let rec = SprayWindowRule.evaluate(&context(as_of, &plans, &timeline)).unwrap();
        assert_eq!(rec.severity, Severity::Info);
        assert!(rec.title.contains("May 02"));
        assert!(rec.title.contains("06:00-10:00"));
    }

    #[test]
    fn window_in_progress_counts() {
        let plans = vec![plan(1, &[(5, 9, WindowType::Recommended)])];
        let timeline = Timeline::default();
        let as_of = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let rec = SprayWindowRule.evaluate(&context(as_of, &plans, &timeline)).unwrap();
        assert_eq!(rec.severity, Severity::Info);
    }

    #[test]
    fn falls_back_to_possible() {
        let plans = vec![plan(1, &[(5, 7, WindowType::Recommended), (12, 13, WindowType::Possible)])];
        let timeline = Timeline::default();
        let as_of = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        let rec = SprayWindowRule.evaluate(&context(as_of, &plans, &timeline)).unwrap();
        assert_eq!(rec.severity, Severity::Advisory);

        let mut ctx = context(as_of, &plans, &timeline);
        ctx.prefer_possible = false;
        let rec = SprayWindowRule.evaluate(&ctx).unwrap();
        assert_eq!(rec.severity, Severity::Warning);
    }

    #[test]
    fn past_windows_warn() {
        let plans = vec![plan(1, &[(5, 7, WindowType::Recommended)])];
        let timeline = Timeline::default();
        let as_of = Utc.with_ymd_and_hms(2024, 5, 3, 0, 0, 0).unwrap();
        let rec = SprayWindowRule.evaluate(&context(as_of, &plans, &timeline)).unwrap();
        assert_eq!(rec.severity, Severity::Warning);
        assert_eq!(rec.subject, "cs1");
    }
}
