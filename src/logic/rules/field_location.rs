use super::{Rule, SeasonContext};
use crate::models::{Recommendation, RecommendationCategory, Severity};

/// Fields without usable coordinates get no shared weather or cluster view
pub struct FieldLocationRule;

impl Rule for FieldLocationRule {
    fn id(&self) -> &'static str {
        "field_location"
    }

    fn name(&self) -> &'static str {
        "Field Location Missing"
    }

    fn evaluate(&self, ctx: &SeasonContext<'_>) -> Option<Recommendation> {
        if ctx.located {
            return None;
        }

        Some(
            Recommendation::new(
                self.id(),
                ctx.field_id,
                RecommendationCategory::FieldLocation,
                Severity::Advisory,
                format!("Location unknown: {}", ctx.field_name),
                format!(
                    "{} has no usable coordinates and is listed separately from the field clusters.",
                    ctx.field_name
                ),
            )
            .with_action("Add a field boundary or centre point so it can be grouped with nearby fields."),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::rules::test_support::context;
    use crate::models::Timeline;
    use chrono::{TimeZone, Utc};

    #[test]
    fn only_fires_for_unlocated_fields() {
        let timeline = Timeline::default();
        let as_of = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let mut ctx = context(as_of, &[], &timeline);
        assert!(FieldLocationRule.evaluate(&ctx).is_none());

        ctx.located = false;
        let rec = FieldLocationRule.evaluate(&ctx).unwrap();
        assert_eq!(rec.subject, "f1");
        assert_eq!(rec.severity, Severity::Advisory);
    }
}
