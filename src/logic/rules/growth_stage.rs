use super::{Rule, SeasonContext};
use crate::models::{Recommendation, RecommendationCategory, Severity, StageBar};
use chrono::Utc;

/// Expected BBCH stage at the as-of instant, with the next stage when known
pub struct GrowthStageRule;

impl Rule for GrowthStageRule {
    fn id(&self) -> &'static str {
        "growth_stage"
    }

    fn name(&self) -> &'static str {
        "Expected Growth Stage"
    }

    fn evaluate(&self, ctx: &SeasonContext<'_>) -> Option<Recommendation> {
        let current = ctx.timeline.stage_at(ctx.timeline_key, ctx.as_of);
        let next = ctx.timeline.next_stage_after(ctx.timeline_key, ctx.as_of);

        match (current, next) {
            (Some(stage), next) => Some(self.current_stage(ctx, stage, next)),
            (None, Some(next)) => Some(self.upcoming_stage(ctx, next)),
            (None, None) => None,
        }
    }
}

fn local_date(ctx: &SeasonContext<'_>, instant: chrono::DateTime<Utc>) -> String {
    instant.with_timezone(&ctx.tz).format("%Y-%m-%d").to_string()
}

impl GrowthStageRule {
    fn current_stage(
        &self,
        ctx: &SeasonContext<'_>,
        stage: &StageBar,
        next: Option<&StageBar>,
    ) -> Recommendation {
        let mut description = format!(
            "{} is expected at BBCH {} ({}) until {}.",
            ctx.subject_label(),
            stage.bbch_index,
            stage.stage_name,
            local_date(ctx, stage.end)
        );
        if stage.is_averaged() {
            description.push_str(&format!(
                " Averaged over {} fields in the same cluster.",
                stage.source_count
            ));
        }

        let mut rec = Recommendation::new(
            self.id(),
            ctx.season_uuid,
            RecommendationCategory::GrowthStage,
            Severity::Info,
            format!("Growth stage: BBCH {} {}", stage.bbch_index, stage.stage_name),
            description,
        )
        .with_data_point("Stage start", local_date(ctx, stage.start), "stage prediction")
        .with_data_point("Stage end", local_date(ctx, stage.end), "stage prediction");

        if let Some(next) = next {
            rec = rec
                .with_data_point(
                    "Next stage",
                    format!("BBCH {} {}", next.bbch_index, next.stage_name),
                    "stage prediction",
                )
                .with_data_point("Next stage from", local_date(ctx, next.start), "stage prediction");
        }
        rec
    }

    fn upcoming_stage(&self, ctx: &SeasonContext<'_>, next: &StageBar) -> Recommendation {
        Recommendation::new(
            self.id(),
            ctx.season_uuid,
            RecommendationCategory::GrowthStage,
            Severity::Info,
            format!("Upcoming stage: BBCH {} {}", next.bbch_index, next.stage_name),
            format!(
                "No stage is predicted for {} right now; BBCH {} is expected from {}.",
                ctx.subject_label(),
                next.bbch_index,
                local_date(ctx, next.start)
            ),
        )
        .with_data_point("Stage start", local_date(ctx, next.start), "stage prediction")
    }
}
