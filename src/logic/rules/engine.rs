use super::{
    field_location::FieldLocationRule, growth_stage::GrowthStageRule, spray_window::SprayWindowRule,
    Rule, SeasonContext,
};
use crate::models::Recommendation;

pub struct RulesEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl RulesEngine {
    pub fn new() -> Self {
        let rules: Vec<Box<dyn Rule>> = vec![
            Box::new(SprayWindowRule),
            Box::new(GrowthStageRule),
            Box::new(FieldLocationRule),
        ];

        Self { rules }
    }

    pub fn evaluate(&self, ctx: &SeasonContext<'_>) -> Vec<Recommendation> {
        self.rules
            .iter()
            .filter_map(|rule| rule.evaluate(ctx))
            .collect()
    }

    pub fn evaluate_rule(&self, rule_id: &str, ctx: &SeasonContext<'_>) -> Option<Recommendation> {
        self.rules
            .iter()
            .find(|r| r.id() == rule_id)
            .and_then(|rule| rule.evaluate(ctx))
    }

    pub fn list_rules(&self) -> Vec<(&'static str, &'static str)> {
        self.rules.iter().map(|r| (r.id(), r.name())).collect()
    }
}

impl Default for RulesEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::rules::test_support::context;
    use crate::models::Timeline;
    use chrono::{TimeZone, Utc};

    #[test]
    fn lists_all_rules() {
        let ids: Vec<&str> = RulesEngine::new().list_rules().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec!["spray_window", "growth_stage", "field_location"]);
    }

    #[test]
    fn evaluates_by_id() {
        let engine = RulesEngine::default();
        let timeline = Timeline::default();
        let as_of = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let mut ctx = context(as_of, &[], &timeline);
        ctx.located = false;

        assert!(engine.evaluate_rule("field_location", &ctx).is_some());
        assert!(engine.evaluate_rule("unknown", &ctx).is_none());
        assert_eq!(engine.evaluate(&ctx).len(), 1);
    }
}
