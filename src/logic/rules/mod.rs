pub mod engine;
pub mod field_location;
pub mod growth_stage;
pub mod spray_window;

pub use engine::RulesEngine;

use crate::models::{DailySprayPlan, Recommendation, Timeline};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Everything a rule may look at for one crop season
#[derive(Debug, Clone, Copy)]
pub struct SeasonContext<'a> {
    pub season_uuid: &'a str,
    pub field_id: &'a str,
    pub field_name: &'a str,
    pub crop_name: Option<&'a str>,
    pub as_of: DateTime<Utc>,
    pub tz: Tz,
    pub spray_plans: &'a [DailySprayPlan],
    pub timeline: &'a Timeline,
    /// Timeline row holding this season's stages (the season itself or its cluster average)
    pub timeline_key: &'a str,
    pub located: bool,
    pub prefer_possible: bool,
}

impl SeasonContext<'_> {
    pub fn subject_label(&self) -> String {
        match self.crop_name {
            Some(crop) => format!("{} ({})", self.field_name, crop),
            None => self.field_name.to_string(),
        }
    }
}

/// Trait for agronomic rules
pub trait Rule: Send + Sync {
    /// Unique identifier for this rule
    fn id(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Evaluate the rule and return a recommendation if conditions are met
    fn evaluate(&self, ctx: &SeasonContext<'_>) -> Option<Recommendation>;
}
