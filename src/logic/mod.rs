pub mod clustering;
pub mod dashboard;
pub mod field_location;
pub mod interval_merge;
pub mod normalize;
pub mod rules;
pub mod spray_schedule;
pub mod stage_timeline;
pub mod weather_summary;

pub use clustering::{cluster, partition_fields};
pub use dashboard::{build_dashboard, Dashboard, DashboardOptions};
pub use interval_merge::merge;
pub use normalize::{normalize_timestamp, HourKey};
pub use rules::RulesEngine;
pub use spray_schedule::build_spray_plans;
pub use stage_timeline::{average_groups, build_timeline};
pub use weather_summary::summarize_daily;
