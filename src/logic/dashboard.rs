//! Assembles every derived view for one combined-fetch export.

use super::clustering::partition_fields;
use super::field_location::field_candidate;
use super::rules::{RulesEngine, SeasonContext};
use super::spray_schedule::build_spray_plans;
use super::stage_timeline::{average_groups, build_timeline};
use super::weather_summary::summarize_daily;
use crate::config::Config;
use crate::error::Result;
use crate::models::{
    ClusterPartition, CombinedData, CropSeasonRecord, DailySprayPlan, DailyWeather,
    FieldRecord, GroupedPrediction, HourlyWeather, Recommendation, Timeline,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub tz: Tz,
    /// `None` disables clustering
    pub radius_km: Option<f64>,
    pub enabled_stages: Vec<String>,
    pub average_by_cluster: bool,
    pub prefer_possible: bool,
    pub as_of: DateTime<Utc>,
}

impl DashboardOptions {
    pub fn from_config(config: &Config, as_of: DateTime<Utc>) -> Result<Self> {
        Ok(Self {
            tz: config.tz()?,
            radius_km: config
                .clustering
                .enabled
                .then_some(config.clustering.radius_km),
            enabled_stages: config.timeline.enabled_stages.clone(),
            average_by_cluster: config.timeline.average_by_cluster,
            prefer_possible: config.spray.prefer_possible,
            as_of,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub season_uuid: String,
    pub field_id: String,
    pub field_name: String,
    pub crop_name: Option<String>,
    pub cluster_id: Option<String>,
    /// Timeline row for this season's stages
    pub timeline_key: String,
    pub spray_plans: Vec<DailySprayPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub as_of: DateTime<Utc>,
    pub timezone: String,
    pub partition: ClusterPartition,
    pub seasons: Vec<SeasonSummary>,
    pub timeline: Timeline,
    pub weather: Vec<DailyWeather>,
    pub recommendations: Vec<Recommendation>,
}

fn season_label(field: &FieldRecord, season: &CropSeasonRecord) -> String {
    match season.crop_name() {
        Some(crop) => format!("{} / {}", field.display_name(), crop),
        None => field.display_name().to_string(),
    }
}

/// One prediction group per crop season, keyed by season uuid.
pub fn season_groups(data: &CombinedData) -> Vec<GroupedPrediction> {
    data.fields
        .iter()
        .flat_map(|field| {
            field.crop_seasons.iter().map(move |season| GroupedPrediction {
                key: season.uuid.clone(),
                label: season_label(field, season),
                predictions: season.stage_predictions(),
            })
        })
        .collect()
}

/// Replace the seasons of clustered fields with one averaged group per
/// (cluster, crop). Returns the groups and each season's timeline key.
pub fn cluster_average_groups(
    data: &CombinedData,
    partition: &ClusterPartition,
    tz: Tz,
) -> (Vec<GroupedPrediction>, HashMap<String, String>) {
    let mut groups = Vec::new();
    let mut keys = HashMap::new();
    let mut buckets: BTreeMap<(usize, String), Vec<(String, GroupedPrediction)>> = BTreeMap::new();

    for field in &data.fields {
        let cluster = partition
            .clusters
            .iter()
            .enumerate()
            .find(|(_, c)| c.contains(&field.uuid));

        for season in &field.crop_seasons {
            let group = GroupedPrediction {
                key: season.uuid.clone(),
                label: season_label(field, season),
                predictions: season.stage_predictions(),
            };
            match cluster {
                Some((idx, _)) => {
                    let crop = season.crop_name().unwrap_or("").to_string();
                    buckets
                        .entry((idx, crop))
                        .or_default()
                        .push((season.uuid.clone(), group));
                }
                None => {
                    keys.insert(season.uuid.clone(), season.uuid.clone());
                    groups.push(group);
                }
            }
        }
    }

    for ((idx, crop), members) in buckets {
        let cluster = &partition.clusters[idx];
        let key = if crop.is_empty() {
            cluster.id.clone()
        } else {
            format!("{}:{}", cluster.id, crop)
        };
        let label = if crop.is_empty() {
            format!("{} ({} fields)", cluster.id, cluster.len())
        } else {
            format!("{} / {} ({} fields)", cluster.id, crop, cluster.len())
        };

        let member_groups: Vec<GroupedPrediction> = members.iter().map(|(_, g)| g.clone()).collect();
        if let Some(averaged) = average_groups(key.clone(), label, &member_groups, tz) {
            groups.push(averaged);
        }
        for (season_uuid, _) in members {
            keys.insert(season_uuid, key.clone());
        }
    }

    (groups, keys)
}

pub fn build_dashboard(
    data: &CombinedData,
    weather: &[HourlyWeather],
    opts: &DashboardOptions,
) -> Result<Dashboard> {
    let candidates: Vec<_> = data.fields.iter().map(field_candidate).collect();
    let located: HashSet<&str> = candidates
        .iter()
        .filter(|c| c.located().is_some())
        .map(|c| c.id.as_str())
        .collect();

    let partition = match opts.radius_km {
        Some(radius) => partition_fields(&candidates, radius)?,
        None => ClusterPartition::default(),
    };

    let (groups, timeline_keys) = if opts.average_by_cluster && opts.radius_km.is_some() {
        cluster_average_groups(data, &partition, opts.tz)
    } else {
        let groups = season_groups(data);
        let keys = groups.iter().map(|g| (g.key.clone(), g.key.clone())).collect();
        (groups, keys)
    };
    let timeline = build_timeline(&groups, &opts.enabled_stages, opts.tz);

    let seasons: Vec<SeasonSummary> = data
        .fields
        .iter()
        .flat_map(|field| {
            let cluster_id = partition.cluster_of(&field.uuid).map(|c| c.id.clone());
            let timeline_keys = &timeline_keys;
            field.crop_seasons.iter().map(move |season| SeasonSummary {
                season_uuid: season.uuid.clone(),
                field_id: field.uuid.clone(),
                field_name: field.display_name().to_string(),
                crop_name: season.crop_name().map(str::to_string),
                cluster_id: cluster_id.clone(),
                timeline_key: timeline_keys
                    .get(&season.uuid)
                    .cloned()
                    .unwrap_or_else(|| season.uuid.clone()),
                spray_plans: build_spray_plans(&season.spray_weather, opts.tz),
            })
        })
        .collect();

    let engine = RulesEngine::new();
    let mut seen = HashSet::new();
    let mut recommendations: Vec<Recommendation> = seasons
        .iter()
        .flat_map(|s| {
            let ctx = SeasonContext {
                season_uuid: &s.season_uuid,
                field_id: &s.field_id,
                field_name: &s.field_name,
                crop_name: s.crop_name.as_deref(),
                as_of: opts.as_of,
                tz: opts.tz,
                spray_plans: &s.spray_plans,
                timeline: &timeline,
                timeline_key: &s.timeline_key,
                located: located.contains(s.field_id.as_str()),
                prefer_possible: opts.prefer_possible,
            };
            engine.evaluate(&ctx)
        })
        .filter(|r| seen.insert((r.id.clone(), r.subject.clone())))
        .collect();
    recommendations.sort_by(|a, b| {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.subject.cmp(&b.subject))
            .then_with(|| a.id.cmp(&b.id))
    });

    tracing::info!(
        "Dashboard: {} fields, {} seasons, {} stage bars, {} recommendations",
        data.fields.len(),
        seasons.len(),
        timeline.bars.len(),
        recommendations.len()
    );

    Ok(Dashboard {
        as_of: opts.as_of,
        timezone: opts.tz.name().to_string(),
        partition,
        seasons,
        timeline,
        weather: summarize_daily(weather, opts.tz),
        recommendations,
    })
}
