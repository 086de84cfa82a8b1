use super::normalize::parse_instant;
use crate::models::{GroupedPrediction, GrowthStagePrediction, StageBar, Timeline, TimelineRow};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

/// A prediction with parsed bounds and a trimmed, non-empty index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPrediction {
    pub index: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub stage_name: String,
    pub source_count: usize,
}

/// Parse a prediction, or `None` when its index is empty or its start unparseable.
///
/// A missing, unparseable or non-positive end becomes `start + 1 day`.
pub fn normalize_prediction(prediction: &GrowthStagePrediction, tz: Tz) -> Option<NormalizedPrediction> {
    let index = prediction.index.trim();
    if index.is_empty() {
        tracing::debug!("Growth stage prediction without index skipped");
        return None;
    }

    let start = match parse_instant(&prediction.start_date, tz) {
        Ok(s) => s,
        Err(e) => {
            tracing::debug!("BBCH {} start date: {}, prediction skipped", index, e);
            return None;
        }
    };

    let end = match prediction
        .end_date
        .as_deref()
        .and_then(|raw| parse_instant(raw, tz).ok())
        .filter(|end| *end > start)
        .or_else(|| start.checked_add_signed(Duration::days(1)))
    {
        Some(end) => end,
        None => {
            tracing::debug!("BBCH {} start date out of range, prediction skipped", index);
            return None;
        }
    };

    Some(NormalizedPrediction {
        index: index.to_string(),
        start,
        end,
        stage_name: prediction.stage_name.clone(),
        source_count: prediction.source_count.max(1),
    })
}

fn numeric_value(index: &str) -> Option<f64> {
    index.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Order BBCH indices by numeric value; non-numeric indices sort last and
/// ties fall back to string order.
pub fn compare_bbch(a: &str, b: &str) -> Ordering {
    let by_value = match (numeric_value(a), numeric_value(b)) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_value.then_with(|| a.cmp(b))
}

pub fn sort_bbch_indices(indices: &mut Vec<String>) {
    indices.sort_by(|a, b| compare_bbch(a, b));
    indices.dedup();
}

/// Build stage bars for every group, one bar per matching prediction.
///
/// Groups without any usable prediction are left out entirely. Predictions
/// that overlap within a group are all kept. An empty filter enables every index.
pub fn build_timeline(groups: &[GroupedPrediction], enabled_stage_filter: &[String], tz: Tz) -> Timeline {
    let normalized: Vec<(&GroupedPrediction, Vec<NormalizedPrediction>)> = groups
        .iter()
        .filter_map(|group| {
            let predictions: Vec<NormalizedPrediction> = group
                .predictions
                .iter()
                .filter_map(|p| normalize_prediction(p, tz))
                .collect();
            if predictions.is_empty() {
                tracing::debug!("Group {} has no usable stage predictions", group.key);
                None
            } else {
                Some((group, predictions))
            }
        })
        .collect();

    let mut indices: Vec<String> = normalized
        .iter()
        .flat_map(|(_, preds)| preds.iter().map(|p| p.index.clone()))
        .collect();
    sort_bbch_indices(&mut indices);

    let enabled: HashSet<&str> = enabled_stage_filter.iter().map(|s| s.trim()).collect();
    indices.retain(|index| enabled.is_empty() || enabled.contains(index.as_str()));

    let mut timeline = Timeline {
        rows: normalized
            .iter()
            .map(|(group, _)| TimelineRow {
                key: group.key.clone(),
                label: group.label.clone(),
            })
            .collect(),
        ..Default::default()
    };

    for index in &indices {
        for (group, predictions) in &normalized {
            for p in predictions.iter().filter(|p| &p.index == index) {
                timeline.min_date = Some(timeline.min_date.map_or(p.start, |m| m.min(p.start)));
                timeline.max_date = Some(timeline.max_date.map_or(p.end, |m| m.max(p.end)));
                timeline.bars.push(StageBar {
                    group_key: group.key.clone(),
                    bbch_index: p.index.clone(),
                    start: p.start,
                    end: p.end,
                    stage_name: p.stage_name.clone(),
                    source_count: p.source_count,
                });
            }
        }
    }
    timeline.indices = indices;

    timeline
}

struct StageAccumulator {
    stage_name: String,
    start_ms: i128,
    end_ms: i128,
    samples: i128,
    members: HashSet<usize>,
}

/// Average member groups into one group: per BBCH index, the mean start and
/// mean end over every usable member prediction for that index.
///
/// Each resulting prediction's `source_count` is the number of members that
/// contributed to it. Returns `None` when no member has a usable prediction.
pub fn average_groups(
    key: impl Into<String>,
    label: impl Into<String>,
    members: &[GroupedPrediction],
    tz: Tz,
) -> Option<GroupedPrediction> {
    let mut by_index: BTreeMap<String, StageAccumulator> = BTreeMap::new();

    for (member_idx, member) in members.iter().enumerate() {
        for p in member.predictions.iter().filter_map(|p| normalize_prediction(p, tz)) {
            let acc = by_index.entry(p.index.clone()).or_insert_with(|| StageAccumulator {
                stage_name: p.stage_name.clone(),
                start_ms: 0,
                end_ms: 0,
                samples: 0,
                members: HashSet::new(),
            });
            acc.start_ms += p.start.timestamp_millis() as i128;
            acc.end_ms += p.end.timestamp_millis() as i128;
            acc.samples += 1;
            acc.members.insert(member_idx);
        }
    }

    if by_index.is_empty() {
        return None;
    }

    let mut indices: Vec<String> = by_index.keys().cloned().collect();
    sort_bbch_indices(&mut indices);

    let mut averaged = GroupedPrediction::new(key, label);
    for index in indices {
        let Some(acc) = by_index.get(&index) else {
            continue;
        };
        let start = DateTime::<Utc>::from_timestamp_millis((acc.start_ms / acc.samples) as i64);
        let end = DateTime::<Utc>::from_timestamp_millis((acc.end_ms / acc.samples) as i64);
        let (Some(start), Some(end)) = (start, end) else {
            continue;
        };
        averaged.predictions.push(GrowthStagePrediction {
            index,
            start_date: start.to_rfc3339(),
            end_date: Some(end.to_rfc3339()),
            stage_name: acc.stage_name.clone(),
            source_count: acc.members.len(),
        });
    }

    Some(averaged)
}
