use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One predicted BBCH stage for a crop season (dates still unparsed)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrowthStagePrediction {
    pub index: String,
    pub start_date: String,
    pub end_date: Option<String>,
    pub stage_name: String,
    /// Number of underlying fields this prediction stands for
    #[serde(default = "default_source_count")]
    pub source_count: usize,
}

fn default_source_count() -> usize {
    1
}

impl GrowthStagePrediction {
    pub fn new(
        index: impl Into<String>,
        start_date: impl Into<String>,
        end_date: Option<&str>,
        stage_name: impl Into<String>,
    ) -> Self {
        Self {
            index: index.into(),
            start_date: start_date.into(),
            end_date: end_date.map(str::to_string),
            stage_name: stage_name.into(),
            source_count: 1,
        }
    }
}

/// Predictions for one timeline row: a field season, or a cluster average
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedPrediction {
    pub key: String,
    pub label: String,
    pub predictions: Vec<GrowthStagePrediction>,
}

impl GroupedPrediction {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            predictions: Vec::new(),
        }
    }

    pub fn with_prediction(mut self, prediction: GrowthStagePrediction) -> Self {
        self.predictions.push(prediction);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageBar {
    pub group_key: String,
    pub bbch_index: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub stage_name: String,
    pub source_count: usize,
}

impl StageBar {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    pub fn is_averaged(&self) -> bool {
        self.source_count > 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineRow {
    pub key: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Timeline {
    /// Groups with at least one usable prediction, in input order
    pub rows: Vec<TimelineRow>,
    /// Distinct BBCH indices in plotting order
    pub indices: Vec<String>,
    pub bars: Vec<StageBar>,
    pub min_date: Option<DateTime<Utc>>,
    pub max_date: Option<DateTime<Utc>>,
}

impl Timeline {
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars_for<'a>(&'a self, group_key: &'a str) -> impl Iterator<Item = &'a StageBar> + 'a {
        self.bars.iter().filter(move |b| b.group_key == group_key)
    }

    /// Stage bar for `group_key` that covers `instant`, latest start wins
    pub fn stage_at(&self, group_key: &str, instant: DateTime<Utc>) -> Option<&StageBar> {
        self.bars
            .iter()
            .filter(|b| b.group_key == group_key && b.contains(instant))
            .max_by_key(|b| b.start)
    }

    /// First stage for `group_key` starting after `instant`
    pub fn next_stage_after(&self, group_key: &str, instant: DateTime<Utc>) -> Option<&StageBar> {
        self.bars
            .iter()
            .filter(|b| b.group_key == group_key && b.start > instant)
            .min_by_key(|b| b.start)
    }
}
