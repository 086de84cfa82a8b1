use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Hourly spraying suitability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Suitability {
    Recommended,
    Possible,
    #[default]
    NotRecommended,
}

impl Suitability {
    /// Map a raw result code onto the closed suitability set.
    ///
    /// The legacy `moderate` code is folded into `Possible`; anything
    /// unrecognised counts as `NotRecommended`.
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_uppercase().replace(['-', ' '], "_").as_str() {
            "RECOMMENDED" => Suitability::Recommended,
            "POSSIBLE" | "MODERATE" => Suitability::Possible,
            _ => Suitability::NotRecommended,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Suitability::Recommended => "Recommended",
            Suitability::Possible => "Possible",
            Suitability::NotRecommended => "Not Recommended",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Suitability::Recommended => "●",
            Suitability::Possible => "◐",
            Suitability::NotRecommended => "·",
        }
    }

    /// Window type this suitability contributes to, `None` for a gap
    pub fn window_type(&self) -> Option<WindowType> {
        match self {
            Suitability::Recommended => Some(WindowType::Recommended),
            Suitability::Possible => Some(WindowType::Possible),
            Suitability::NotRecommended => None,
        }
    }
}

impl std::fmt::Display for Suitability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WindowType {
    Recommended,
    Possible,
}

impl WindowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowType::Recommended => "Recommended",
            WindowType::Possible => "Possible",
        }
    }
}

impl std::fmt::Display for WindowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub const LAST_HOUR: u32 = 23;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyClassification {
    pub hour: u32, // 0-23
    pub result: Suitability,
}

impl HourlyClassification {
    /// `None` unless `hour` is within the day (0-23).
    pub fn new(hour: u32, result: Suitability) -> Option<Self> {
        (hour <= LAST_HOUR).then_some(Self { hour, result })
    }

    /// Build from an untyped hour, dropping non-finite, fractional or out-of-day values.
    pub fn from_raw(hour: f64, code: &str) -> Option<Self> {
        if !hour.is_finite() || hour.fract() != 0.0 || !(0.0..=23.0).contains(&hour) {
            return None;
        }
        Self::new(hour as u32, Suitability::from_code(code))
    }
}

/// A contiguous run of same-typed hours. `end` is the last included hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprayWindow {
    pub start: u32,
    pub end: u32,
    #[serde(rename = "type")]
    pub window_type: WindowType,
}

impl SprayWindow {
    /// Exclusive boundary for display (`end + 1`, so a window ending at 23 shows 24:00)
    pub fn display_end(&self) -> u32 {
        self.end + 1
    }

    pub fn hours(&self) -> u32 {
        self.end - self.start + 1
    }

    pub fn label(&self) -> String {
        format!("{:02}:00-{:02}:00", self.start, self.display_end())
    }
}

/// Per-factor breakdown attached to an hourly spray classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SprayFactor {
    pub factor: String,
    pub result: Suitability,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprayHour {
    pub hour: u32,
    pub result: Suitability,
    pub factors: Vec<SprayFactor>,
}

/// Spray classifications and merged windows for one local day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySprayPlan {
    pub date: NaiveDate,
    pub hours: Vec<SprayHour>,
    pub windows: Vec<SprayWindow>,
}

impl DailySprayPlan {
    pub fn first_window_of(&self, window_type: WindowType) -> Option<&SprayWindow> {
        self.windows.iter().find(|w| w.window_type == window_type)
    }

    pub fn recommended_hours(&self) -> u32 {
        self.windows
            .iter()
            .filter(|w| w.window_type == WindowType::Recommended)
            .map(|w| w.hours())
            .sum()
    }
}
