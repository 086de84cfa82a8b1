use crate::error::{AgroDashError, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// IANA zone used to derive day and hour keys
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub clustering: ClusteringConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub spray: SprayConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClusteringConfig {
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            radius_km: default_radius_km(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TimelineConfig {
    /// BBCH indices to plot; empty means all
    #[serde(default)]
    pub enabled_stages: Vec<String>,
    #[serde(default)]
    pub average_by_cluster: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SprayConfig {
    /// Fall back to "possible" windows when no recommended window exists
    #[serde(default = "default_enabled")]
    pub prefer_possible: bool,
}

impl Default for SprayConfig {
    fn default() -> Self {
        Self {
            prefer_possible: true,
        }
    }
}

fn default_timezone() -> String {
    "Asia/Tokyo".to_string()
}

fn default_radius_km() -> f64 {
    5.0
}

fn default_enabled() -> bool {
    true
}

impl Config {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p,
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            return Err(AgroDashError::NotFound(format!(
                "Config file not found at {:?}. Run `agrodash init` to create one.",
                config_path
            )));
        }

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| AgroDashError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&config_str)
    }

    /// Parse and validate a YAML document, substituting `${VAR}` placeholders first.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content);

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| AgroDashError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load from the standard locations, falling back to defaults when no file exists.
    ///
    /// An explicit path that does not exist is an error, not a fallback.
    pub fn load_or_default(config_override: Option<PathBuf>) -> Result<Self> {
        let explicit = config_override.is_some();
        match Self::load(config_override) {
            Ok(c) => Ok(c),
            Err(AgroDashError::NotFound(msg)) if !explicit => {
                tracing::warn!("{} Using built-in defaults.", msg);
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.tz()?;

        if !(self.clustering.radius_km.is_finite() && self.clustering.radius_km > 0.0) {
            return Err(AgroDashError::Config(format!(
                "clustering.radius_km must be > 0, got {}",
                self.clustering.radius_km
            )));
        }

        if self
            .timeline
            .enabled_stages
            .iter()
            .any(|s| s.trim().is_empty())
        {
            return Err(AgroDashError::Config(
                "timeline.enabled_stages must not contain empty entries".into(),
            ));
        }

        Ok(())
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|e| {
            AgroDashError::Config(format!("Unknown timezone '{}': {}", self.timezone, e))
        })
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("agrodash").join("config.yaml");
            if xdg_config.exists() {
                return Ok(xdg_config);
            }
        }

        Self::default_config_path()
    }

    /// Default path for writing new config files (~/.config/agrodash/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AgroDashError::Config("Cannot determine config directory".into()))?
            .join("agrodash");
        Ok(config_dir.join("config.yaml"))
    }

    /// Write the default configuration to `path` (or the XDG default) and return the path.
    pub fn write_default(path: Option<PathBuf>) -> Result<PathBuf> {
        let config_path = match path {
            Some(p) => p,
            None => Self::default_config_path()?,
        };
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&Self::default())
            .map_err(|e| AgroDashError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# AgroDash Configuration\n# Generated by `agrodash init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(&config_path, content)?;

        Ok(config_path)
    }

    fn substitute_env_vars(content: &str) -> String {
        let mut result = content.to_string();

        let re = match regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") {
            Ok(re) => re,
            Err(_) => return result,
        };

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        result
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            clustering: ClusteringConfig::default(),
            timeline: TimelineConfig::default(),
            spray: SprayConfig::default(),
        }
    }
}
