//! famcal configuration.

use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use config::{Config, Environment, File};
use famcal_core::constants::{DEFAULT_HORIZON_YEARS, DEFAULT_MAX_OCCURRENCES};
use famcal_core::error::{FamcalError, FamcalResult};
use famcal_core::{ConflictDetector, ExpansionLimits};
use serde::{Deserialize, Serialize};

static DEFAULT_EVENTS_FILE: &str = "~/.local/share/famcal/events.json";
static DEFAULT_EVENT_DURATION: &str = "1h";

fn default_events_file() -> PathBuf {
    PathBuf::from(DEFAULT_EVENTS_FILE)
}

fn default_max_occurrences() -> u32 {
    DEFAULT_MAX_OCCURRENCES
}

fn default_horizon_years() -> u32 {
    DEFAULT_HORIZON_YEARS
}

fn default_event_duration() -> String {
    DEFAULT_EVENT_DURATION.to_string()
}

/// Configuration at ~/.config/famcal/config.toml
///
/// Every key can also be set through a `FAMCAL_`-prefixed environment
/// variable, e.g. `FAMCAL_MAX_OCCURRENCES=100`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FamcalConfig {
    /// JSON export of the family's events
    #[serde(default = "default_events_file")]
    pub events_file: PathBuf,

    #[serde(default = "default_max_occurrences")]
    pub max_occurrences: u32,

    #[serde(default = "default_horizon_years")]
    pub horizon_years: u32,

    /// Assumed length of events without an end time (e.g. "1h", "45m")
    #[serde(default = "default_event_duration")]
    pub default_duration: String,
}

impl Default for FamcalConfig {
    fn default() -> Self {
        FamcalConfig {
            events_file: default_events_file(),
            max_occurrences: default_max_occurrences(),
            horizon_years: default_horizon_years(),
            default_duration: default_event_duration(),
        }
    }
}

impl FamcalConfig {
    pub fn config_path() -> FamcalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| FamcalError::Config("Could not determine config directory".into()))?
            .join("famcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config from `path`, or from the default location. A missing
    /// default config file is created with every option commented out.
    pub fn load(path: Option<&Path>) -> FamcalResult<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = Self::config_path()?;
                if !default_path.exists() {
                    if let Err(e) = Self::create_default_config(&default_path) {
                        tracing::warn!(path = %default_path.display(), error = %e, "could not create default config");
                    }
                }
                default_path
            }
        };

        let config: FamcalConfig = Config::builder()
            .add_source(File::from(path.as_path()).required(false))
            .add_source(Environment::with_prefix("FAMCAL").try_parsing(true))
            .build()
            .map_err(|e| FamcalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| FamcalError::Config(e.to_string()))?;

        tracing::debug!(path = %path.display(), ?config, "configuration loaded");

        Ok(config)
    }

    /// Path of the events file with `~` expanded.
    pub fn events_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.events_file.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    pub fn expansion_limits(&self) -> ExpansionLimits {
        ExpansionLimits {
            max_occurrences: self.max_occurrences,
            horizon_years: self.horizon_years,
        }
    }

    pub fn conflict_detector(&self) -> FamcalResult<ConflictDetector> {
        let std_duration = humantime::parse_duration(&self.default_duration).map_err(|e| {
            FamcalError::Config(format!(
                "Invalid default_duration '{}': {e}",
                self.default_duration
            ))
        })?;

        let duration = TimeDelta::from_std(std_duration)
            .map_err(|e| FamcalError::Config(format!("default_duration out of range: {e}")))?;

        Ok(ConflictDetector::new(duration))
    }

    /// The effective settings as TOML.
    pub fn to_toml(&self) -> FamcalResult<String> {
        toml::to_string_pretty(self).map_err(|e| FamcalError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> FamcalResult<()> {
        let contents = format!(
            "\
# famcal configuration

# JSON export of your family's events:
# events_file = \"{DEFAULT_EVENTS_FILE}\"

# Safety limits for expanding recurring events:
# max_occurrences = {DEFAULT_MAX_OCCURRENCES}
# horizon_years = {DEFAULT_HORIZON_YEARS}

# Length assumed for events without an end time:
# default_duration = \"{DEFAULT_EVENT_DURATION}\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;

        Ok(())
    }
}
