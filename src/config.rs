/// Service configuration loaded from `nobild.toml`.
///
/// Every field has a default, so a missing file or a partial file is fine.
/// The API key may also come from the `NOBIL_API_KEY` environment variable
/// (populated from `.env` by the binary through dotenv).
///
/// ```toml
/// [feed]
/// url = "https://nobil.no/api/server/datadump.php"
/// timeout_secs = 300
///
/// [output]
/// directory = "/var/www/charging"
/// prefix = "ev_charger_stations"
/// legacy_combinatorial = false
///
/// [service]
/// retry_delay_secs = 3600
/// converter = "gpsbabel"
///
/// [logging]
/// level = "info"
/// file = "/var/log/nobild.log"
/// ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::ingest::nobil::DEFAULT_DATADUMP_URL;
use crate::model::ServiceError;

/// Environment variable consulted when no key is configured.
pub const API_KEY_ENV: &str = "NOBIL_API_KEY";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub feed: FeedConfig,
    pub output: OutputConfig,
    pub service: SupervisorConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            url: DEFAULT_DATADUMP_URL.to_string(),
            api_key: None,
            timeout_secs: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub directory: PathBuf,
    /// Base name of every written file.
    pub prefix: String,
    /// Also write one GPX/KML pair per filter combination.
    pub legacy_combinatorial: bool,
    /// Write `<prefix>_report.json` after each cycle.
    pub write_report: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            directory: PathBuf::from("."),
            prefix: "ev_charger_stations".to_string(),
            legacy_combinatorial: false,
            write_report: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Pause before retrying a failed cycle.
    pub retry_delay_secs: u64,
    /// External GPX to KML converter for legacy files, e.g. `gpsbabel`.
    /// Without it KML is rendered natively.
    pub converter: Option<String>,
    pub converter_timeout_secs: u64,
    /// Run again this long after a successful cycle. `None` stops after the
    /// first success.
    pub repeat_interval_secs: Option<u64>,
    /// Give up after this many consecutive failed cycles. `None` retries
    /// forever.
    pub max_attempts: Option<u32>,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        SupervisorConfig {
            retry_delay_secs: 3600,
            converter: None,
            converter_timeout_secs: 600,
            repeat_interval_secs: None,
            max_attempts: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            file: None,
            timestamps: false,
        }
    }
}

impl ServiceConfig {
    /// Parses a configuration document.
    pub fn from_toml(text: &str) -> Result<Self, ServiceError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ServiceError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServiceError::io(path.display().to_string(), e))?;
        Self::from_toml(&text)
    }

    /// The configured key, else `NOBIL_API_KEY`.
    pub fn resolve_api_key(&self) -> Result<String, ServiceError> {
        let configured = self
            .feed
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok());
        match configured {
            Some(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
            _ => Err(ServiceError::MissingApiKey),
        }
    }
}
