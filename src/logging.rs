/// Structured logging for the charging-station export service
///
/// Provides context-rich logging with pipeline stage tags, file or station
/// identifiers, timestamps, and severity levels. Supports both console
/// output and file-based logging for daemon operations.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

use crate::ingest::extract::ExtractSummary;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Extract,
    Export,
    Convert,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Fetch => write!(f, "FETCH"),
            Stage::Extract => write!(f, "EXTRACT"),
            Stage::Export => write!(f, "EXPORT"),
            Stage::Convert => write!(f, "CONVERT"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - upstream maintenance window or rate limiting
    Expected,
    /// Unexpected failure - indicates a configuration problem or an API change
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, stage: &Stage, context: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let context_part = context.map(|s| format!(" [{}]", s)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp, level, stage, context_part, message
        );

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", log_entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", stage, context_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", stage, context_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn emit(level: LogLevel, stage: Stage, context: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, &stage, context, message);
        }
    }
}

/// Log a general informational message
pub fn info(stage: Stage, context: Option<&str>, message: &str) {
    emit(LogLevel::Info, stage, context, message);
}

/// Log a warning message
pub fn warn(stage: Stage, context: Option<&str>, message: &str) {
    emit(LogLevel::Warning, stage, context, message);
}

/// Log an error message
pub fn error(stage: Stage, context: Option<&str>, message: &str) {
    emit(LogLevel::Error, stage, context, message);
}

/// Log a debug message
pub fn debug(stage: Stage, context: Option<&str>, message: &str) {
    emit(LogLevel::Debug, stage, context, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a feed download failure from its error message
pub fn classify_fetch_failure(error_message: &str) -> FailureType {
    // 503 and 429 show up during NOBIL maintenance and when polled too often
    if error_message.contains("HTTP error: 503") || error_message.contains("HTTP error: 429") {
        FailureType::Expected
    }
    // Rejected key or moved endpoint needs an operator
    else if error_message.contains("HTTP error: 401")
        || error_message.contains("HTTP error: 403")
        || error_message.contains("HTTP error: 404")
    {
        FailureType::Unexpected
    } else {
        FailureType::Unknown
    }
}

/// Classify an external converter failure
pub fn classify_convert_failure(error_message: &str) -> FailureType {
    if error_message.contains("timeout") {
        FailureType::Unknown
    } else if error_message.contains("No such file") || error_message.contains("not found") {
        FailureType::Unexpected
    } else {
        FailureType::Unknown
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

fn log_classified(stage: Stage, context: &str, operation: &str, failure_type: FailureType, error_msg: &str) {
    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => debug(stage, Some(context), &message),
        FailureType::Unexpected => error(stage, Some(context), &message),
        FailureType::Unknown => warn(stage, Some(context), &message),
    }
}

/// Log a feed download failure with automatic classification
pub fn log_fetch_failure(url: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_fetch_failure(&error_msg);
    log_classified(Stage::Fetch, url, "Datadump download", failure_type, &error_msg);
}

/// Log a converter failure with classification
pub fn log_convert_failure(file: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_convert_failure(&error_msg);
    log_classified(Stage::Convert, file, "GPX to KML conversion", failure_type, &error_msg);
}

// ---------------------------------------------------------------------------
// Cycle Summary Logging
// ---------------------------------------------------------------------------

/// Log how many station elements turned into records
pub fn log_extract_summary(summary: &ExtractSummary) {
    let message = format!(
        "Extracted {}/{} stations ({} not public, {} bad position)",
        summary.accepted, summary.stations_seen, summary.not_public, summary.bad_position
    );

    if summary.truncated {
        warn(Stage::Extract, None, &format!("{}; feed ended early", message));
    } else if summary.accepted == 0 {
        error(Stage::Extract, None, &message);
    } else {
        info(Stage::Extract, None, &message);
    }
}

/// Log the outcome of one export cycle
pub fn log_cycle_summary(files_written: usize, stations: usize, attempt: u32) {
    let message = format!(
        "Cycle complete: {} files, {} stations (attempt {})",
        files_written, stations, attempt
    );
    info(Stage::System, None, &message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("INFO".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert_eq!("warn".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_fetch_failure_classification() {
        assert_eq!(classify_fetch_failure("HTTP error: 503"), FailureType::Expected);
        assert_eq!(classify_fetch_failure("HTTP error: 401"), FailureType::Unexpected);
        assert_eq!(
            classify_fetch_failure("Request failed: connection reset"),
            FailureType::Unknown
        );
    }

    #[test]
    fn test_convert_failure_classification() {
        assert_eq!(
            classify_convert_failure("I/O error on gpsbabel: No such file or directory"),
            FailureType::Unexpected
        );
        assert_eq!(
            classify_convert_failure("Converter 'gpsbabel' timeout after 60s"),
            FailureType::Unknown
        );
    }
}
