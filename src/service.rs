/// Export cycle and retry supervisor.
///
/// One cycle loads the datadump (from the API, or from a saved file in dev
/// mode), extracts and sorts the stations, and writes every output file. A
/// cycle either completes or fails as a whole; the supervisor logs the
/// failure, waits, and starts the next attempt from scratch.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::analysis::{MaskFilter, StationStore};
use crate::config::{OutputConfig, ServiceConfig};
use crate::convert::Converter;
use crate::dev_mode::DevMode;
use crate::export::gpx::render_gpx;
use crate::export::kml::{render_kml, KML_ICONS};
use crate::export::script::render_script;
use crate::export::legacy_exports;
use crate::ingest::extract::{extract_stations, ExtractSummary};
use crate::ingest::nobil;
use crate::logging::{self, Stage};
use crate::model::{ConnectorType, Operator, ServiceError};
use crate::registry::POWER_TIERS;

// ---------------------------------------------------------------------------
// Feed source
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum FeedSource {
    /// Live NOBIL datadump.
    Remote {
        url: String,
        api_key: String,
        timeout_secs: u64,
    },
    /// Saved dump replayed from disk.
    Replay(DevMode),
}

impl FeedSource {
    /// Label for log lines; never includes the API key.
    pub fn describe(&self) -> String {
        match self {
            FeedSource::Remote { url, .. } => url.clone(),
            FeedSource::Replay(dev) => dev.feed_path().display().to_string(),
        }
    }

    pub fn load(&self) -> Result<Vec<u8>, ServiceError> {
        match self {
            FeedSource::Remote {
                url,
                api_key,
                timeout_secs,
            } => {
                let client = nobil::build_client(*timeout_secs)?;
                nobil::fetch_datadump(&client, url, api_key)
            }
            FeedSource::Replay(dev) => dev.load_feed(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle report
// ---------------------------------------------------------------------------

/// Summary of one successful cycle, also written as `<prefix>_report.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub generated_at: String,
    pub source: String,
    pub stations_seen: usize,
    pub stations_exported: usize,
    pub not_public: usize,
    pub bad_position: usize,
    pub truncated: bool,
    pub operators: BTreeMap<String, usize>,
    pub power_tiers: BTreeMap<String, usize>,
    pub connectors: BTreeMap<String, usize>,
    pub files: Vec<String>,
}

impl CycleReport {
    fn new(source: String, summary: &ExtractSummary, store: &StationStore) -> Self {
        let population = store.population();
        CycleReport {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            source,
            stations_seen: summary.stations_seen,
            stations_exported: store.len(),
            not_public: summary.not_public,
            bad_position: summary.bad_position,
            truncated: summary.truncated,
            operators: Operator::ALL
                .iter()
                .map(|op| (op.display_name().to_string(), population.operator(*op)))
                .collect(),
            power_tiers: POWER_TIERS
                .iter()
                .zip(&population.power_tiers)
                .map(|(tier, count)| (tier.label.to_string(), *count))
                .collect(),
            connectors: ConnectorType::ALL
                .iter()
                .map(|ty| (ty.label().to_string(), population.connector(*ty)))
                .collect(),
            files: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

fn write_file(path: &Path, contents: &str) -> Result<(), ServiceError> {
    fs::write(path, contents).map_err(|e| ServiceError::io(path.display().to_string(), e))
}

/// Writes the script, the unfiltered GPX and KML documents and, when
/// enabled, one GPX/KML pair per legacy filter combination. The store
/// should already be sorted. Returns the written paths in order.
pub fn write_exports(
    store: &StationStore,
    output: &OutputConfig,
    converter: Option<&Converter>,
) -> Result<Vec<PathBuf>, ServiceError> {
    let dir = &output.directory;
    fs::create_dir_all(dir).map_err(|e| ServiceError::io(dir.display().to_string(), e))?;

    let mut written = Vec::new();
    let default_icon = &KML_ICONS[0];

    let script_path = dir.join(format!("{}.js", output.prefix));
    write_file(&script_path, &render_script(store, &output.prefix))?;
    written.push(script_path);

    let gpx_path = dir.join(format!("{}.gpx", output.prefix));
    write_file(&gpx_path, &render_gpx(store, MaskFilter::all()))?;
    written.push(gpx_path);

    let kml_path = dir.join(format!("{}.kml", output.prefix));
    write_file(&kml_path, &render_kml(store, MaskFilter::all(), default_icon))?;
    written.push(kml_path);

    if output.legacy_combinatorial {
        for export in legacy_exports() {
            let stem = export.file_stem(&output.prefix);
            let gpx_path = dir.join(format!("{}.gpx", stem));
            let kml_path = dir.join(format!("{}.kml", stem));

            write_file(&gpx_path, &render_gpx(store, export.filter()))?;
            match converter {
                Some(converter) => {
                    if let Err(e) = converter.convert(&gpx_path, &kml_path) {
                        logging::log_convert_failure(&gpx_path.display().to_string(), &e);
                        return Err(e);
                    }
                }
                None => write_file(&kml_path, &render_kml(store, export.filter(), default_icon))?,
            }
            written.push(gpx_path);
            written.push(kml_path);
        }
        let kml_via = converter.map_or("native renderer", Converter::command);
        logging::debug(
            Stage::Export,
            Some(kml_via),
            &format!("Wrote {} legacy file pairs", legacy_exports().len()),
        );
    }

    Ok(written)
}

// ---------------------------------------------------------------------------
// Export service
// ---------------------------------------------------------------------------

pub struct ExportService {
    config: ServiceConfig,
    source: FeedSource,
    converter: Option<Converter>,
}

impl ExportService {
    pub fn new(config: ServiceConfig, source: FeedSource) -> Self {
        let converter = config
            .service
            .converter
            .as_ref()
            .map(|command| Converter::new(command.clone(), config.service.converter_timeout_secs));
        ExportService {
            config,
            source,
            converter,
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Runs one complete cycle.
    pub fn run_cycle(&self) -> Result<CycleReport, ServiceError> {
        let source = self.source.describe();
        logging::info(Stage::Fetch, Some(&source), "Loading datadump");

        let data = match self.source.load() {
            Ok(data) => data,
            Err(e) => {
                logging::log_fetch_failure(&source, &e);
                return Err(e);
            }
        };
        logging::debug(Stage::Fetch, Some(&source), &format!("{} bytes", data.len()));

        let (mut store, summary) = extract_stations(&data);
        logging::log_extract_summary(&summary);
        store.sort_by_masks();

        let output = &self.config.output;
        let written = write_exports(&store, output, self.converter.as_ref())?;

        let mut report = CycleReport::new(source, &summary, &store);
        report.files = written.iter().map(|p| p.display().to_string()).collect();

        if output.write_report {
            let report_path = output.directory.join(format!("{}_report.json", output.prefix));
            let json = serde_json::to_string_pretty(&report).map_err(|e| ServiceError::IoError {
                path: report_path.display().to_string(),
                message: e.to_string(),
            })?;
            write_file(&report_path, &json)?;
            report.files.push(report_path.display().to_string());
        }

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

/// Retries failed cycles after a fixed delay and optionally repeats
/// successful ones on an interval.
pub struct Supervisor {
    service: ExportService,
    retry_delay: Duration,
    repeat_interval: Option<Duration>,
    max_attempts: Option<u32>,
}

impl Supervisor {
    pub fn new(service: ExportService) -> Self {
        let settings = &service.config().service;
        let retry_delay = Duration::from_secs(settings.retry_delay_secs);
        let repeat_interval = settings.repeat_interval_secs.map(Duration::from_secs);
        let max_attempts = settings.max_attempts;
        Supervisor {
            service,
            retry_delay,
            repeat_interval,
            max_attempts,
        }
    }

    /// Stop after the first successful cycle regardless of configuration.
    pub fn once(mut self) -> Self {
        self.repeat_interval = None;
        self
    }

    /// Blocks until a cycle succeeds (when not repeating) or the attempt
    /// limit is reached. Returns the last report or the last error.
    pub fn run(&self) -> Result<CycleReport, ServiceError> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.service.run_cycle() {
                Ok(report) => {
                    logging::log_cycle_summary(report.files.len(), report.stations_exported, attempt);
                    match self.repeat_interval {
                        Some(interval) => {
                            attempt = 0;
                            thread::sleep(interval);
                        }
                        None => return Ok(report),
                    }
                }
                Err(e) => {
                    logging::error(
                        Stage::System,
                        None,
                        &format!("Cycle attempt {} failed: {}", attempt, e),
                    );
                    if self.max_attempts.is_some_and(|max| attempt >= max) {
                        return Err(e);
                    }
                    logging::info(
                        Stage::System,
                        None,
                        &format!("Retrying in {}s", self.retry_delay.as_secs()),
                    );
                    thread::sleep(self.retry_delay);
                }
            }
        }
    }

    /// Runs the supervisor on a named worker thread.
    pub fn spawn(self) -> std::io::Result<JoinHandle<Result<CycleReport, ServiceError>>> {
        thread::Builder::new()
            .name("nobil-export".to_string())
            .spawn(move || self.run())
    }
}
