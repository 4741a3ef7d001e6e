/// Core data types for the NOBIL charging-station export service.
///
/// This module defines the shared domain model imported by all other modules:
/// the closed classification enums, the per-station record with its cached
/// filter masks, and the service error type. Lookup tables (operator patterns,
/// power tier boundaries, feed attribute ids) live in `registry`.

use std::fmt;

use crate::registry::POWER_TIERS;

// ---------------------------------------------------------------------------
// Classification enums
// ---------------------------------------------------------------------------

/// Charging network operator, as recognised from free-text feed fields.
///
/// The discriminant order defines the bit position in owner masks and the
/// column order of every per-operator summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    /// Fortum Charge & Drive, renamed Recharge.
    Fortum,
    /// Grønn Kontakt, renamed Mer.
    GronnKontakt,
    Bee,
    /// BKK, renamed Eviny.
    Bkk,
    Clever,
    Eon,
    Tesla,
    Ionity,
    Other,
}

impl Operator {
    pub const ALL: [Operator; 9] = [
        Operator::Fortum,
        Operator::GronnKontakt,
        Operator::Bee,
        Operator::Bkk,
        Operator::Clever,
        Operator::Eon,
        Operator::Tesla,
        Operator::Ionity,
        Operator::Other,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Mask with every operator bit set.
    pub const ALL_MASK: u32 = (1 << Self::COUNT) - 1;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn bit(self) -> u32 {
        1 << self.index()
    }

    /// Name used in station titles and summaries.
    pub fn display_name(self) -> &'static str {
        match self {
            Operator::Fortum => "Recharge",
            Operator::GronnKontakt => "Mer",
            Operator::Bee => "Bee",
            Operator::Bkk => "Eviny",
            Operator::Clever => "Clever",
            Operator::Eon => "E.ON",
            Operator::Tesla => "Tesla",
            Operator::Ionity => "Ionity",
            Operator::Other => "Other",
        }
    }

    pub fn is_known(self) -> bool {
        self != Operator::Other
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Physical connector standard of a single charging point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConnectorType {
    Ccs,
    Chademo,
    Type2,
    Tesla,
    Other,
}

impl ConnectorType {
    pub const ALL: [ConnectorType; 5] = [
        ConnectorType::Ccs,
        ConnectorType::Chademo,
        ConnectorType::Type2,
        ConnectorType::Tesla,
        ConnectorType::Other,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub const ALL_MASK: u32 = (1 << Self::COUNT) - 1;

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn bit(self) -> u32 {
        1 << self.index()
    }

    /// Short code used in station titles, e.g. `CCS:2`.
    pub fn code(self) -> &'static str {
        match self {
            ConnectorType::Ccs => "CCS",
            ConnectorType::Chademo => "CHA",
            ConnectorType::Type2 => "TP2",
            ConnectorType::Tesla => "TSL",
            ConnectorType::Other => "UNK",
        }
    }

    /// Longer label used by the filter form.
    pub fn label(self) -> &'static str {
        match self {
            ConnectorType::Ccs => "CCS EUR",
            ConnectorType::Chademo => "CHADEMO",
            ConnectorType::Type2 => "TYPE2",
            ConnectorType::Tesla => "TESLA",
            ConnectorType::Other => "Other",
        }
    }
}

/// A half-open power range `[lower_kw, upper_kw)`; `None` upper bound means
/// the tier is open-ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerTier {
    pub lower_kw: f64,
    pub upper_kw: Option<f64>,
    pub label: &'static str,
}

impl PowerTier {
    pub fn contains(&self, kw: f64) -> bool {
        kw >= self.lower_kw && self.upper_kw.is_none_or(|upper| kw < upper)
    }
}

/// Mask with every power tier bit set.
pub fn all_power_mask() -> u32 {
    (1 << POWER_TIERS.len()) - 1
}

/// Bits of every tier containing `capacity_max`. Unknown capacity (0) maps
/// to an empty mask.
pub fn power_tier_mask(capacity_max: f64) -> u32 {
    if capacity_max <= 0.0 {
        return 0;
    }
    POWER_TIERS
        .iter()
        .enumerate()
        .filter(|(_, tier)| tier.contains(capacity_max))
        .fold(0, |mask, (i, _)| mask | (1 << i))
}

// ---------------------------------------------------------------------------
// Station record
// ---------------------------------------------------------------------------

/// WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Running min/max of the power ratings seen on a station's connectors.
/// Both fields stay 0 while nothing has been observed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CapacityRange {
    pub min_kw: f64,
    pub max_kw: f64,
}

impl CapacityRange {
    /// Folds one decoded reading into the range. Zero readings are absent
    /// values and are ignored.
    pub fn fold(&mut self, kw: f64) {
        if kw == 0.0 {
            return;
        }
        if self.min_kw == 0.0 {
            self.min_kw = kw;
            self.max_kw = kw;
        } else if kw < self.min_kw {
            self.min_kw = kw;
        } else if kw > self.max_kw {
            self.max_kw = kw;
        }
    }

    pub fn is_known(&self) -> bool {
        self.max_kw != 0.0
    }
}

/// Number of connectors of each type observed at one station.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectorCounts {
    counts: [u32; ConnectorType::COUNT],
}

impl ConnectorCounts {
    pub fn increment(&mut self, connector: ConnectorType) {
        self.counts[connector.index()] += 1;
    }

    pub fn get(&self, connector: ConnectorType) -> u32 {
        self.counts[connector.index()]
    }

    /// Connector types with a nonzero count, in enum order.
    pub fn present(&self) -> impl Iterator<Item = (ConnectorType, u32)> + '_ {
        ConnectorType::ALL
            .into_iter()
            .map(|ty| (ty, self.get(ty)))
            .filter(|(_, count)| *count > 0)
    }

    pub fn mask(&self) -> u32 {
        self.present().fold(0, |mask, (ty, _)| mask | ty.bit())
    }
}

/// One public charging station extracted from the feed.
///
/// Built once by the extractor and never modified afterwards. The filter
/// masks and the GPX/KML fragments are derived from the scalar fields at
/// construction, so they cannot drift from them.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRecord {
    title: String,
    owner: Operator,
    capacity: CapacityRange,
    connectors: ConnectorCounts,
    owner_mask: u32,
    power_tier_mask: u32,
    connector_mask: u32,
    gpx_fragment: String,
    kml_fragment: String,
}

impl StationRecord {
    pub fn new(
        position: GeoPoint,
        title: String,
        owner: Operator,
        capacity: CapacityRange,
        connectors: ConnectorCounts,
    ) -> Self {
        let gpx_fragment = crate::export::gpx::render_waypoint(position, &title);
        let kml_fragment = crate::export::kml::render_placemark(position, &title);
        StationRecord {
            owner,
            capacity,
            connectors,
            owner_mask: owner.bit(),
            power_tier_mask: power_tier_mask(capacity.max_kw),
            connector_mask: connectors.mask(),
            title,
            gpx_fragment,
            kml_fragment,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn owner(&self) -> Operator {
        self.owner
    }

    pub fn capacity_min(&self) -> f64 {
        self.capacity.min_kw
    }

    pub fn capacity_max(&self) -> f64 {
        self.capacity.max_kw
    }

    pub fn connector_counts(&self) -> &ConnectorCounts {
        &self.connectors
    }

    pub fn owner_mask(&self) -> u32 {
        self.owner_mask
    }

    pub fn power_tier_mask(&self) -> u32 {
        self.power_tier_mask
    }

    pub fn connector_mask(&self) -> u32 {
        self.connector_mask
    }

    /// The (owner, power, connector) tuple used for sorting and grouping.
    pub fn mask_key(&self) -> (u32, u32, u32) {
        (self.owner_mask, self.power_tier_mask, self.connector_mask)
    }

    pub fn gpx_fragment(&self) -> &str {
        &self.gpx_fragment
    }

    pub fn kml_fragment(&self) -> &str {
        &self.kml_fragment
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised by the I/O layer around the pipeline: fetching the feed,
/// running the converter, writing exports, loading configuration.
///
/// Any of these aborts the current cycle; the supervisor retries from scratch.
#[derive(Debug, PartialEq)]
pub enum ServiceError {
    /// Non-2xx HTTP response from the NOBIL API.
    HttpError(u16),
    /// The request could not be sent or the body could not be read.
    RequestError(String),
    /// Reading or writing a local file failed.
    IoError { path: String, message: String },
    /// The external converter ran but reported failure.
    ConvertFailed { command: String, status: String },
    /// The external converter did not finish in time and was killed.
    ConvertTimeout { command: String, timeout_secs: u64 },
    /// The configuration file is unreadable or invalid.
    ConfigError(String),
    /// Neither the command line, the config file nor the environment
    /// provided an API key.
    MissingApiKey,
}

impl ServiceError {
    pub fn io(path: impl Into<String>, err: std::io::Error) -> Self {
        ServiceError::IoError {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::HttpError(code) => write!(f, "HTTP error: {}", code),
            ServiceError::RequestError(msg) => write!(f, "Request failed: {}", msg),
            ServiceError::IoError { path, message } => {
                write!(f, "I/O error on {}: {}", path, message)
            }
            ServiceError::ConvertFailed { command, status } => {
                write!(f, "Converter '{}' failed: {}", command, status)
            }
            ServiceError::ConvertTimeout { command, timeout_secs } => {
                write!(f, "Converter '{}' timeout after {}s", command, timeout_secs)
            }
            ServiceError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            ServiceError::MissingApiKey => write!(f, "No API key configured"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => ServiceError::HttpError(status.as_u16()),
            None => ServiceError::RequestError(err.to_string()),
        }
    }
}

impl From<toml::de::Error> for ServiceError {
    fn from(err: toml::de::Error) -> Self {
        ServiceError::ConfigError(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
