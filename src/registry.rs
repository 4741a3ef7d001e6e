/// Lookup tables for the NOBIL feed.
///
/// Defines the operator recognition patterns, the connector patterns, the
/// power tier boundaries and the feed's attribute ids. These are tuned
/// against the data quirks of one upstream feed; this is the single source
/// of truth for them and other modules should reference these tables rather
/// than hardcoding strings.

use crate::model::{ConnectorType, Operator, PowerTier};

// ---------------------------------------------------------------------------
// Feed attribute ids
// ---------------------------------------------------------------------------

/// `attrtypeid` of the station-level "public access" attribute.
pub const ATTR_PUBLIC: &str = "2";

/// `attrtypeid` of the connector-level "connector type" attribute.
pub const ATTR_CONNECTOR_TYPE: &str = "4";

/// `attrtypeid` of the connector-level "charging capacity" attribute.
pub const ATTR_CAPACITY: &str = "5";

/// `attrtypeid` of the station-level "open 24 hours" attribute.
pub const ATTR_OPEN_24H: &str = "24";

/// `attrvalid` value meaning "yes" for boolean attributes.
pub const ATTR_VALID_YES: &str = "1";

// ---------------------------------------------------------------------------
// Operator patterns
// ---------------------------------------------------------------------------

/// How an operator pattern is compared against the upper-cased field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Contains,
    Equals,
}

pub struct OperatorPattern {
    /// Upper-case pattern text.
    pub pattern: &'static str,
    pub kind: MatchKind,
    pub operator: Operator,
}

/// Operator patterns in priority order; the first match wins.
///
/// Short brand names that occur inside ordinary words ("MER", "BEE") only
/// match the whole field.
pub static OPERATOR_PATTERNS: &[OperatorPattern] = &[
    OperatorPattern { pattern: "CLEVER", kind: MatchKind::Contains, operator: Operator::Clever },
    OperatorPattern { pattern: "E.ON", kind: MatchKind::Contains, operator: Operator::Eon },
    OperatorPattern { pattern: "FORTUM", kind: MatchKind::Contains, operator: Operator::Fortum },
    OperatorPattern { pattern: "RECHARGE", kind: MatchKind::Contains, operator: Operator::Fortum },
    OperatorPattern { pattern: "GRØNN KONTAKT", kind: MatchKind::Contains, operator: Operator::GronnKontakt },
    OperatorPattern { pattern: "MER NORWAY", kind: MatchKind::Contains, operator: Operator::GronnKontakt },
    OperatorPattern { pattern: "MER", kind: MatchKind::Equals, operator: Operator::GronnKontakt },
    OperatorPattern { pattern: "BKK", kind: MatchKind::Contains, operator: Operator::Bkk },
    OperatorPattern { pattern: "EVINY", kind: MatchKind::Contains, operator: Operator::Bkk },
    OperatorPattern { pattern: "TESLA", kind: MatchKind::Contains, operator: Operator::Tesla },
    OperatorPattern { pattern: "IONITY", kind: MatchKind::Contains, operator: Operator::Ionity },
    OperatorPattern { pattern: "BEE CHARGING", kind: MatchKind::Contains, operator: Operator::Bee },
    OperatorPattern { pattern: "BEE", kind: MatchKind::Equals, operator: Operator::Bee },
];

// ---------------------------------------------------------------------------
// Connector patterns
// ---------------------------------------------------------------------------

/// Connector patterns in priority order, matched case-insensitively as
/// substrings of the connector attribute's `trans` text.
pub static CONNECTOR_PATTERNS: &[(&str, ConnectorType)] = &[
    ("CCS", ConnectorType::Ccs),
    ("CHADEMO", ConnectorType::Chademo),
    ("TYPE 2", ConnectorType::Type2),
    ("TESLA CONNECTOR MODEL", ConnectorType::Tesla),
];

// ---------------------------------------------------------------------------
// Power tiers
// ---------------------------------------------------------------------------

/// Contiguous, non-overlapping power tiers in ascending order. Bit `i` of a
/// power mask refers to `POWER_TIERS[i]`.
pub static POWER_TIERS: &[PowerTier] = &[
    PowerTier { lower_kw: 0.0, upper_kw: Some(20.0), label: "Less than 20 kW" },
    PowerTier { lower_kw: 20.0, upper_kw: Some(40.0), label: "20 to 40 kW" },
    PowerTier { lower_kw: 40.0, upper_kw: Some(80.0), label: "40 to 80 kW" },
    PowerTier { lower_kw: 80.0, upper_kw: Some(160.0), label: "80 to 160 kW" },
    PowerTier { lower_kw: 160.0, upper_kw: None, label: "160 kW or more" },
];

/// Looks up the first operator pattern matching `upper`, which must already
/// be upper-cased.
pub fn find_operator_pattern(upper: &str) -> Option<&'static OperatorPattern> {
    OPERATOR_PATTERNS.iter().find(|p| match p.kind {
        MatchKind::Contains => upper.contains(p.pattern),
        MatchKind::Equals => upper == p.pattern,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
