/// Map-data exports rendered from a `StationStore`.
///
/// Submodules:
/// - `gpx`: GPX 1.1 waypoints and the static GPX document.
/// - `kml`: KML 2.2 placemarks, icon styles and the static KML document.
/// - `script`: the self-filtering browser script carrying every station.
///
/// The legacy combinatorial mode (one static file per filter combination)
/// is described here as well; it predates the script export and is only
/// produced when enabled in the configuration.

pub mod gpx;
pub mod kml;
pub mod script;

use crate::analysis::{MaskFilter, Population};
use crate::model::{ConnectorType, Operator};
use crate::registry::POWER_TIERS;

/// Trailing XML comment listing the number of exported stations per operator,
/// e.g. `<!-- Recharge:0 Mer:2 ... Other:5 -->`.
pub fn operator_summary_comment(population: &Population) -> String {
    let mut comment = String::from("<!-- ");
    for op in Operator::ALL {
        comment.push_str(&format!("{}:{} ", op, population.operator(op)));
    }
    comment.push_str("-->");
    comment
}

// ---------------------------------------------------------------------------
// Legacy combinatorial export
// ---------------------------------------------------------------------------

/// One point of the legacy filter cross product. Masks are signed so that
/// "everything" is `-1` and "this tier and above" is a negative power of two,
/// matching the published file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegacyExport {
    pub connector_mask: i32,
    pub power_mask: i32,
    pub owner_mask: i32,
}

impl LegacyExport {
    pub fn filter(&self) -> MaskFilter {
        MaskFilter {
            owner: self.owner_mask as u32,
            power: self.power_mask as u32,
            connector: self.connector_mask as u32,
        }
    }

    /// `<prefix>_<type>_<power>_<owner>`, without extension.
    pub fn file_stem(&self, prefix: &str) -> String {
        format!(
            "{}_{}_{}_{}",
            prefix, self.connector_mask, self.power_mask, self.owner_mask
        )
    }
}

/// Each single bit from the highest down, then "all".
pub fn single_bit_domain(count: usize) -> Vec<i32> {
    (0..count).rev().map(|i| 1 << i).chain([-1]).collect()
}

/// "Below tier k" masks for k = N-1..1, then "tier k and above" masks for
/// k = N-1..1, then "all".
pub fn power_domain(tiers: usize) -> Vec<i32> {
    let below = (1..tiers).rev().map(|k| (1 << k) - 1);
    let above = (1..tiers).rev().map(|k| -(1 << k));
    below.chain(above).chain([-1]).collect()
}

/// The full cross product, power outermost and operator innermost.
pub fn legacy_exports() -> Vec<LegacyExport> {
    let connectors = single_bit_domain(ConnectorType::COUNT);
    let owners = single_bit_domain(Operator::COUNT);
    let mut exports = Vec::new();
    for power_mask in power_domain(POWER_TIERS.len()) {
        for &connector_mask in &connectors {
            for &owner_mask in &owners {
                exports.push(LegacyExport {
                    connector_mask,
                    power_mask,
                    owner_mask,
                });
            }
        }
    }
    exports
}
