/// Per-cycle collection of extracted station records.
///
/// Records are appended while the feed is extracted and the store is then
/// treated as a fixed snapshot: sorted once, filtered and counted by the
/// exporters, and dropped as a whole at the end of the cycle.

use serde::Serialize;

use crate::analysis::groupings::{self, MaskRun};
use crate::model::{all_power_mask, ConnectorType, Operator, StationRecord};
use crate::registry::POWER_TIERS;

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Selection over the three classification axes. A record passes when each
/// of its masks shares at least one bit with the corresponding filter mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskFilter {
    pub owner: u32,
    pub power: u32,
    pub connector: u32,
}

impl MaskFilter {
    /// Every operator, tier and connector type.
    pub fn all() -> Self {
        MaskFilter {
            owner: Operator::ALL_MASK,
            power: all_power_mask(),
            connector: ConnectorType::ALL_MASK,
        }
    }

    pub fn matches(&self, record: &StationRecord) -> bool {
        record.owner_mask() & self.owner != 0
            && record.power_tier_mask() & self.power != 0
            && record.connector_mask() & self.connector != 0
    }
}

// ---------------------------------------------------------------------------
// Population counts
// ---------------------------------------------------------------------------

/// Number of stations per classification value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Population {
    pub total: usize,
    /// Indexed like `POWER_TIERS`.
    pub power_tiers: Vec<usize>,
    /// Indexed by `Operator::index`.
    pub operators: Vec<usize>,
    /// Stations offering at least one connector of the type, indexed by
    /// `ConnectorType::index`.
    pub connectors: Vec<usize>,
}

impl Population {
    /// Counts in a single pass over `records`.
    pub fn count<'a>(records: impl IntoIterator<Item = &'a StationRecord>) -> Self {
        let mut population = Population {
            total: 0,
            power_tiers: vec![0; POWER_TIERS.len()],
            operators: vec![0; Operator::COUNT],
            connectors: vec![0; ConnectorType::COUNT],
        };
        for record in records {
            population.total += 1;
            population.operators[record.owner().index()] += 1;
            for (i, slot) in population.power_tiers.iter_mut().enumerate() {
                if record.power_tier_mask() & (1 << i) != 0 {
                    *slot += 1;
                }
            }
            for (ty, _) in record.connector_counts().present() {
                population.connectors[ty.index()] += 1;
            }
        }
        population
    }

    pub fn operator(&self, op: Operator) -> usize {
        self.operators[op.index()]
    }

    pub fn connector(&self, ty: ConnectorType) -> usize {
        self.connectors[ty.index()]
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct StationStore {
    records: Vec<StationRecord>,
}

impl StationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: StationRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[StationRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StationRecord> {
        self.records.iter()
    }

    /// Records passing `filter`, in store order.
    pub fn filter(&self, filter: MaskFilter) -> impl Iterator<Item = &StationRecord> + '_ {
        self.records.iter().filter(move |r| filter.matches(r))
    }

    pub fn population(&self) -> Population {
        Population::count(&self.records)
    }

    /// Orders the records by mask tuple so equal tuples are adjacent.
    pub fn sort_by_masks(&mut self) {
        groupings::sort_by_masks(&mut self.records);
    }

    /// Runs of equal mask tuples. Only meaningful after `sort_by_masks`.
    pub fn runs(&self) -> impl Iterator<Item = MaskRun<'_>> {
        groupings::mask_runs(&self.records)
    }
}

impl FromIterator<StationRecord> for StationStore {
    fn from_iter<I: IntoIterator<Item = StationRecord>>(iter: I) -> Self {
        StationStore {
            records: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CapacityRange, ConnectorCounts, GeoPoint};

    fn record(owner: Operator, kw: f64, types: &[ConnectorType]) -> StationRecord {
        let mut counts = ConnectorCounts::default();
        for ty in types {
            counts.increment(*ty);
        }
        StationRecord::new(
            GeoPoint { lat: 60.0, lon: 10.0 },
            format!("{} {}", owner, kw),
            owner,
            CapacityRange { min_kw: kw, max_kw: kw },
            counts,
        )
    }

    fn sample() -> StationStore {
        [
            record(Operator::Clever, 50.0, &[ConnectorType::Ccs, ConnectorType::Chademo]),
            record(Operator::Clever, 22.0, &[ConnectorType::Type2]),
            record(Operator::Tesla, 150.0, &[ConnectorType::Tesla]),
            record(Operator::Other, 0.0, &[ConnectorType::Type2]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_filter_all_excludes_unknown_power() {
        let store = sample();
        let included: Vec<_> = store.filter(MaskFilter::all()).collect();
        assert_eq!(included.len(), 3, "station without power reading has no tier");
    }

    #[test]
    fn test_filter_by_owner() {
        let store = sample();
        let filter = MaskFilter {
            owner: Operator::Clever.bit(),
            ..MaskFilter::all()
        };
        assert!(store.filter(filter).all(|r| r.owner() == Operator::Clever));
        assert_eq!(store.filter(filter).count(), 2);
    }

    #[test]
    fn test_filter_by_connector_intersects() {
        let store = sample();
        let filter = MaskFilter {
            connector: ConnectorType::Chademo.bit() | ConnectorType::Tesla.bit(),
            ..MaskFilter::all()
        };
        assert_eq!(store.filter(filter).count(), 2);
    }

    #[test]
    fn test_population_counts() {
        let population = sample().population();
        assert_eq!(population.total, 4);
        assert_eq!(population.operator(Operator::Clever), 2);
        assert_eq!(population.operator(Operator::Other), 1);
        assert_eq!(population.connector(ConnectorType::Type2), 2);
        assert_eq!(population.power_tiers.iter().sum::<usize>(), 3);
        assert_eq!(population.power_tiers[1], 1, "22 kW is in the 20-40 tier");
    }
}
