/// Mask-tuple ordering and run grouping.
///
/// The script export wraps each run of records sharing one
/// (owner, power, connector) mask tuple in a single runtime guard, so the
/// records are sorted by that tuple first.

use crate::model::StationRecord;

/// A maximal slice of consecutive records with the same mask tuple.
#[derive(Debug, Clone, Copy)]
pub struct MaskRun<'a> {
    pub owner_mask: u32,
    pub power_mask: u32,
    pub connector_mask: u32,
    pub records: &'a [StationRecord],
}

/// Stable ascending sort by (owner_mask, power_tier_mask, connector_mask).
pub fn sort_by_masks(records: &mut [StationRecord]) {
    records.sort_by_key(StationRecord::mask_key);
}

/// Splits `records` into runs of equal mask tuples.
pub fn mask_runs(records: &[StationRecord]) -> impl Iterator<Item = MaskRun<'_>> {
    records
        .chunk_by(|a, b| a.mask_key() == b.mask_key())
        .map(|chunk| {
            let (owner_mask, power_mask, connector_mask) = chunk[0].mask_key();
            MaskRun {
                owner_mask,
                power_mask,
                connector_mask,
                records: chunk,
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CapacityRange, ConnectorCounts, ConnectorType, GeoPoint, Operator};
    use std::collections::HashSet;

    fn record(owner: Operator, kw: f64, ty: ConnectorType, title: &str) -> StationRecord {
        let mut counts = ConnectorCounts::default();
        counts.increment(ty);
        StationRecord::new(
            GeoPoint { lat: 1.0, lon: 2.0 },
            title.to_string(),
            owner,
            CapacityRange { min_kw: kw, max_kw: kw },
            counts,
        )
    }

    fn shuffled() -> Vec<StationRecord> {
        vec![
            record(Operator::Tesla, 150.0, ConnectorType::Tesla, "a"),
            record(Operator::Clever, 50.0, ConnectorType::Ccs, "b"),
            record(Operator::Tesla, 150.0, ConnectorType::Tesla, "c"),
            record(Operator::Other, 11.0, ConnectorType::Type2, "d"),
            record(Operator::Clever, 50.0, ConnectorType::Ccs, "e"),
            record(Operator::Clever, 22.0, ConnectorType::Type2, "f"),
            record(Operator::Tesla, 150.0, ConnectorType::Tesla, "g"),
        ]
    }

    #[test]
    fn test_sort_orders_by_mask_tuple() {
        let mut records = shuffled();
        sort_by_masks(&mut records);
        for pair in records.windows(2) {
            assert!(pair[0].mask_key() <= pair[1].mask_key());
        }
    }

    #[test]
    fn test_sort_is_stable_within_equal_tuples() {
        let mut records = shuffled();
        sort_by_masks(&mut records);
        let tesla: Vec<_> = records
            .iter()
            .filter(|r| r.owner() == Operator::Tesla)
            .map(|r| r.title())
            .collect();
        assert_eq!(tesla, vec!["a", "c", "g"]);
    }

    #[test]
    fn test_runs_never_split_equal_tuples() {
        let mut records = shuffled();
        sort_by_masks(&mut records);
        let runs: Vec<_> = mask_runs(&records).collect();

        let distinct: HashSet<_> = records.iter().map(StationRecord::mask_key).collect();
        assert_eq!(runs.len(), distinct.len());

        let mut seen = HashSet::new();
        for run in &runs {
            let key = (run.owner_mask, run.power_mask, run.connector_mask);
            assert!(seen.insert(key), "tuple {:?} appears in two runs", key);
            assert!(run.records.iter().all(|r| r.mask_key() == key));
        }
        assert_eq!(runs.iter().map(|r| r.records.len()).sum::<usize>(), records.len());
    }

    #[test]
    fn test_empty_input_has_no_runs() {
        assert_eq!(mask_runs(&[]).count(), 0);
    }
}
