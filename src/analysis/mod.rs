/// Aggregation of extracted stations ahead of export.
///
/// Submodules:
/// - `store`: the per-cycle record collection and its population counts.
/// - `groupings`: mask-tuple ordering and run grouping for the script export.

pub mod groupings;
pub mod store;

pub use groupings::{mask_runs, sort_by_masks, MaskRun};
pub use store::{MaskFilter, Population, StationStore};
