/// NOBIL charging-station export service.
///
/// Downloads the Norwegian charging-station registry (NOBIL) as XML,
/// classifies every public station by operator, power tier and connector
/// type, and publishes GPX, KML and a self-filtering browser script.

pub mod analysis;
pub mod classify;
pub mod config;
pub mod convert;
pub mod dev_mode;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod registry;
pub mod service;
