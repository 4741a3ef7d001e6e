/// Development mode utilities for working with a saved datadump
///
/// When the NOBIL API is unavailable, or no API key is at hand, use this
/// module to replay a previously downloaded XML dump through the pipeline.

use std::path::{Path, PathBuf};

use crate::model::ServiceError;

/// Configuration for development mode feed replay
#[derive(Debug, Clone, PartialEq)]
pub struct DevMode {
    /// Saved datadump, e.g. from `curl '<url>?apikey=...&format=xml&file=false'`
    pub feed_path: PathBuf,
}

impl DevMode {
    /// Create a new dev mode configuration
    ///
    /// # Arguments
    /// * `feed_path` - XML file to read instead of calling the API
    pub fn new(feed_path: impl Into<PathBuf>) -> Self {
        Self {
            feed_path: feed_path.into(),
        }
    }

    pub fn feed_path(&self) -> &Path {
        &self.feed_path
    }

    /// Read the saved dump as if it had just been downloaded
    pub fn load_feed(&self) -> Result<Vec<u8>, ServiceError> {
        std::fs::read(&self.feed_path)
            .map_err(|e| ServiceError::io(self.feed_path.display().to_string(), e))
    }
}
