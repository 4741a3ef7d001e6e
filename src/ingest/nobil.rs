/// NOBIL datadump API client
///
/// Downloads the complete charging-station registry as one XML document.
/// The body is handed to the extractor unchanged.
///
/// API Documentation: https://info.nobil.no/api

use std::time::Duration;

use reqwest::blocking::Client;

use crate::model::ServiceError;

pub const DEFAULT_DATADUMP_URL: &str = "https://nobil.no/api/server/datadump.php";

// ============================================================================
// API Client Functions
// ============================================================================

/// Query string for the full XML dump, returned inline rather than as a
/// downloadable file.
pub fn build_datadump_url(base_url: &str, api_key: &str) -> String {
    format!("{}?apikey={}&format=xml&file=false", base_url, api_key)
}

/// Blocking client with an overall request timeout. The dump is tens of
/// megabytes, so the timeout is generous by default.
pub fn build_client(timeout_secs: u64) -> Result<Client, ServiceError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("nobild/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Fetch the datadump body
///
/// # Parameters
/// - `client`: HTTP client
/// - `base_url`: datadump endpoint without query string
/// - `api_key`: NOBIL API key
///
/// # Returns
/// Raw XML bytes, or `HttpError` for a non-2xx status
pub fn fetch_datadump(
    client: &Client,
    base_url: &str,
    api_key: &str,
) -> Result<Vec<u8>, ServiceError> {
    let url = build_datadump_url(base_url, api_key);

    let response = client
        .get(&url)
        .header("Accept", "application/xml")
        .send()?;

    if !response.status().is_success() {
        return Err(ServiceError::HttpError(response.status().as_u16()));
    }

    Ok(response.bytes()?.to_vec())
}
