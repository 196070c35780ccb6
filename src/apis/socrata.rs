use crate::app::ports::HttpClientPort;
use crate::common::error::{Result, ScraperError};
use crate::common::types::SourceFeed;
use serde_json::Value;
use tracing::{debug, instrument};

/// Build a SODA resource URL: `https://{domain}/resource/{dataset}.json?$limit=N`.
/// An endpoint that already carries a scheme is used as the base unchanged.
pub fn resource_url(endpoint: &str, dataset: &str, row_limit: Option<u32>) -> String {
    let base = if endpoint.contains("://") {
        endpoint.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", endpoint.trim_end_matches('/'))
    };
    match row_limit {
        Some(limit) => format!("{}/resource/{}.json?$limit={}", base, dataset, limit),
        None => format!("{}/resource/{}.json", base, dataset),
    }
}

/// Fetch up to `row_limit` rows of a Socrata dataset as raw records
#[instrument(skip(http))]
pub async fn fetch_resource(
    http: &dyn HttpClientPort,
    source_name: &str,
    endpoint: &str,
    dataset: &str,
    row_limit: Option<u32>,
) -> Result<SourceFeed> {
    let url = resource_url(endpoint, dataset, row_limit);
    let response = http
        .get(&url)
        .await
        .map_err(|e| ScraperError::unavailable(source_name, e.to_string()))?;

    if !response.is_success() {
        return Err(ScraperError::unavailable(
            source_name,
            format!("{} returned HTTP {}", url, response.status),
        ));
    }

    let rows: Vec<Value> = serde_json::from_slice(&response.bytes)
        .map_err(|e| ScraperError::unavailable(source_name, format!("malformed JSON: {}", e)))?;
    debug!("{} rows from {}", rows.len(), url);

    Ok(rows
        .into_iter()
        .filter_map(|row| match row {
            Value::Object(map) => Some(map),
            _ => None,
        })
        .collect())
}
