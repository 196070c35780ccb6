use crate::app::ports::{HttpClientPort, PhoneLookup};
use crate::common::error::{Result, ScraperError};
use crate::common::types::NormalizedRecord;
use crate::config::EnrichmentConfig;
use async_trait::async_trait;
use metrics::counter;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{debug, info};

/// Percent-encode one query component, with spaces as `+`
fn encode_component(text: &str) -> String {
    urlencoding::encode(text.trim()).replace("%20", "+")
}

/// `Company+Address1+City+State+keyword`, each part space-to-plus encoded
pub fn build_query(record: &NormalizedRecord, keyword: &str) -> String {
    [
        record.company.as_str(),
        record.address1.as_str(),
        record.city.as_str(),
        record.state.as_str(),
        keyword,
    ]
    .iter()
    .map(|part| encode_component(part))
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join("+")
}

/// Text of the first element matching `selector`, if it has any
pub fn extract_snippet(html: &str, selector: &Selector) -> Option<String> {
    let document = Html::parse_document(html);
    let element = document.select(selector).next()?;
    let text = element.text().collect::<String>().trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Phone lookup that reads the answer snippet from a search results page.
/// Tied to markup the search engine does not document; misses are normal.
pub struct SearchSnippetLookup {
    http: Arc<dyn HttpClientPort>,
    search_url: String,
    selector: Selector,
}

impl SearchSnippetLookup {
    pub fn new(http: Arc<dyn HttpClientPort>, config: &EnrichmentConfig) -> Result<Self> {
        let selector = Selector::parse(&config.snippet_selector).map_err(|e| {
            ScraperError::Config(format!("Invalid snippet selector '{}': {}", config.snippet_selector, e))
        })?;
        Ok(Self {
            http,
            search_url: config.search_url.clone(),
            selector,
        })
    }
}

#[async_trait]
impl PhoneLookup for SearchSnippetLookup {
    async fn lookup(&self, query: &str) -> Option<String> {
        let url = format!("{}?q={}", self.search_url, query);
        let response = match self.http.get(&url).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                debug!("Search returned HTTP {} for {}", response.status, query);
                return None;
            }
            Err(e) => {
                debug!("Search request failed for {}: {}", query, e);
                return None;
            }
        };
        extract_snippet(&response.text(), &self.selector)
    }
}

/// Totals from one enrichment pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentStats {
    pub looked_up: usize,
    pub found: usize,
}

/// Fill in missing phone numbers one record at a time.
/// Every record without a phone gets its own lookup; a miss leaves it blank.
pub async fn enrich_phones(
    records: &mut [NormalizedRecord],
    lookup: &dyn PhoneLookup,
    keyword: &str,
) -> EnrichmentStats {
    let mut stats = EnrichmentStats::default();

    for record in records.iter_mut().filter(|r| !r.has_phone()) {
        let query = build_query(record, keyword);
        stats.looked_up += 1;

        match lookup.lookup(&query).await {
            Some(phone) => {
                debug!("Found phone {} for {}", phone, record.company);
                record.phone = Some(phone);
                stats.found += 1;
            }
            None => debug!("No phone found for {}", record.company),
        }
    }

    counter!("liquor_phone_lookups_total").increment(stats.looked_up as u64);
    counter!("liquor_phone_hits_total").increment(stats.found as u64);
    info!("Phone enrichment: {}/{} numbers found", stats.found, stats.looked_up);
    stats
}
