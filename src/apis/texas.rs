use crate::apis::socrata::fetch_resource;
use crate::app::ports::HttpClientPort;
use crate::common::constants::TEXAS_SOURCE;
use crate::common::error::{Result, ScraperError};
use crate::common::types::{raw_field, LicenseSource, NormalizedRecord, SourceFeed};
use crate::config::SourceConfig;
use crate::pipeline::dates::select_recent_day;
use crate::pipeline::filters::CategoryFilter;
use crate::pipeline::normalize::collect_valid;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, instrument};

const DATE_FIELD: &str = "submission_date";
const TYPE_FIELD: &str = "license_type";

/// Texas Alcoholic Beverage Commission license applications (Socrata)
pub struct TexasSource {
    http: Arc<dyn HttpClientPort>,
    config: SourceConfig,
    lookback_days: u32,
}

impl TexasSource {
    pub fn new(http: Arc<dyn HttpClientPort>, config: SourceConfig, lookback_days: u32) -> Self {
        Self { http, config, lookback_days }
    }
}

#[async_trait::async_trait]
impl LicenseSource for TexasSource {
    fn source_name(&self) -> &'static str {
        TEXAS_SOURCE
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<SourceFeed> {
        let dataset = self
            .config
            .dataset
            .as_deref()
            .ok_or_else(|| ScraperError::Config("texas requires a dataset id".into()))?;
        fetch_resource(
            self.http.as_ref(),
            TEXAS_SOURCE,
            &self.config.endpoint,
            dataset,
            self.config.row_limit,
        )
        .await
    }

    fn normalize(&self, feed: SourceFeed, today: NaiveDate) -> Result<Vec<NormalizedRecord>> {
        // Date first, then the allow-list, re-applied on every fallback step
        let filter = CategoryFilter::Allow(self.config.categories.clone());
        let selection = select_recent_day(TEXAS_SOURCE, &feed, DATE_FIELD, today, self.lookback_days, |raw| {
            filter.allows(raw_field(raw, TYPE_FIELD).as_deref())
        })?;

        let Some(selection) = selection else {
            return Ok(Vec::new());
        };
        info!("{}: {} applications submitted {}", TEXAS_SOURCE, selection.rows.len(), selection.day);

        Ok(collect_valid(
            TEXAS_SOURCE,
            selection.rows.into_iter().map(|raw| {
                NormalizedRecord::from_fields(
                    raw_field(raw, "trade_name"),
                    raw_field(raw, "address"),
                    raw_field(raw, "address_2"),
                    raw_field(raw, "city"),
                    raw_field(raw, "state"),
                    raw_field(raw, "zip"),
                )
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::test_support::{feed_from_json, StubHttp};
    use serde_json::json;

    fn source(lookback_days: u32) -> TexasSource {
        TexasSource::new(
            Arc::new(StubHttp::new()),
            SourceConfig::default_for(TEXAS_SOURCE).unwrap(),
            lookback_days,
        )
    }

    fn feed() -> SourceFeed {
        feed_from_json(json!([
            {"submission_date": "2024-05-09T00:00:00.000", "license_type": "BG", "trade_name": "Beer Depot",
             "address": "10 Ranch Rd", "city": "Austin", "state": "TX", "zip": "78701"},
            {"submission_date": "2024-05-09T00:00:00.000", "license_type": "MB", "trade_name": "Lone Star Saloon",
             "address": "22 Congress Ave", "address_2": "Ste 100", "city": "Austin", "state": "TX", "zip": "78701",
             "owner": "Someone"},
            {"submission_date": "2024-05-08T00:00:00.000", "license_type": "FB", "trade_name": "Yesterday Grill",
             "address": "1 Elm", "city": "Dallas", "state": "TX"}
        ]))
    }

    #[test]
    fn test_normalize_keeps_allowed_types_for_yesterday() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let records = source(14).normalize(feed(), today).unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].company, "Lone Star Saloon");
        assert_eq!(records[0].address1, "22 Congress Ave");
        assert_eq!(records[0].address2.as_deref(), Some("Ste 100"));
        assert_eq!(records[0].state, "TX");
    }

    #[test]
    fn test_normalize_past_lookback_is_unavailable() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let err = source(14).normalize(feed(), today).unwrap_err();
        assert!(matches!(err, ScraperError::SourceUnavailable { .. }));
    }
}
