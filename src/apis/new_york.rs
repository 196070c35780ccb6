use crate::apis::socrata::fetch_resource;
use crate::app::ports::HttpClientPort;
use crate::common::constants::NEW_YORK_SOURCE;
use crate::common::error::{Result, ScraperError};
use crate::common::types::{raw_field, LicenseSource, NormalizedRecord, SourceFeed};
use crate::config::SourceConfig;
use crate::pipeline::dates::select_recent_day;
use crate::pipeline::filters::CategoryFilter;
use crate::pipeline::normalize::collect_valid;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, instrument};

const DATE_FIELD: &str = "received_date";
const TYPE_FIELD: &str = "lic_type";

/// New York State Liquor Authority pending licenses (Socrata)
pub struct NewYorkSource {
    http: Arc<dyn HttpClientPort>,
    config: SourceConfig,
    lookback_days: u32,
}

impl NewYorkSource {
    pub fn new(http: Arc<dyn HttpClientPort>, config: SourceConfig, lookback_days: u32) -> Self {
        Self { http, config, lookback_days }
    }
}

#[async_trait::async_trait]
impl LicenseSource for NewYorkSource {
    fn source_name(&self) -> &'static str {
        NEW_YORK_SOURCE
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<SourceFeed> {
        let dataset = self
            .config
            .dataset
            .as_deref()
            .ok_or_else(|| ScraperError::Config("new_york requires a dataset id".into()))?;
        fetch_resource(
            self.http.as_ref(),
            NEW_YORK_SOURCE,
            &self.config.endpoint,
            dataset,
            self.config.row_limit,
        )
        .await
    }

    fn normalize(&self, feed: SourceFeed, today: NaiveDate) -> Result<Vec<NormalizedRecord>> {
        // Date first, then the deny-list, re-applied on every fallback step
        let filter = CategoryFilter::Deny(self.config.categories.clone());
        let selection = select_recent_day(NEW_YORK_SOURCE, &feed, DATE_FIELD, today, self.lookback_days, |raw| {
            filter.allows(raw_field(raw, TYPE_FIELD).as_deref())
        })?;

        let Some(selection) = selection else {
            return Ok(Vec::new());
        };
        info!("{}: {} licenses received {}", NEW_YORK_SOURCE, selection.rows.len(), selection.day);

        Ok(collect_valid(
            NEW_YORK_SOURCE,
            selection.rows.into_iter().map(|raw| {
                // The alternate premises name is the trade name when present
                let company = raw_field(raw, "premise_name2").or_else(|| raw_field(raw, "premise_name"));
                NormalizedRecord::from_fields(
                    company,
                    raw_field(raw, "premise_address"),
                    raw_field(raw, "premise_addesc"),
                    raw_field(raw, "premise_city"),
                    raw_field(raw, "premise_state"),
                    raw_field(raw, "premise_zip"),
                )
            }),
        ))
    }
}
