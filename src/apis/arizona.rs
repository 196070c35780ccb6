use crate::apis::html_table::{find_submit_form, first_table, join_url};
use crate::app::ports::HttpClientPort;
use crate::common::constants::ARIZONA_SOURCE;
use crate::common::error::{Result, ScraperError};
use crate::common::types::{raw_field, LicenseSource, NormalizedRecord, RawRecord, SourceFeed};
use crate::config::SourceConfig;
use crate::pipeline::dates::select_recent_day;
use crate::pipeline::filters::CategoryFilter;
use crate::pipeline::normalize::{collect_valid, normalize_zip};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, instrument};

const EXPORT_CONTROL_NAME: &str = "Excel Pending";
const EXPORT_CONTROL_VALUE: &str = "Export Pending to Excel";
const DATE_FIELD: &str = "Accepted";
const TYPE_FIELD: &str = "Type";

/// Arizona DLLC pending applications, obtained by replaying the page's export form
pub struct ArizonaSource {
    http: Arc<dyn HttpClientPort>,
    config: SourceConfig,
    lookback_days: u32,
}

impl ArizonaSource {
    pub fn new(http: Arc<dyn HttpClientPort>, config: SourceConfig, lookback_days: u32) -> Self {
        Self { http, config, lookback_days }
    }

    fn page_url(&self) -> Result<String> {
        match self.config.dataset.as_deref() {
            Some(page) => join_url(&self.config.endpoint, page),
            None => Ok(self.config.endpoint.clone()),
        }
    }
}

#[async_trait::async_trait]
impl LicenseSource for ArizonaSource {
    fn source_name(&self) -> &'static str {
        ARIZONA_SOURCE
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<SourceFeed> {
        let unavailable = |message: String| ScraperError::unavailable(ARIZONA_SOURCE, message);

        let page_url = self.page_url().map_err(|e| unavailable(e.to_string()))?;
        let page = self.http.get(&page_url).await.map_err(|e| unavailable(e.to_string()))?;
        if !page.is_success() {
            return Err(unavailable(format!("pending page returned HTTP {}", page.status)));
        }

        let form = find_submit_form(&page.text(), EXPORT_CONTROL_NAME, EXPORT_CONTROL_VALUE)
            .ok_or_else(|| unavailable("export form not found on pending page".to_string()))?;
        let export_url = join_url(&page_url, &form.action).map_err(|e| unavailable(e.to_string()))?;
        debug!("Replaying export form to {}", export_url);

        let fields = vec![
            (form.control_name, form.control_value),
            ("ExportToExcel".to_string(), "Y".to_string()),
        ];
        let export = self
            .http
            .post_form(&export_url, &fields)
            .await
            .map_err(|e| unavailable(e.to_string()))?;
        if !export.is_success() {
            return Err(unavailable(format!("export returned HTTP {}", export.status)));
        }

        let table = first_table(&export.text()).ok_or_else(|| unavailable("export contained no table".to_string()))?;
        Ok(table.into_records())
    }

    fn normalize(&self, feed: SourceFeed, today: NaiveDate) -> Result<Vec<NormalizedRecord>> {
        // Category over the whole feed first, then date selection on what remains
        let filter = CategoryFilter::Allow(self.config.categories.clone());
        let retail: Vec<RawRecord> = feed
            .into_iter()
            .filter(|raw| filter.allows(raw_field(raw, TYPE_FIELD).as_deref()))
            .collect();

        let Some(selection) =
            select_recent_day(ARIZONA_SOURCE, &retail, DATE_FIELD, today, self.lookback_days, |_| true)?
        else {
            return Ok(Vec::new());
        };
        info!("{}: {} applications accepted {}", ARIZONA_SOURCE, selection.rows.len(), selection.day);

        Ok(collect_valid(
            ARIZONA_SOURCE,
            selection.rows.into_iter().map(|raw| {
                NormalizedRecord::from_fields(
                    raw_field(raw, "Business Name"),
                    raw_field(raw, "Business Address"),
                    None,
                    raw_field(raw, "City"),
                    Some("AZ".to_string()),
                    raw_field(raw, "Zip").map(|z| normalize_zip(&z)),
                )
                .map(|record| record.with_phone(raw_field(raw, "Business Phone")))
            }),
        ))
    }
}
