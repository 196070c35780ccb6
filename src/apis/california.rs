use crate::apis::html_table::first_table;
use crate::app::ports::HttpClientPort;
use crate::common::constants::CALIFORNIA_SOURCE;
use crate::common::error::{Result, ScraperError};
use crate::common::types::{raw_field, LicenseSource, NormalizedRecord, RawRecord, SourceFeed};
use crate::config::SourceConfig;
use crate::pipeline::filters::CategoryFilter;
use crate::pipeline::normalize::{clean_owner_name, collect_valid, normalize_zip, split_street};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, instrument};

const TYPE_DUP_FIELD: &str = "Type| Dup";
const OWNER_FIELD: &str = "Primary Owner and Premises Addr.";
const STREET_FIELD: &str = "Prem Street";

/// California ABC new-applications report (HTML table)
pub struct CaliforniaSource {
    http: Arc<dyn HttpClientPort>,
    config: SourceConfig,
}

impl CaliforniaSource {
    pub fn new(http: Arc<dyn HttpClientPort>, config: SourceConfig) -> Self {
        Self { http, config }
    }
}

/// License type code from the combined `Type| Dup` column, e.g. `"41 | 2"` -> `"41"`
fn license_type(raw: &RawRecord) -> Option<String> {
    let combined = raw_field(raw, TYPE_DUP_FIELD).or_else(|| raw_field(raw, "Type"))?;
    let code = combined.split('|').next()?.trim();
    code.parse::<u32>().ok().map(|n| n.to_string())
}

fn first_field(raw: &RawRecord, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| raw_field(raw, key))
}

#[async_trait::async_trait]
impl LicenseSource for CaliforniaSource {
    fn source_name(&self) -> &'static str {
        CALIFORNIA_SOURCE
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<SourceFeed> {
        let response = self
            .http
            .get(&self.config.endpoint)
            .await
            .map_err(|e| ScraperError::unavailable(CALIFORNIA_SOURCE, e.to_string()))?;

        if !response.is_success() {
            return Err(ScraperError::unavailable(
                CALIFORNIA_SOURCE,
                format!("report page returned HTTP {}", response.status),
            ));
        }

        let table = first_table(&response.text())
            .ok_or_else(|| ScraperError::unavailable(CALIFORNIA_SOURCE, "no table on report page"))?;
        Ok(table.into_records())
    }

    fn normalize(&self, feed: SourceFeed, _today: NaiveDate) -> Result<Vec<NormalizedRecord>> {
        let filter = CategoryFilter::Allow(self.config.categories.clone());
        let rows: Vec<&RawRecord> = feed
            .iter()
            .filter(|raw| filter.allows(license_type(raw).as_deref()))
            .collect();
        info!("{}: {} retail applications", CALIFORNIA_SOURCE, rows.len());

        Ok(collect_valid(
            CALIFORNIA_SOURCE,
            rows.into_iter().map(|raw| {
                let company = raw_field(raw, OWNER_FIELD).map(|owner| clean_owner_name(&owner));
                let (address1, address2) = match raw_field(raw, STREET_FIELD) {
                    Some(street) => {
                        let (a1, a2) = split_street(&street);
                        (Some(a1), a2)
                    }
                    None => (None, None),
                };
                NormalizedRecord::from_fields(
                    company,
                    address1,
                    address2,
                    first_field(raw, &["Prem City", "City"]),
                    Some("CA".to_string()),
                    first_field(raw, &["Zip Code", "Prem Zip"]).map(|z| normalize_zip(&z)),
                )
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::test_support::StubHttp;

    const REPORT: &str = r#"
        <html><body>
        <table>
          <tr><th>License Number</th><th>Status</th><th>Type| Dup</th>
              <th>Primary Owner and Premises Addr.</th><th>Prem Street</th><th>Prem City</th>
              <th>Zip Code</th><th>Mailing City</th></tr>
          <tr><td>600001</td><td>PEND</td><td>41 | 1</td>
              <td>DBA: Joe's Tavern123 Joe's Tavern LLC</td><td>123 MAIN ST, STE 4</td><td>FRESNO</td>
              <td>93721</td><td>ELSEWHERE</td></tr>
          <tr><td>600002</td><td>PEND</td><td>20|1</td>
              <td>DBA: Gas Mart 9 Road</td><td>9 ROAD</td><td>FRESNO</td><td>93722</td><td></td></tr>
          <tr><td>600003</td><td>PEND</td><td>47</td>
              <td>SMITH FAMILY LLC 77 OAK AVE</td><td>77 OAK AVE</td><td>CLOVIS</td><td>93611</td><td></td></tr>
        </table>
        </body></html>"#;

    fn source(http: StubHttp) -> CaliforniaSource {
        CaliforniaSource::new(Arc::new(http), SourceConfig::default_for(CALIFORNIA_SOURCE).unwrap())
    }

    #[tokio::test]
    async fn test_fetch_and_normalize_report() {
        let http = StubHttp::new().with_get(
            "https://www.abc.ca.gov/licensing/licensing-reports/new-applications/",
            200,
            REPORT,
        );
        let src = source(http);
        let feed = src.fetch().await.unwrap();
        assert_eq!(feed.len(), 3);

        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let records = src.normalize(feed, today).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].company, "Joe's Tavern");
        assert_eq!(records[0].address1, "123 MAIN ST");
        assert_eq!(records[0].address2.as_deref(), Some("STE 4"));
        assert_eq!(records[0].city, "FRESNO");
        assert_eq!(records[0].state, "CA");
        assert_eq!(records[0].zip.as_deref(), Some("93721"));

        assert_eq!(records[1].company, "SMITH FAMILY");
        assert_eq!(records[1].address2, None);
    }

    #[tokio::test]
    async fn test_page_without_table_is_unavailable() {
        let http = StubHttp::new().with_get(
            "https://www.abc.ca.gov/licensing/licensing-reports/new-applications/",
            200,
            "<html><body>maintenance</body></html>",
        );
        let err = source(http).fetch().await.unwrap_err();
        assert!(matches!(err, ScraperError::SourceUnavailable { .. }));
    }
}
