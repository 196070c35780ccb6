use crate::app::ports::HttpClientPort;
use crate::common::constants::FLORIDA_SOURCE;
use crate::common::error::{Result, ScraperError};
use crate::common::types::{raw_field, LicenseSource, NormalizedRecord, RawRecord, SourceFeed};
use crate::config::SourceConfig;
use crate::pipeline::filters::CategoryFilter;
use crate::pipeline::normalize::{collect_valid, normalize_zip};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, instrument};

/// Positional layout of the headerless daily extract
const COLUMNS: [&str; 18] = [
    "license_code",
    "county",
    "unused_1",
    "unused_2",
    "unused_3",
    "location_name",
    "parent_name",
    "location_address",
    "unused_4",
    "unused_5",
    "city",
    "state",
    "zip",
    "date",
    "unused_7",
    "license_type",
    "unused_8",
    "unused_9",
];

/// Board code for alcoholic beverage licenses in the extract
const ALCOHOL_LICENSE_CODE: u32 = 4006;

/// Florida DBPR daily license extract (one CSV per day, no history)
pub struct FloridaSource {
    http: Arc<dyn HttpClientPort>,
    config: SourceConfig,
}

impl FloridaSource {
    pub fn new(http: Arc<dyn HttpClientPort>, config: SourceConfig) -> Self {
        Self { http, config }
    }
}

/// Parse the extract into raw records named by `COLUMNS`
pub fn parse_extract(bytes: &[u8]) -> Result<SourceFeed> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let raw: RawRecord = COLUMNS
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
            .collect();
        rows.push(raw);
    }
    Ok(rows)
}

fn is_alcohol_license(raw: &RawRecord) -> bool {
    raw_field(raw, "license_code")
        .and_then(|code| code.parse::<f64>().ok())
        .is_some_and(|code| code == f64::from(ALCOHOL_LICENSE_CODE))
}

#[async_trait::async_trait]
impl LicenseSource for FloridaSource {
    fn source_name(&self) -> &'static str {
        FLORIDA_SOURCE
    }

    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<SourceFeed> {
        let response = self
            .http
            .get(&self.config.endpoint)
            .await
            .map_err(|e| ScraperError::unavailable(FLORIDA_SOURCE, e.to_string()))?;

        if !response.is_success() {
            return Err(ScraperError::unavailable(
                FLORIDA_SOURCE,
                format!("daily extract returned HTTP {}", response.status),
            ));
        }

        parse_extract(&response.bytes)
            .map_err(|e| ScraperError::unavailable(FLORIDA_SOURCE, format!("unreadable extract: {}", e)))
    }

    fn normalize(&self, feed: SourceFeed, _today: NaiveDate) -> Result<Vec<NormalizedRecord>> {
        // The extract is already a single day; only the license filters apply
        let filter = CategoryFilter::Contains(self.config.categories.clone());
        let rows: Vec<&RawRecord> = feed
            .iter()
            .filter(|raw| is_alcohol_license(raw))
            .filter(|raw| filter.allows(raw_field(raw, "license_type").as_deref()))
            .collect();
        info!("{}: {} new or relocated alcohol licenses", FLORIDA_SOURCE, rows.len());

        Ok(collect_valid(
            FLORIDA_SOURCE,
            rows.into_iter().map(|raw| {
                NormalizedRecord::from_fields(
                    raw_field(raw, "location_name"),
                    raw_field(raw, "location_address"),
                    None,
                    raw_field(raw, "city"),
                    raw_field(raw, "state"),
                    raw_field(raw, "zip").map(|z| normalize_zip(&z)),
                )
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apis::test_support::StubHttp;

    const EXTRACT: &str = "\
4006,ORANGE,a,b,c,SUNSHINE TAVERN,SUN HOLDINGS,12 PALM AVE,d,e,ORLANDO,FL,32801.0,05/09/2024,f,Initial License,g,h
4006,ORANGE,a,b,c,RENEWED PUB,X,3 OAK,d,e,ORLANDO,FL,32803,05/09/2024,f,Renewal,g,h
2001,DADE,a,b,c,BARBER SHOP,X,4 PINE,d,e,MIAMI,FL,33101,05/09/2024,f,Initial License,g,h
4006,DADE,a,b,c,MOVED BAR,X,8 BAY RD,d,e,MIAMI,FL,33139,05/09/2024,f,Address Change,g,h
";

    fn source(http: StubHttp) -> FloridaSource {
        FloridaSource::new(Arc::new(http), SourceConfig::default_for(FLORIDA_SOURCE).unwrap())
    }

    #[test]
    fn test_parse_extract_names_columns() {
        let rows = parse_extract(EXTRACT.as_bytes()).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(raw_field(&rows[0], "location_name").as_deref(), Some("SUNSHINE TAVERN"));
        assert_eq!(raw_field(&rows[0], "license_type").as_deref(), Some("Initial License"));
    }

    #[test]
    fn test_normalize_filters_code_and_type() {
        let rows = parse_extract(EXTRACT.as_bytes()).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 5, 10).unwrap();
        let records = source(StubHttp::new()).normalize(rows, today).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].company, "SUNSHINE TAVERN");
        assert_eq!(records[0].address1, "12 PALM AVE");
        assert_eq!(records[0].zip.as_deref(), Some("32801"));
        assert_eq!(records[0].address2, None);
        assert_eq!(records[1].company, "MOVED BAR");
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_unavailable() {
        let http = StubHttp::new().with_get(
            "http://www.myfloridalicense.com/dbpr/sto/file_download/extracts/daily.csv",
            404,
            "not found",
        );
        let err = source(http).fetch().await.unwrap_err();
        assert!(matches!(err, ScraperError::SourceUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_fetch_parses_download() {
        let http = StubHttp::new().with_get(
            "http://www.myfloridalicense.com/dbpr/sto/file_download/extracts/daily.csv",
            200,
            EXTRACT,
        );
        assert_eq!(source(http).fetch().await.unwrap().len(), 4);
    }
}
