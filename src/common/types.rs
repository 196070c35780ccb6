use crate::common::error::{Result, ScraperError};
use chrono::NaiveDate;
use serde_json::Value;

/// One upstream row, keyed by the source's own field names
pub type RawRecord = serde_json::Map<String, Value>;

/// Everything one source returned in one run
pub type SourceFeed = Vec<RawRecord>;

/// A business record in the shared output schema.
///
/// Company, Address1, City and State are always non-empty. Phone stays
/// `None` until enrichment finds a number (or the source supplied one).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub company: String,
    pub address1: String,
    pub address2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: Option<String>,
    pub phone: Option<String>,
}

impl NormalizedRecord {
    /// Build a record from already-mapped fields, trimming values and
    /// rejecting rows that lack a required column.
    pub fn from_fields(
        company: Option<String>,
        address1: Option<String>,
        address2: Option<String>,
        city: Option<String>,
        state: Option<String>,
        zip: Option<String>,
    ) -> Result<Self> {
        Ok(Self {
            company: required(company, "Company")?,
            address1: required(address1, "Address1")?,
            address2: clean(address2),
            city: required(city, "City")?,
            state: required(state, "State")?,
            zip: clean(zip),
            phone: None,
        })
    }

    pub fn with_phone(mut self, phone: Option<String>) -> Self {
        self.phone = clean(phone);
        self
    }

    pub fn has_phone(&self) -> bool {
        self.phone.is_some()
    }

    /// Cell values in canonical column order; absent values are empty strings
    pub fn to_row(&self) -> [&str; 7] {
        [
            self.company.as_str(),
            self.address1.as_str(),
            self.address2.as_deref().unwrap_or(""),
            self.city.as_str(),
            self.state.as_str(),
            self.zip.as_deref().unwrap_or(""),
            self.phone.as_deref().unwrap_or(""),
        ]
    }
}

fn required(value: Option<String>, column: &str) -> Result<String> {
    clean(value).ok_or_else(|| ScraperError::MissingField(column.to_string()))
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read a field from a raw record as a trimmed, non-empty string.
/// Numbers are rendered the way the upstream JSON had them.
pub fn raw_field(raw: &RawRecord, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Core trait that every state license feed implements
#[async_trait::async_trait]
pub trait LicenseSource: Send + Sync {
    /// Unique identifier for this source
    fn source_name(&self) -> &'static str;

    /// Fetch the raw dataset for this source
    async fn fetch(&self) -> Result<SourceFeed>;

    /// Filter and map a fetched feed into canonical records.
    /// `today` is the run date; date selection starts from the day before.
    fn normalize(&self, feed: SourceFeed, today: NaiveDate) -> Result<Vec<NormalizedRecord>>;
}
