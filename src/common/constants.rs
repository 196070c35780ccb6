/// Source name constants to ensure consistency across the codebase.
/// These are the names accepted by `--sources` and used as config table keys.
pub const NEW_YORK_SOURCE: &str = "new_york";
pub const FLORIDA_SOURCE: &str = "florida";
pub const TEXAS_SOURCE: &str = "texas";
pub const CALIFORNIA_SOURCE: &str = "california";
pub const ARIZONA_SOURCE: &str = "arizona";

/// Sources whose records go through phone enrichment, in output order.
pub const DAILY_SOURCES: [&str; 4] = [NEW_YORK_SOURCE, FLORIDA_SOURCE, TEXAS_SOURCE, CALIFORNIA_SOURCE];

/// Sources appended after enrichment. They carry their own phone numbers.
pub const APPENDED_SOURCES: [&str; 1] = [ARIZONA_SOURCE];

// Canonical output columns, in order
pub const COL_COMPANY: &str = "Company";
pub const COL_ADDRESS1: &str = "Address1";
pub const COL_ADDRESS2: &str = "Address2";
pub const COL_CITY: &str = "City";
pub const COL_STATE: &str = "State";
pub const COL_ZIP: &str = "Zip";
pub const COL_PHONE: &str = "Phone";

pub const CANONICAL_COLUMNS: [&str; 7] = [
    COL_COMPANY,
    COL_ADDRESS1,
    COL_ADDRESS2,
    COL_CITY,
    COL_STATE,
    COL_ZIP,
    COL_PHONE,
];

pub const DEFAULT_OUTPUT_PATH: &str = "daily_license.xlsx";
pub const DEFAULT_LOOKBACK_DAYS: u32 = 14;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.36";

/// Get all supported source names in run order
pub fn get_supported_sources() -> Vec<&'static str> {
    DAILY_SOURCES.iter().chain(APPENDED_SOURCES.iter()).copied().collect()
}

pub fn is_enriched_source(name: &str) -> bool {
    DAILY_SOURCES.contains(&name)
}
