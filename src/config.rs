use crate::common::constants::{
    get_supported_sources, ARIZONA_SOURCE, CALIFORNIA_SOURCE, DEFAULT_LOOKBACK_DAYS, DEFAULT_OUTPUT_PATH,
    DEFAULT_USER_AGENT, FLORIDA_SOURCE, NEW_YORK_SOURCE, TEXAS_SOURCE,
};
use crate::common::error::{Result, ScraperError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Resolved run configuration. Every value has a built-in default, so an
/// empty or missing `config.toml` yields the standard five-state run.
#[derive(Debug, Clone)]
pub struct Config {
    pub output_path: String,
    pub lookback_days: u32,
    pub user_agent: String,
    pub enrichment: EnrichmentConfig,
    pub sources: BTreeMap<String, SourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub enabled: bool,
    pub search_url: String,
    pub snippet_selector: String,
    pub keyword: String,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            search_url: "https://www.google.com/search".to_string(),
            snippet_selector: "span.mw31Ze".to_string(),
            keyword: "phone".to_string(),
        }
    }
}

/// Per-source settings: where to fetch, how many rows, which license types
#[derive(Debug, Clone, PartialEq)]
pub struct SourceConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub dataset: Option<String>,
    pub row_limit: Option<u32>,
    pub categories: Vec<String>,
}

impl SourceConfig {
    fn new(endpoint: &str, dataset: Option<&str>, row_limit: Option<u32>, categories: &[&str]) -> Self {
        Self {
            enabled: true,
            endpoint: endpoint.to_string(),
            dataset: dataset.map(str::to_string),
            row_limit,
            categories: categories.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Built-in settings for a known source
    pub fn default_for(name: &str) -> Option<Self> {
        let config = match name {
            NEW_YORK_SOURCE => Self::new("data.ny.gov", Some("t5r8-ymc5"), Some(10_000), &["HL", "L", "AX"]),
            FLORIDA_SOURCE => Self::new(
                "http://www.myfloridalicense.com/dbpr/sto/file_download/extracts/daily.csv",
                None,
                None,
                &["Initial", "Address Change"],
            ),
            TEXAS_SOURCE => Self::new("data.texas.gov", Some("mxm5-tdpj"), Some(2_000), &["MB", "FB"]),
            CALIFORNIA_SOURCE => Self::new(
                "https://www.abc.ca.gov/licensing/licensing-reports/new-applications/",
                None,
                None,
                &["40", "41", "42", "47", "48", "61", "75"],
            ),
            ARIZONA_SOURCE => Self::new(
                "https://azliquor.gov/query/",
                Some("results_pendingapps.cfm"),
                None,
                &["Beer and Wine Bar", "Bar", "Restaurant"],
            ),
            _ => return None,
        };
        Some(config)
    }

    fn apply(&mut self, overrides: SourceOverride) {
        if let Some(enabled) = overrides.enabled {
            self.enabled = enabled;
        }
        if let Some(endpoint) = overrides.endpoint {
            self.endpoint = endpoint;
        }
        if overrides.dataset.is_some() {
            self.dataset = overrides.dataset;
        }
        if overrides.row_limit.is_some() {
            self.row_limit = overrides.row_limit;
        }
        if let Some(categories) = overrides.categories {
            self.categories = categories;
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SourceOverride {
    enabled: Option<bool>,
    endpoint: Option<String>,
    dataset: Option<String>,
    row_limit: Option<u32>,
    categories: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    output_path: Option<String>,
    lookback_days: Option<u32>,
    user_agent: Option<String>,
    #[serde(default)]
    enrichment: EnrichmentConfig,
    #[serde(default)]
    sources: BTreeMap<String, SourceOverride>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            enrichment: EnrichmentConfig::default(),
            sources: get_supported_sources()
                .into_iter()
                .filter_map(|name| SourceConfig::default_for(name).map(|c| (name.to_string(), c)))
                .collect(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No config file at '{}', using built-in defaults", path.display());
            return Ok(Self::default());
        }
        let config_content = fs::read_to_string(path).map_err(|e| {
            ScraperError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: RawConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(output_path) = raw.output_path {
            config.output_path = output_path;
        }
        if let Some(lookback_days) = raw.lookback_days {
            if lookback_days == 0 {
                return Err(ScraperError::Config("lookback_days must be at least 1".into()));
            }
            config.lookback_days = lookback_days;
        }
        if let Some(user_agent) = raw.user_agent {
            config.user_agent = user_agent;
        }
        config.enrichment = raw.enrichment;

        for (name, overrides) in raw.sources {
            let source = config
                .sources
                .get_mut(&name)
                .ok_or_else(|| ScraperError::Config(format!("Unknown source '{}'", name)))?;
            source.apply(overrides);
        }
        Ok(config)
    }

    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.get(name)
    }

    /// Keep only the named sources enabled
    pub fn restrict_sources(&mut self, names: &[String]) -> Result<()> {
        for name in names {
            if !self.sources.contains_key(name) {
                return Err(ScraperError::Config(format!("Unknown source '{}'", name)));
            }
        }
        for (name, source) in self.sources.iter_mut() {
            source.enabled = source.enabled && names.iter().any(|n| n == name);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_every_source() {
        let config = Config::default();
        assert_eq!(config.output_path, "daily_license.xlsx");
        assert_eq!(config.lookback_days, 14);
        for name in get_supported_sources() {
            assert!(config.source(name).unwrap().enabled, "{name} should be enabled");
        }
        assert_eq!(config.source(TEXAS_SOURCE).unwrap().row_limit, Some(2_000));
        assert_eq!(config.source(NEW_YORK_SOURCE).unwrap().categories, vec!["HL", "L", "AX"]);
    }

    #[test]
    fn test_partial_source_override_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            output_path = "out/licenses.csv"

            [enrichment]
            enabled = false

            [sources.texas]
            row_limit = 5000
            categories = ["MB"]
            "#,
        )
        .unwrap();

        let texas = config.source(TEXAS_SOURCE).unwrap();
        assert_eq!(texas.row_limit, Some(5_000));
        assert_eq!(texas.categories, vec!["MB"]);
        assert_eq!(texas.dataset.as_deref(), Some("mxm5-tdpj"));
        assert_eq!(config.output_path, "out/licenses.csv");
        assert!(!config.enrichment.enabled);
        assert_eq!(config.enrichment.snippet_selector, "span.mw31Ze");
    }

    #[test]
    fn test_unknown_source_is_rejected() {
        let err = Config::from_toml("[sources.oregon]\nenabled = true\n").unwrap_err();
        assert!(matches!(err, ScraperError::Config(_)));
    }

    #[test]
    fn test_zero_lookback_is_rejected() {
        assert!(Config::from_toml("lookback_days = 0").is_err());
    }

    #[test]
    fn test_restrict_sources() {
        let mut config = Config::default();
        config
            .restrict_sources(&[FLORIDA_SOURCE.to_string(), ARIZONA_SOURCE.to_string()])
            .unwrap();
        assert!(config.source(FLORIDA_SOURCE).unwrap().enabled);
        assert!(config.source(ARIZONA_SOURCE).unwrap().enabled);
        assert!(!config.source(NEW_YORK_SOURCE).unwrap().enabled);

        assert!(config.restrict_sources(&["nowhere".to_string()]).is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.lookback_days, DEFAULT_LOOKBACK_DAYS);
    }
}
