pub mod arizona;
pub mod california;
pub mod florida;
pub mod html_table;
pub mod new_york;
pub mod socrata;
pub mod texas;

use crate::app::ports::HttpClientPort;
use crate::common::constants::{ARIZONA_SOURCE, CALIFORNIA_SOURCE, FLORIDA_SOURCE, NEW_YORK_SOURCE, TEXAS_SOURCE};
use crate::common::types::LicenseSource;
use crate::config::Config;
use std::sync::Arc;

use self::arizona::ArizonaSource;
use self::california::CaliforniaSource;
use self::florida::FloridaSource;
use self::new_york::NewYorkSource;
use self::texas::TexasSource;

/// Build the adapter for a named source, or `None` for an unknown name
pub fn create_source(name: &str, http: Arc<dyn HttpClientPort>, config: &Config) -> Option<Box<dyn LicenseSource>> {
    let source_config = config.source(name)?.clone();
    let lookback = config.lookback_days;
    match name {
        NEW_YORK_SOURCE => Some(Box::new(NewYorkSource::new(http, source_config, lookback))),
        FLORIDA_SOURCE => Some(Box::new(FloridaSource::new(http, source_config))),
        TEXAS_SOURCE => Some(Box::new(TexasSource::new(http, source_config, lookback))),
        CALIFORNIA_SOURCE => Some(Box::new(CaliforniaSource::new(http, source_config))),
        ARIZONA_SOURCE => Some(Box::new(ArizonaSource::new(http, source_config, lookback))),
        _ => None,
    }
}
