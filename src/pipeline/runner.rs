use crate::apis::create_source;
use crate::app::ports::{HttpClientPort, PhoneLookup};
use crate::common::constants::{get_supported_sources, is_enriched_source};
use crate::common::error::Result;
use crate::common::types::{LicenseSource, NormalizedRecord};
use crate::config::Config;
use crate::pipeline::aggregate::aggregate;
use crate::pipeline::enrich::{enrich_phones, EnrichmentStats};
use crate::pipeline::output::write_records;
use chrono::NaiveDate;
use metrics::counter;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn, Instrument};

/// How one source fared in a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Retrieved(usize),
    Empty,
    Unavailable(String),
}

#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source: String,
    pub outcome: SourceOutcome,
}

/// Result of a complete pipeline run
#[derive(Debug)]
pub struct PipelineResult {
    pub sources: Vec<SourceReport>,
    pub total_records: usize,
    pub phones_looked_up: usize,
    pub phones_found: usize,
    pub output_file: String,
}

pub struct Pipeline {
    config: Config,
    http: Arc<dyn HttpClientPort>,
    lookup: Option<Arc<dyn PhoneLookup>>,
}

impl Pipeline {
    /// `lookup` of `None` skips phone enrichment entirely
    pub fn new(config: Config, http: Arc<dyn HttpClientPort>, lookup: Option<Arc<dyn PhoneLookup>>) -> Self {
        Self { config, http, lookup }
    }

    /// Fetch and normalize one source, containing any failure to that source
    pub async fn collect_source(source: &dyn LicenseSource, today: NaiveDate) -> (Vec<NormalizedRecord>, SourceReport) {
        let name = source.source_name();
        let span = tracing::info_span!("source", name = %name);

        async move {
            let normalized = match source.fetch().await {
                Ok(feed) => {
                    info!("Fetched {} raw rows", feed.len());
                    source.normalize(feed, today)
                }
                Err(e) => Err(e),
            };

            let (records, outcome) = match normalized {
                Ok(records) if records.is_empty() => {
                    info!("{} has no new licenses today", name);
                    (records, SourceOutcome::Empty)
                }
                Ok(records) => {
                    info!("{} retrieved successfully: {} records", name, records.len());
                    let count = records.len();
                    (records, SourceOutcome::Retrieved(count))
                }
                Err(e) => {
                    warn!("{} unavailable, contributing no records: {}", name, e);
                    counter!("liquor_source_failures_total", "source" => name).increment(1);
                    (Vec::new(), SourceOutcome::Unavailable(e.to_string()))
                }
            };
            counter!("liquor_records_total", "source" => name).increment(records.len() as u64);

            let report = SourceReport {
                source: name.to_string(),
                outcome,
            };
            (records, report)
        }
        .instrument(span)
        .await
    }

    /// Collect every source in order and concatenate their records
    pub async fn collect_all(
        sources: &[Box<dyn LicenseSource>],
        today: NaiveDate,
    ) -> (Vec<NormalizedRecord>, Vec<SourceReport>) {
        let mut contributions = Vec::with_capacity(sources.len());
        let mut reports = Vec::with_capacity(sources.len());
        for source in sources {
            let (records, report) = Self::collect_source(source.as_ref(), today).await;
            contributions.push(records);
            reports.push(report);
        }
        (aggregate(contributions), reports)
    }

    /// Run with explicit source lists: `daily` sources are enriched, `appended`
    /// sources are added afterwards as-is.
    pub async fn run_with_sources(
        &self,
        daily: &[Box<dyn LicenseSource>],
        appended: &[Box<dyn LicenseSource>],
        today: NaiveDate,
    ) -> Result<PipelineResult> {
        info!("🚀 Starting license run for {}", today);

        let (mut records, mut reports) = Self::collect_all(daily, today).await;

        let stats = match &self.lookup {
            Some(lookup) => enrich_phones(&mut records, lookup.as_ref(), &self.config.enrichment.keyword).await,
            None => {
                info!("Phone enrichment disabled");
                EnrichmentStats::default()
            }
        };

        let (extra, extra_reports) = Self::collect_all(appended, today).await;
        records.extend(extra);
        reports.extend(extra_reports);

        let output_path = Path::new(&self.config.output_path);
        write_records(output_path, &records)?;

        Ok(PipelineResult {
            sources: reports,
            total_records: records.len(),
            phones_looked_up: stats.looked_up,
            phones_found: stats.found,
            output_file: output_path.display().to_string(),
        })
    }

    /// Run every enabled source from the configuration
    pub async fn run(&self, today: NaiveDate) -> Result<PipelineResult> {
        let mut daily = Vec::new();
        let mut appended = Vec::new();

        for name in get_supported_sources() {
            if !self.config.source(name).is_some_and(|s| s.enabled) {
                info!("{} disabled, skipping", name);
                continue;
            }
            let Some(source) = create_source(name, self.http.clone(), &self.config) else {
                continue;
            };
            if is_enriched_source(name) {
                daily.push(source);
            } else {
                appended.push(source);
            }
        }

        self.run_with_sources(&daily, &appended, today).await
    }
}
