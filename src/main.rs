use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use liquor_scraper::app::ports::{HttpClientPort, PhoneLookup};
use liquor_scraper::config::Config;
use liquor_scraper::infra::http_client::ReqwestHttp;
use liquor_scraper::logging;
use liquor_scraper::pipeline::enrich::SearchSnippetLookup;
use liquor_scraper::pipeline::{Pipeline, SourceOutcome};

#[derive(Parser)]
#[command(name = "liquor_scraper")]
#[command(about = "Collect newly issued state liquor licenses into one spreadsheet")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML config (defaults to $LIQUOR_SCRAPER_CONFIG or config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output file; the extension picks the format (.xlsx or .csv)
    #[arg(long)]
    output: Option<String>,

    /// Specific sources to run (comma-separated). Available: new_york, florida, texas, california, arizona
    #[arg(long)]
    sources: Option<String>,

    /// Skip the phone number lookup
    #[arg(long)]
    no_enrich: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = logging::init_logging();

    let cli = Cli::parse();

    let config_path = cli
        .config
        .or_else(|| std::env::var("LIQUOR_SCRAPER_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.toml"));
    let mut config = Config::load(&config_path).context("loading configuration")?;

    if let Some(output) = cli.output {
        config.output_path = output;
    }
    if let Some(list) = cli.sources {
        let names: Vec<String> = list.split(',').map(|s| s.trim().to_string()).collect();
        config.restrict_sources(&names)?;
    }
    if cli.no_enrich {
        config.enrichment.enabled = false;
    }

    let http: Arc<dyn HttpClientPort> = Arc::new(ReqwestHttp::new(config.user_agent.clone()));
    let lookup: Option<Arc<dyn PhoneLookup>> = if config.enrichment.enabled {
        Some(Arc::new(SearchSnippetLookup::new(http.clone(), &config.enrichment)?))
    } else {
        None
    };

    let today = chrono::Local::now().date_naive();
    let pipeline = Pipeline::new(config, http, lookup);

    match pipeline.run(today).await {
        Ok(result) => {
            info!("Pipeline finished");
            println!("\n📊 License run for {}:", today);
            for report in &result.sources {
                match &report.outcome {
                    SourceOutcome::Retrieved(n) => println!("   ✅ {}: {} records", report.source, n),
                    SourceOutcome::Empty => println!("   ➖ {}: empty today", report.source),
                    SourceOutcome::Unavailable(e) => println!("   ⚠️  {}: unavailable ({})", report.source, e),
                }
            }
            println!("   Phones found: {}/{}", result.phones_found, result.phones_looked_up);
            println!("   Total records: {}", result.total_records);
            println!("   Output file: {}", result.output_file);
            Ok(())
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            Err(e.into())
        }
    }
}
