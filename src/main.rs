mod browser;
mod config;
mod harvest;
mod model;
mod normalizer;
mod parser;
mod storage;
mod utils;
mod walker;

use browser::{HttpDriver, RobotsPolicy};
use clap::{Parser, ValueEnum};
use config::{load_selector_config, HarvestSettings, SelectorConfig, DEFAULT_OUTPUT, USER_AGENT};
use harvest::{run_harvest, HarvestSummary};
use model::HarvestError;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DriverKind {
    /// Fetch server-rendered pages over plain HTTP
    Http,
    /// Drive headless Chromium (needs the `browser` feature)
    Chrome,
}

/// Harvest RFQ listings from a paginated marketplace into a CSV file.
#[derive(Debug, Parser)]
#[command(name = "rfq-harvester", version)]
struct Args {
    /// Listing page to start from
    url: Url,

    /// JSON selector configuration; the built-in marketplace layout is used when omitted
    selector_config: Option<PathBuf>,

    /// Maximum number of result pages to visit
    #[arg(long, default_value_t = 10)]
    max_pages: u32,

    /// Output CSV path
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Seconds to wait for listing cards after each page load
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// Extra reloads when cards do not appear in time
    #[arg(long, default_value_t = 1)]
    load_retries: u32,

    /// Lower bound of the pause between pages, in seconds
    #[arg(long, default_value_t = 1.5)]
    min_delay: f64,

    /// Upper bound of the pause between pages, in seconds
    #[arg(long, default_value_t = 3.5)]
    max_delay: f64,

    #[arg(long, value_enum, default_value_t = DriverKind::Http)]
    driver: DriverKind,
}

impl Args {
    fn settings(&self) -> Result<HarvestSettings, String> {
        let delay = |secs: f64, name: &str| {
            Duration::try_from_secs_f64(secs).map_err(|_| format!("invalid {}: {}", name, secs))
        };

        Ok(HarvestSettings {
            max_pages: self.max_pages,
            page_timeout: Duration::from_secs(self.timeout),
            load_retries: self.load_retries,
            min_delay: delay(self.min_delay, "--min-delay")?,
            max_delay: delay(self.max_delay, "--max-delay")?,
            output: self.output.clone(),
            user_agent: USER_AGENT.to_string(),
        })
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Panic occurred: {:?}", panic_info);
    }));

    let selectors = match &args.selector_config {
        Some(path) => match load_selector_config(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                error!("Config load error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => {
            info!("No selector config given, using the built-in marketplace layout");
            SelectorConfig::marketplace_default()
        }
    };

    let settings = match args.settings() {
        Ok(s) => s,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let robots = match RobotsPolicy::new(&settings.user_agent, settings.page_timeout) {
        Ok(r) => r,
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("🚀 Harvesting {} (driver: {:?})", args.url, args.driver);
    let url = args.url.as_str();

    let result = match args.driver {
        DriverKind::Http => {
            run_harvest(url, &selectors, &settings, &robots, || {
                std::future::ready(HttpDriver::new(&settings.user_agent, settings.page_timeout))
            })
            .await
        }
        DriverKind::Chrome => run_with_chrome(url, &selectors, &settings, &robots).await,
    };

    match result {
        Ok(summary) => {
            report(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(feature = "browser")]
async fn run_with_chrome(
    url: &str,
    selectors: &SelectorConfig,
    settings: &HarvestSettings,
    robots: &RobotsPolicy,
) -> Result<HarvestSummary, HarvestError> {
    run_harvest(url, selectors, settings, robots, || {
        browser::ChromeDriver::launch(&settings.user_agent)
    })
    .await
}

#[cfg(not(feature = "browser"))]
async fn run_with_chrome(
    _url: &str,
    _selectors: &SelectorConfig,
    _settings: &HarvestSettings,
    _robots: &RobotsPolicy,
) -> Result<HarvestSummary, HarvestError> {
    Err(HarvestError::Launch(model::BrowserError::Launch(
        "this build has no Chromium support; rebuild with `--features browser`".into(),
    )))
}

fn report(summary: &HarvestSummary) {
    if summary.end.is_failed() {
        warn!("Run ended early: {}", summary.end);
    }
    info!(
        "{} page(s), {} records harvested, {} cards skipped, {} rows written to {}",
        summary.pages,
        summary.harvested,
        summary.skipped,
        summary.export.rows,
        summary.export.path.display()
    );
}
