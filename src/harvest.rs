// One complete run: permission check, pagination walk, CSV export.
use crate::browser::{PageDriver, PermissionCheck};
use crate::config::{HarvestSettings, SelectorConfig};
use crate::model::{BrowserError, HarvestError};
use crate::parser::RfqParser;
use crate::storage::{finalize, ExportSummary};
use crate::utils::capture_date;
use crate::walker::{PaginationWalker, WalkEnd};

use std::future::Future;
use tracing::{error, info};

#[derive(Debug)]
pub struct HarvestSummary {
    pub pages: u32,
    pub harvested: usize,
    pub skipped: usize,
    pub end: WalkEnd,
    pub export: ExportSummary,
}

/// Runs the harvester against `entry_url`.
///
/// `launch` is only called once robots.txt has allowed the target, so a denied
/// run never opens a browser session.
pub async fn run_harvest<D, F, Fut>(
    entry_url: &str,
    selectors: &SelectorConfig,
    settings: &HarvestSettings,
    permission: &dyn PermissionCheck,
    launch: F,
) -> Result<HarvestSummary, HarvestError>
where
    D: PageDriver,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<D, BrowserError>>,
{
    settings.validate()?;
    selectors.validate()?;
    let parser = RfqParser::new(selectors, capture_date())?;

    if !permission.is_allowed(entry_url).await {
        error!("robots.txt disallows scraping this site.");
        return Err(HarvestError::PermissionDenied(entry_url.to_string()));
    }

    let driver = launch().await?;
    let walker = PaginationWalker::new(selectors, settings, &parser);
    let report = walker.walk(driver, entry_url).await;

    let harvested = report.records.len();
    let export = finalize(report.records, &settings.output)?;
    info!("Scraping complete. Data saved to {}", export.path.display());

    Ok(HarvestSummary {
        pages: report.pages,
        harvested,
        skipped: report.skipped,
        end: report.end,
        export,
    })
}
