//! Pagination walker.
//!
//! Owns the browser session for the whole run and drives it through
//! `LoadingPage -> ExtractingCards -> Advancing` until it reaches `Done` or
//! `Failed`. Neither terminal state is an error: the caller always gets the
//! records accumulated so far, in page order and DOM order within a page.

use crate::browser::PageDriver;
use crate::config::{HarvestSettings, SelectorConfig};
use crate::model::{BrowserError, RfqRecord};
use crate::parser::Parser;
use crate::utils::politeness_delay;

use std::fmt;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Why the walk stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEnd {
    /// The next-page control was marked disabled.
    LastPage,
    /// No next-page control on the page.
    NoNextControl,
    /// The page limit was reached.
    PageLimit,
    /// A loaded page had no cards.
    NoCards,
    /// Locating or clicking the next-page control failed.
    PaginationFailed(String),
    /// Cards never appeared on `page`.
    LoadFailed { page: u32, reason: String },
}

impl WalkEnd {
    pub fn is_failed(&self) -> bool {
        matches!(self, WalkEnd::LoadFailed { .. })
    }
}

impl fmt::Display for WalkEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalkEnd::LastPage => write!(f, "reached final page"),
            WalkEnd::NoNextControl => write!(f, "no next-page control"),
            WalkEnd::PageLimit => write!(f, "page limit reached"),
            WalkEnd::NoCards => write!(f, "page without cards"),
            WalkEnd::PaginationFailed(reason) => write!(f, "pagination failed: {}", reason),
            WalkEnd::LoadFailed { page, reason } => {
                write!(f, "page {} never loaded: {}", page, reason)
            }
        }
    }
}

#[derive(Debug)]
pub struct WalkReport {
    pub records: Vec<RfqRecord>,
    /// Pages whose cards were extracted.
    pub pages: u32,
    /// Cards dropped because a mandatory field was missing.
    pub skipped: usize,
    pub end: WalkEnd,
}

enum State {
    LoadingPage { navigate_to: Option<String> },
    ExtractingCards,
    Advancing,
    Done(WalkEnd),
    Failed(WalkEnd),
}

#[derive(Default)]
struct Harvest {
    records: Vec<RfqRecord>,
    pages: u32,
    skipped: usize,
}

pub struct PaginationWalker<'a, P: Parser> {
    selectors: &'a SelectorConfig,
    settings: &'a HarvestSettings,
    parser: &'a P,
}

impl<'a, P: Parser> PaginationWalker<'a, P> {
    pub fn new(selectors: &'a SelectorConfig, settings: &'a HarvestSettings, parser: &'a P) -> Self {
        Self {
            selectors,
            settings,
            parser,
        }
    }

    /// Walks from `entry_url` and closes `driver` on every exit path.
    pub async fn walk<D: PageDriver>(&self, mut driver: D, entry_url: &str) -> WalkReport {
        let mut harvest = Harvest::default();
        let end = self.drive(&mut driver, entry_url, &mut harvest).await;

        if let Err(e) = driver.close().await {
            warn!("Failed to close browser session: {}", e);
        }

        info!(
            "Walk finished after {} page(s): {} ({} records, {} skipped cards)",
            harvest.pages,
            end,
            harvest.records.len(),
            harvest.skipped
        );

        WalkReport {
            records: harvest.records,
            pages: harvest.pages,
            skipped: harvest.skipped,
            end,
        }
    }

    async fn drive<D: PageDriver>(&self, driver: &mut D, entry_url: &str, harvest: &mut Harvest) -> WalkEnd {
        let mut page: u32 = 1;
        let mut state = State::LoadingPage {
            navigate_to: Some(entry_url.to_string()),
        };

        loop {
            state = match state {
                State::LoadingPage { navigate_to } => {
                    match self.load_page(driver, page, navigate_to).await {
                        Ok(()) => State::ExtractingCards,
                        Err(e) => State::Failed(WalkEnd::LoadFailed {
                            page,
                            reason: e.to_string(),
                        }),
                    }
                }
                State::ExtractingCards => self.extract_cards(driver, page, harvest).await,
                State::Advancing => match self.advance(driver, page).await {
                    Ok(()) => {
                        page += 1;
                        State::LoadingPage { navigate_to: None }
                    }
                    Err(end) => State::Done(end),
                },
                State::Done(end) => return end,
                State::Failed(end) => {
                    warn!("Stopping: {}", end);
                    return end;
                }
            };
        }
    }

    /// Waits for cards, reloading up to `load_retries` times.
    async fn load_page<D: PageDriver>(
        &self,
        driver: &mut D,
        page: u32,
        mut navigate_to: Option<String>,
    ) -> Result<(), BrowserError> {
        let attempts = self.settings.load_retries + 1;
        let mut last_error = BrowserError::NoPage;

        for attempt in 1..=attempts {
            if let Some(url) = navigate_to.as_deref() {
                info!("Opening {} (page {}, attempt {}/{})", url, page, attempt, attempts);
                if let Err(e) = driver.navigate(url).await {
                    warn!("Navigation failed on page {}: {}", page, e);
                    last_error = e;
                    continue;
                }
            }

            match driver.wait_for(&self.selectors.card, self.settings.page_timeout).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!("Cards did not appear on page {} (attempt {}/{}): {}", page, attempt, attempts, e);
                    last_error = e;
                }
            }

            navigate_to = driver.current_url().or(navigate_to);
        }

        Err(last_error)
    }

    async fn extract_cards<D: PageDriver>(&self, driver: &mut D, page: u32, harvest: &mut Harvest) -> State {
        info!("Scraping page {}...", page);
        let cards = match driver.find_all(&self.selectors.card).await {
            Ok(cards) => cards,
            Err(e) => {
                warn!("Could not list cards on page {}: {}", page, e);
                Vec::new()
            }
        };

        if cards.is_empty() {
            warn!("No RFQ cards found on page {}", page);
            return State::Done(WalkEnd::NoCards);
        }

        let before = harvest.records.len();
        let mut skipped = 0;
        for (index, card) in cards.iter().enumerate() {
            match self.parser.parse_card(card) {
                Ok(record) => harvest.records.push(record),
                Err(failure) => {
                    skipped += 1;
                    warn!("Skipping card {} on page {}: {}", index + 1, page, failure);
                }
            }
        }

        harvest.pages = page;
        harvest.skipped += skipped;
        info!(
            "Page {}: {} cards, {} records, {} skipped",
            page,
            cards.len(),
            harvest.records.len() - before,
            skipped
        );
        State::Advancing
    }

    /// Clicks through to the next page, or says why the walk ends here.
    async fn advance<D: PageDriver>(&self, driver: &mut D, page: u32) -> Result<(), WalkEnd> {
        if page >= self.settings.max_pages {
            info!("Page limit of {} reached", self.settings.max_pages);
            return Err(WalkEnd::PageLimit);
        }

        let selector = &self.selectors.next_button;
        let control = match driver.find(selector).await {
            Ok(Some(control)) => control,
            Ok(None) => {
                info!("No next-page control on page {}", page);
                return Err(WalkEnd::NoNextControl);
            }
            Err(e) => {
                warn!("Pagination failed: {}", e);
                return Err(WalkEnd::PaginationFailed(e.to_string()));
            }
        };

        let disabled = control.attr("disabled").is_some()
            || control
                .attr("class")
                .is_some_and(|class| class.contains("disabled"));
        if disabled {
            info!("Reached last page.");
            return Err(WalkEnd::LastPage);
        }

        let pause = politeness_delay(self.settings.min_delay, self.settings.max_delay);
        debug!("Waiting {:.2}s before page {}", pause.as_secs_f64(), page + 1);
        sleep(pause).await;

        driver.click(selector).await.map_err(|e| {
            warn!("Pagination failed: {}", e);
            WalkEnd::PaginationFailed(e.to_string())
        })
    }
}
