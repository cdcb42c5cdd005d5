// Headless Chromium driver (feature `browser`)
use crate::browser::traits::{Element, PageDriver};
use crate::model::BrowserError;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn protocol(e: impl std::fmt::Display) -> BrowserError {
    BrowserError::Protocol(e.to_string())
}

pub struct ChromeDriver {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    current_url: Option<String>,
}

impl ChromeDriver {
    pub async fn launch(user_agent: &str) -> Result<Self, BrowserError> {
        info!("Launching headless browser");
        let config = BrowserConfig::builder()
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--no-sandbox")
            .arg(format!("--user-agent={}", user_agent))
            .build()
            .map_err(BrowserError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await.map_err(protocol)?;

        Ok(Self {
            browser,
            page,
            handler,
            current_url: None,
        })
    }

    async fn refresh_url(&mut self) {
        self.current_url = self.page.url().await.ok().flatten();
    }
}

#[async_trait::async_trait]
impl PageDriver for ChromeDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.page.goto(url.to_string()).await.map_err(|e| BrowserError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        self.refresh_url().await;
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        let page = &self.page;
        let appeared = async {
            loop {
                match page.find_elements(selector).await {
                    Ok(found) if !found.is_empty() => return,
                    Ok(_) => {}
                    Err(e) => debug!("Polling `{}` failed: {}", selector, e),
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };

        tokio::time::timeout(timeout, appeared)
            .await
            .map_err(|_| BrowserError::Timeout {
                selector: selector.to_string(),
                seconds: timeout.as_secs(),
            })
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<Element>, BrowserError> {
        // Snapshot the live DOM so card lookups keep their ancestors.
        let content = self.page.content().await.map_err(protocol)?;
        Element::select_in(&Arc::from(content), selector)
    }

    async fn find(&mut self, selector: &str) -> Result<Option<Element>, BrowserError> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        let control = self
            .page
            .find_element(selector)
            .await
            .map_err(|_| BrowserError::NotFound(selector.to_string()))?;
        control
            .click()
            .await
            .map_err(|_| BrowserError::NotClickable(selector.to_string()))?;
        // In-page pagination never navigates; the walker's card wait covers it.
        if let Err(e) = self.page.wait_for_navigation().await {
            debug!("No navigation after clicking `{}`: {}", selector, e);
        }
        self.refresh_url().await;
        Ok(())
    }

    fn current_url(&self) -> Option<String> {
        self.current_url.clone()
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        let closed = self.browser.close().await.map_err(protocol);
        if let Err(e) = self.browser.wait().await {
            debug!("Browser process did not exit cleanly: {}", e);
        }
        self.handler.abort();
        closed.map(|_| ())
    }
}
