use crate::browser::page::StaticPage;
use crate::browser::traits::{Element, PageDriver};
use crate::model::BrowserError;

use reqwest::Client;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::debug;
use url::Url;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Plain HTTP driver for server-rendered listing pages.
///
/// Each navigation fetches a fresh snapshot. Waiting for a selector re-fetches
/// the current URL until the selector appears or the deadline passes, and a
/// click follows the control's `href`.
pub struct HttpDriver {
    client: Client,
    page: Option<StaticPage>,
}

impl HttpDriver {
    pub fn new(user_agent: &str, request_timeout: Duration) -> Result<Self, BrowserError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(request_timeout)
            .build()
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        Ok(Self { client, page: None })
    }

    async fn fetch(&self, url: Url) -> Result<StaticPage, BrowserError> {
        let failed = |reason: String| BrowserError::Navigation {
            url: url.to_string(),
            reason,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| failed(e.to_string()))?;
        debug!("Fetched {} ({} bytes)", final_url, body.len());
        Ok(StaticPage::new(final_url, body))
    }

    fn page(&self) -> Result<&StaticPage, BrowserError> {
        self.page.as_ref().ok_or(BrowserError::NoPage)
    }
}

#[async_trait::async_trait]
impl PageDriver for HttpDriver {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let target = Url::parse(url).map_err(|e| BrowserError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        self.page = Some(self.fetch(target).await?);
        Ok(())
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        let deadline = Instant::now() + timeout;
        loop {
            let page = self.page()?;
            if page.contains(selector)? {
                return Ok(());
            }
            if Instant::now() + POLL_INTERVAL > deadline {
                return Err(BrowserError::Timeout {
                    selector: selector.to_string(),
                    seconds: timeout.as_secs(),
                });
            }
            let url = page.url().clone();
            sleep(POLL_INTERVAL).await;
            match self.fetch(url).await {
                Ok(fresh) => self.page = Some(fresh),
                Err(e) => debug!("Re-fetch while waiting for `{}` failed: {}", selector, e),
            }
        }
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<Element>, BrowserError> {
        self.page()?.select_all(selector)
    }

    async fn find(&mut self, selector: &str) -> Result<Option<Element>, BrowserError> {
        self.page()?.select_first(selector)
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        let target = self.page()?.link_target(selector)?;
        debug!("Following `{}` to {}", selector, target);
        self.page = Some(self.fetch(target).await?);
        Ok(())
    }

    fn current_url(&self) -> Option<String> {
        self.page.as_ref().map(|p| p.url().to_string())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.page = None;
        Ok(())
    }
}
