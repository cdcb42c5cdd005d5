// Static DOM snapshot of one loaded page
use crate::browser::traits::{compile, Element};
use crate::model::BrowserError;
use scraper::Html;
use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone)]
pub struct StaticPage {
    url: Url,
    body: Arc<str>,
}

impl StaticPage {
    pub fn new(url: Url, body: impl Into<String>) -> Self {
        Self {
            url,
            body: Arc::from(body.into()),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn select_all(&self, selector: &str) -> Result<Vec<Element>, BrowserError> {
        Element::select_in(&self.body, selector)
    }

    pub fn select_first(&self, selector: &str) -> Result<Option<Element>, BrowserError> {
        Ok(self.select_all(selector)?.into_iter().next())
    }

    pub fn contains(&self, selector: &str) -> Result<bool, BrowserError> {
        let compiled = compile(selector)?;
        let found = Html::parse_document(&self.body).select(&compiled).next().is_some();
        Ok(found)
    }

    /// Where following the control's `href` leads, resolved against this page.
    pub fn link_target(&self, selector: &str) -> Result<Url, BrowserError> {
        let control = self
            .select_first(selector)?
            .ok_or_else(|| BrowserError::NotFound(selector.to_string()))?;
        let href = control
            .attr("href")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty() && h != "#" && !h.starts_with("javascript:"))
            .ok_or_else(|| BrowserError::NotClickable(selector.to_string()))?;
        self.url
            .join(&href)
            .map_err(|_| BrowserError::NotClickable(selector.to_string()))
    }
}
