use crate::model::BrowserError;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use std::time::Duration;

/// Browser capability the pagination walker drives, one page at a time.
#[async_trait::async_trait]
pub trait PageDriver: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Resolves once `selector` matches at least one element, or fails with
    /// [`BrowserError::Timeout`].
    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError>;

    async fn find_all(&mut self, selector: &str) -> Result<Vec<Element>, BrowserError>;

    async fn find(&mut self, selector: &str) -> Result<Option<Element>, BrowserError>;

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError>;

    fn current_url(&self) -> Option<String>;

    async fn close(&mut self) -> Result<(), BrowserError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Locator {
    selector: String,
    index: usize,
}

/// One element of a rendered page.
///
/// Holds the page source it was selected from (shared by every element of the
/// same snapshot) and finds itself again as the `index`-th match of its
/// selector, so sub-element lookups still see the element's ancestors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    source: Arc<str>,
    locator: Option<Locator>,
}

impl Element {
    /// A standalone element given by its outer HTML alone.
    #[cfg(test)]
    pub fn new(outer_html: impl Into<String>) -> Self {
        Self {
            source: Arc::from(outer_html.into()),
            locator: None,
        }
    }

    /// Every match of `selector` in `source`, in document order.
    pub fn select_in(source: &Arc<str>, selector: &str) -> Result<Vec<Element>, BrowserError> {
        let compiled = compile(selector)?;
        let count = Html::parse_document(source).select(&compiled).count();
        let elements = (0..count)
            .map(|index| Element {
                source: Arc::clone(source),
                locator: Some(Locator {
                    selector: selector.to_string(),
                    index,
                }),
            })
            .collect();
        Ok(elements)
    }

    /// Parses the snapshot and hands `f` the element in place, or returns
    /// `None` when it can no longer be found.
    pub fn with_element<R>(&self, f: impl FnOnce(ElementRef<'_>) -> R) -> Option<R> {
        match &self.locator {
            None => {
                let fragment = Html::parse_fragment(&self.source);
                let root = fragment.root_element().children().find_map(ElementRef::wrap)?;
                Some(f(root))
            }
            Some(locator) => {
                let selector = compile(&locator.selector).ok()?;
                let document = Html::parse_document(&self.source);
                let element = document.select(&selector).nth(locator.index)?;
                Some(f(element))
            }
        }
    }

    pub fn attr(&self, name: &str) -> Option<String> {
        self.with_element(|el| el.value().attr(name).map(str::to_string))
            .flatten()
    }
}

pub(crate) fn compile(selector: &str) -> Result<Selector, BrowserError> {
    Selector::parse(selector).map_err(|_| BrowserError::InvalidSelector(selector.to_string()))
}
