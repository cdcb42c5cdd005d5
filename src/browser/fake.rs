// In-memory site used by the walker and harvest tests
use crate::browser::page::StaticPage;
use crate::browser::traits::{Element, PageDriver};
use crate::config::SelectorConfig;
use crate::model::BrowserError;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

pub const BASE: &str = "https://rfq.test/list";

#[derive(Debug, Default)]
pub struct SiteLog {
    pub navigations: Vec<String>,
    pub clicks: usize,
    pub closed: bool,
}

/// Serves fixture pages keyed by absolute URL. Waiting never sleeps: a
/// missing selector times out immediately.
pub struct FakeSite {
    pages: HashMap<String, String>,
    current: Option<StaticPage>,
    pub log: Arc<Mutex<SiteLog>>,
}

impl FakeSite {
    pub fn new<I>(pages: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self {
            pages: pages.into_iter().collect(),
            current: None,
            log: Arc::new(Mutex::new(SiteLog::default())),
        }
    }

    fn load(&mut self, url: &Url) -> Result<(), BrowserError> {
        let body = self.pages.get(url.as_str()).ok_or_else(|| BrowserError::Navigation {
            url: url.to_string(),
            reason: "HTTP 404 Not Found".to_string(),
        })?;
        self.current = Some(StaticPage::new(url.clone(), body.clone()));
        Ok(())
    }

    fn page(&self) -> Result<&StaticPage, BrowserError> {
        self.current.as_ref().ok_or(BrowserError::NoPage)
    }
}

#[async_trait::async_trait]
impl PageDriver for FakeSite {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.log.lock().unwrap().navigations.push(url.to_string());
        let parsed = Url::parse(url).map_err(|e| BrowserError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        self.load(&parsed)
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<(), BrowserError> {
        if self.page()?.contains(selector)? {
            Ok(())
        } else {
            Err(BrowserError::Timeout {
                selector: selector.to_string(),
                seconds: timeout.as_secs(),
            })
        }
    }

    async fn find_all(&mut self, selector: &str) -> Result<Vec<Element>, BrowserError> {
        self.page()?.select_all(selector)
    }

    async fn find(&mut self, selector: &str) -> Result<Option<Element>, BrowserError> {
        self.page()?.select_first(selector)
    }

    async fn click(&mut self, selector: &str) -> Result<(), BrowserError> {
        self.log.lock().unwrap().clicks += 1;
        let target = self.page()?.link_target(selector)?;
        self.load(&target)
    }

    fn current_url(&self) -> Option<String> {
        self.current.as_ref().map(|p| p.url().to_string())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        self.log.lock().unwrap().closed = true;
        self.current = None;
        Ok(())
    }
}

pub fn page_url(n: u32) -> String {
    format!("{BASE}?page={n}")
}

pub fn selectors() -> SelectorConfig {
    SelectorConfig::from_json(
        r#"{
            "card": "div.rfq-card",
            "next_button": "a.pager-next",
            "title": "a.subject",
            "inquiry_time": ".posted",
            "quotes_left": ".quotes",
            "quantity_num": ".qty .num",
            "quantity_unit": ".qty .unit",
            "country": ".country",
            "buyer_name": ".buyer .name",
            "buyer_image": ".buyer img",
            "buyer_tags": ".tags span"
        }"#,
    )
    .unwrap()
}

/// A complete card for RFQ `id`.
pub fn card(id: &str, title: &str) -> String {
    format!(
        r#"<div class="rfq-card">
  <a class="subject" href="//rfq.test/item.htm?p={id}&src=list">{title}</a>
  <span class="posted">1 hour ago</span>
  <span class="quotes">5</span>
  <div class="qty"><span class="num">100</span> <span class="unit">Pieces</span></div>
  <span class="country">Germany</span>
  <div class="buyer"><img src="https://img.rfq.test/{id}.png"><span class="name">Buyer {id}</span></div>
  <div class="tags"><span>Email Confirmed</span></div>
</div>"#
    )
}

/// A card whose country element is missing.
pub fn card_without_country(id: &str, title: &str) -> String {
    card(id, title).replace(r#"<span class="country">Germany</span>"#, "")
}

/// One results page; `next` is the href of the pager control, if any.
pub fn listing(cards: &[String], next: Option<&str>, disabled: bool) -> String {
    let pager = match next {
        Some(href) if disabled => {
            format!(r#"<a class="pager-next disabled" href="{href}">Next</a>"#)
        }
        Some(href) => format!(r#"<a class="pager-next" href="{href}">Next</a>"#),
        None => String::new(),
    };
    format!(
        "<html><body><main>{}</main><nav>{}</nav></body></html>",
        cards.join("\n"),
        pager
    )
}
