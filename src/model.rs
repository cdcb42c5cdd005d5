// Core structs: RfqRecord, error taxonomy
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// One harvested RFQ listing. Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RfqRecord {
    #[serde(rename = "RFQ ID")]
    pub rfq_id: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Buyer Name")]
    pub buyer_name: String,
    #[serde(rename = "Buyer Image")]
    pub buyer_image: String,
    #[serde(rename = "Inquiry Time")]
    pub inquiry_time: String,
    #[serde(rename = "Quotes Left")]
    pub quotes_left: String,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Quantity Required")]
    pub quantity_required: String,
    #[serde(rename = "Email Confirmed")]
    pub email_confirmed: String,
    #[serde(rename = "Experienced Buyer")]
    pub experienced_buyer: String,
    #[serde(rename = "Complete Order via RFQ")]
    pub complete_order: String,
    #[serde(rename = "Typical Replies")]
    pub typical_replies: String,
    #[serde(rename = "Interactive User")]
    pub interactive_user: String,
    #[serde(rename = "Inquiry URL")]
    pub inquiry_url: String,
    #[serde(rename = "Inquiry Date")]
    pub inquiry_date: String,
    #[serde(rename = "Scraping Date")]
    pub scraping_date: String,
}

impl RfqRecord {
    /// Header row, verbatim and in the same order as the serialized fields.
    pub const COLUMNS: [&'static str; 16] = [
        "RFQ ID",
        "Title",
        "Buyer Name",
        "Buyer Image",
        "Inquiry Time",
        "Quotes Left",
        "Country",
        "Quantity Required",
        "Email Confirmed",
        "Experienced Buyer",
        "Complete Order via RFQ",
        "Typical Replies",
        "Interactive User",
        "Inquiry URL",
        "Inquiry Date",
        "Scraping Date",
    ];

    /// Natural key used for deduplication.
    pub fn natural_key(&self) -> (&str, &str) {
        (&self.rfq_id, &self.title)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read selector config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed selector config: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("selector for `{field}` is empty")]
    EmptySelector { field: &'static str },
    #[error("selector for `{field}` does not parse: {selector}")]
    InvalidSelector { field: String, selector: String },
    #[error("strip_labels refers to unknown field `{0}`")]
    UnknownLabelField(String),
    #[error("invalid settings: {0}")]
    Settings(String),
}

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },
    #[error("timed out after {seconds}s waiting for `{selector}`")]
    Timeout { selector: String, seconds: u64 },
    #[error("element not found: `{0}`")]
    NotFound(String),
    #[error("element `{0}` is not clickable")]
    NotClickable(String),
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
    #[error("no page loaded")]
    NoPage,
    #[error("browser launch failed: {0}")]
    Launch(String),
    #[cfg(feature = "browser")]
    #[error("browser protocol error: {0}")]
    Protocol(String),
}

/// Why a single card could not be turned into a record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractionFailure {
    #[error("missing {field} (selector `{selector}`)")]
    MissingField { field: &'static str, selector: String },
    #[error("card is no longer present in its page snapshot")]
    Detached,
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("cannot write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum PermissionError {
    #[error("invalid target url {0}")]
    InvalidUrl(String),
    #[error("robots.txt at {robots_url} is unavailable: {reason}")]
    Unavailable { robots_url: String, reason: String },
}

/// Errors that abort a whole run. Everything else degrades to a partial result.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("robots.txt disallows scraping {0}")]
    PermissionDenied(String),
    #[error("cannot start browser session: {0}")]
    Launch(#[from] BrowserError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}
