use crate::model::ConfigError;
use scraper::Selector;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_OUTPUT: &str = "rfq_output.csv";
pub const USER_AGENT: &str = "RFQHarvester/0.1 (Educational use only)";

/// Where each logical field lives in a listing page. Every key is required.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    pub card: String,
    pub next_button: String,
    pub title: String,
    pub inquiry_time: String,
    pub quotes_left: String,
    pub quantity_num: String,
    pub quantity_unit: String,
    pub country: String,
    pub buyer_name: String,
    pub buyer_image: String,
    pub buyer_tags: String,
    /// Literal labels removed from a field's text before trimming, keyed by field name.
    #[serde(default)]
    pub strip_labels: HashMap<String, Vec<String>>,
}

impl SelectorConfig {
    /// Reproduces the marketplace markup the harvester was first written against.
    pub fn marketplace_default() -> Self {
        let strip_labels = HashMap::from([
            (
                "inquiry_time".to_string(),
                vec!["Date Posted".to_string(), ":".to_string()],
            ),
            ("quotes_left".to_string(), vec!["Quotes Left".to_string()]),
            ("country".to_string(), vec!["Posted in:".to_string()]),
        ]);

        Self {
            card: ".next-row-no-padding".into(),
            next_button: ".next".into(),
            title: ".brh-rfq-item__subject-link".into(),
            inquiry_time: ".brh-rfq-item__publishtime".into(),
            quotes_left: ".brh-rfq-item__quote-left".into(),
            quantity_num: ".brh-rfq-item__quantity-num".into(),
            quantity_unit: ".brh-rfq-item__quantity-num ~ span".into(),
            country: ".brh-rfq-item__country".into(),
            buyer_name: ".brh-rfq-item__other-info .text".into(),
            buyer_image: ".img-con img".into(),
            buyer_tags: ".brh-rfq-item__buyer-tag .next-tag-body".into(),
            strip_labels,
        }
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: SelectorConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// All selectors paired with their field names, site-shape keys first.
    pub fn fields(&self) -> [(&'static str, &str); 11] {
        [
            ("card", self.card.as_str()),
            ("next_button", self.next_button.as_str()),
            ("title", self.title.as_str()),
            ("inquiry_time", self.inquiry_time.as_str()),
            ("quotes_left", self.quotes_left.as_str()),
            ("quantity_num", self.quantity_num.as_str()),
            ("quantity_unit", self.quantity_unit.as_str()),
            ("country", self.country.as_str()),
            ("buyer_name", self.buyer_name.as_str()),
            ("buyer_image", self.buyer_image.as_str()),
            ("buyer_tags", self.buyer_tags.as_str()),
        ]
    }

    pub fn labels_for(&self, field: &str) -> &[String] {
        self.strip_labels
            .get(field)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Rejects empty or unparsable selectors and label entries for unknown fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = self.fields();
        for (field, selector) in fields {
            if selector.trim().is_empty() {
                return Err(ConfigError::EmptySelector { field });
            }
            if Selector::parse(selector).is_err() {
                return Err(ConfigError::InvalidSelector {
                    field: field.to_string(),
                    selector: selector.to_string(),
                });
            }
        }
        for field in self.strip_labels.keys() {
            if !fields.iter().any(|(name, _)| *name == field.as_str()) {
                return Err(ConfigError::UnknownLabelField(field.clone()));
            }
        }
        Ok(())
    }
}

pub fn load_selector_config(path: &Path) -> Result<SelectorConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    SelectorConfig::from_json(&content)
}

/// Knobs for one harvesting run.
#[derive(Debug, Clone)]
pub struct HarvestSettings {
    pub max_pages: u32,
    pub page_timeout: Duration,
    pub load_retries: u32,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub output: PathBuf,
    pub user_agent: String,
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            max_pages: 10,
            page_timeout: Duration::from_secs(10),
            load_retries: 1,
            min_delay: Duration::from_millis(1500),
            max_delay: Duration::from_millis(3500),
            output: PathBuf::from(DEFAULT_OUTPUT),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl HarvestSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pages == 0 {
            return Err(ConfigError::Settings("max pages must be at least 1".into()));
        }
        if self.min_delay > self.max_delay {
            return Err(ConfigError::Settings(format!(
                "min delay {:?} exceeds max delay {:?}",
                self.min_delay, self.max_delay
            )));
        }
        if self.page_timeout.is_zero() {
            return Err(ConfigError::Settings("page timeout must be positive".into()));
        }
        Ok(())
    }
}
