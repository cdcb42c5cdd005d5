// Selector-driven RFQ card parsing
use crate::browser::Element;
use crate::config::SelectorConfig;
use crate::model::{ConfigError, ExtractionFailure, RfqRecord};
use crate::normalizer::{
    clean_text, normalize_url, parse_rfq_id, BuyerTags, COMPLETE_ORDER, EMAIL_CONFIRMED,
    EXPERIENCED_BUYER, INTERACTIVE_USER, TYPICAL_REPLIES,
};
use scraper::{ElementRef, Selector};

pub trait Parser {
    fn parse_card(&self, card: &Element) -> Result<RfqRecord, ExtractionFailure>;
}

struct FieldSelector {
    field: &'static str,
    raw: String,
    compiled: Selector,
    labels: Vec<String>,
}

impl FieldSelector {
    fn new(config: &SelectorConfig, field: &'static str, raw: &str) -> Result<Self, ConfigError> {
        let compiled = Selector::parse(raw).map_err(|_| ConfigError::InvalidSelector {
            field: field.to_string(),
            selector: raw.to_string(),
        })?;
        Ok(Self {
            field,
            raw: raw.to_string(),
            compiled,
            labels: config.labels_for(field).to_vec(),
        })
    }

    /// First match among the card's descendants.
    fn first<'a>(&self, card: ElementRef<'a>) -> Option<ElementRef<'a>> {
        card.select(&self.compiled).next()
    }

    fn require<'a>(&self, card: ElementRef<'a>) -> Result<ElementRef<'a>, ExtractionFailure> {
        self.first(card).ok_or_else(|| ExtractionFailure::MissingField {
            field: self.field,
            selector: self.raw.clone(),
        })
    }

    fn text(&self, element: ElementRef<'_>) -> String {
        let raw: String = element.text().collect();
        clean_text(&raw, &self.labels)
    }

    fn required_text(&self, card: ElementRef<'_>) -> Result<String, ExtractionFailure> {
        Ok(self.text(self.require(card)?))
    }
}

/// Turns listing cards into records using a validated [`SelectorConfig`].
pub struct RfqParser {
    title: FieldSelector,
    inquiry_time: FieldSelector,
    quotes_left: FieldSelector,
    quantity_num: FieldSelector,
    quantity_unit: FieldSelector,
    country: FieldSelector,
    buyer_name: FieldSelector,
    buyer_image: FieldSelector,
    buyer_tags: FieldSelector,
    capture_date: String,
}

impl RfqParser {
    /// Compiles the field selectors once; `capture_date` is stamped on every record.
    pub fn new(config: &SelectorConfig, capture_date: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            title: FieldSelector::new(config, "title", &config.title)?,
            inquiry_time: FieldSelector::new(config, "inquiry_time", &config.inquiry_time)?,
            quotes_left: FieldSelector::new(config, "quotes_left", &config.quotes_left)?,
            quantity_num: FieldSelector::new(config, "quantity_num", &config.quantity_num)?,
            quantity_unit: FieldSelector::new(config, "quantity_unit", &config.quantity_unit)?,
            country: FieldSelector::new(config, "country", &config.country)?,
            buyer_name: FieldSelector::new(config, "buyer_name", &config.buyer_name)?,
            buyer_image: FieldSelector::new(config, "buyer_image", &config.buyer_image)?,
            buyer_tags: FieldSelector::new(config, "buyer_tags", &config.buyer_tags)?,
            capture_date: capture_date.into(),
        })
    }

    fn extract(&self, card: ElementRef<'_>) -> Result<RfqRecord, ExtractionFailure> {
        let title_el = self.title.require(card)?;
        let title = self.title.text(title_el);
        let href = title_el.value().attr("href").unwrap_or_default().trim();

        let inquiry_time = self.inquiry_time.required_text(card)?;
        let quotes_left = self.quotes_left.required_text(card)?;
        let qty_num = self.quantity_num.required_text(card)?;
        let qty_unit = self.quantity_unit.required_text(card)?;
        let country = self.country.required_text(card)?;
        let buyer_name = self.buyer_name.required_text(card)?;

        let buyer_image = self
            .buyer_image
            .first(card)
            .and_then(|img| img.value().attr("src"))
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        let tags = BuyerTags::from_texts(
            card.select(&self.buyer_tags.compiled)
                .map(|tag| tag.text().collect::<String>()),
        );

        Ok(RfqRecord {
            rfq_id: parse_rfq_id(href),
            title,
            buyer_name,
            buyer_image,
            inquiry_time,
            quotes_left,
            country,
            quantity_required: format!("{} {}", qty_num, qty_unit),
            email_confirmed: tags.flag(EMAIL_CONFIRMED),
            experienced_buyer: tags.flag(EXPERIENCED_BUYER),
            complete_order: tags.flag(COMPLETE_ORDER),
            typical_replies: tags.flag(TYPICAL_REPLIES),
            interactive_user: tags.flag(INTERACTIVE_USER),
            inquiry_url: normalize_url(href),
            inquiry_date: self.capture_date.clone(),
            scraping_date: self.capture_date.clone(),
        })
    }
}

impl Parser for RfqParser {
    fn parse_card(&self, card: &Element) -> Result<RfqRecord, ExtractionFailure> {
        card.with_element(|root| self.extract(root))
            .unwrap_or(Err(ExtractionFailure::Detached))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake;
    use std::sync::Arc;

    const GOLDEN: &str = r#"
<div class="rfq-card">
  <h3><a class="subject" href="//sourcing.example.com/rfq/item.htm?p=12345&amp;from=list">
    Stainless   steel
    pipes </a></h3>
  <div class="meta">
    <span class="posted"> 2 hours ago </span>
    <span class="quotes">8</span>
  </div>
  <div class="qty"><span class="num"> 500 </span><span class="unit">Meters</span></div>
  <span class="country">Vietnam</span>
  <div class="buyer">
    <img src="https://img.example.com/buyer/77.jpg">
    <span class="name">Nguyen Trading</span>
  </div>
  <div class="tags">
    <span>Email Confirmed</span>
    <span>INTERACTIVE USER</span>
    <span>Top buyer</span>
  </div>
</div>"#;

    fn parser() -> RfqParser {
        RfqParser::new(&fake::selectors(), "05-06-2025").unwrap()
    }

    #[test]
    fn golden_card_matches_every_field() {
        let record = parser().parse_card(&Element::new(GOLDEN)).unwrap();

        let expected = RfqRecord {
            rfq_id: "12345".into(),
            title: "Stainless steel pipes".into(),
            buyer_name: "Nguyen Trading".into(),
            buyer_image: "https://img.example.com/buyer/77.jpg".into(),
            inquiry_time: "2 hours ago".into(),
            quotes_left: "8".into(),
            country: "Vietnam".into(),
            quantity_required: "500 Meters".into(),
            email_confirmed: "Yes".into(),
            experienced_buyer: "No".into(),
            complete_order: "No".into(),
            typical_replies: "No".into(),
            interactive_user: "Yes".into(),
            inquiry_url: "https://sourcing.example.com/rfq/item.htm?p=12345&from=list".into(),
            inquiry_date: "05-06-2025".into(),
            scraping_date: "05-06-2025".into(),
        };
        assert_eq!(record, expected);
    }

    #[test]
    fn missing_mandatory_field_fails_the_card() {
        let html = GOLDEN.replace(r#"<span class="country">Vietnam</span>"#, "");
        let err = parser().parse_card(&Element::new(html)).unwrap_err();
        assert_eq!(
            err,
            ExtractionFailure::MissingField {
                field: "country",
                selector: ".country".into()
            }
        );
    }

    #[test]
    fn missing_image_and_tags_do_not_fail() {
        let html = GOLDEN
            .replace(r#"<img src="https://img.example.com/buyer/77.jpg">"#, "")
            .replace(r#"<div class="tags">"#, r#"<div class="no-tags">"#);
        let record = parser().parse_card(&Element::new(html)).unwrap();
        assert_eq!(record.buyer_image, "");
        assert_eq!(record.email_confirmed, "No");
        assert_eq!(record.interactive_user, "No");
    }

    #[test]
    fn title_without_href_degrades_to_empty_url_and_id() {
        let html = GOLDEN.replace(
            r#"href="//sourcing.example.com/rfq/item.htm?p=12345&amp;from=list""#,
            "",
        );
        let record = parser().parse_card(&Element::new(html)).unwrap();
        assert_eq!(record.rfq_id, "");
        assert_eq!(record.inquiry_url, "");
        assert_eq!(record.title, "Stainless steel pipes");
    }

    #[test]
    fn marketplace_default_strips_labels() {
        let html = r#"
<div class="next-row next-row-no-padding">
  <a class="brh-rfq-item__subject-link" href="https://sourcing.example.com/rfq/detail.htm?p=991">Cotton bags</a>
  <div class="brh-rfq-item__publishtime">Date Posted: 3 days ago</div>
  <div class="brh-rfq-item__quote-left">Quotes Left 10</div>
  <div><span class="brh-rfq-item__quantity-num">2000</span><span>Pieces</span></div>
  <div class="brh-rfq-item__country">Posted in: France</div>
  <div class="brh-rfq-item__other-info"><div class="img-con"><img src="//img.example.com/a.png"></div><span class="text">Marie</span></div>
  <div class="brh-rfq-item__buyer-tag"><div class="next-tag"><span class="next-tag-body">Experienced buyer</span></div></div>
</div>"#;
        let parser = RfqParser::new(&SelectorConfig::marketplace_default(), "01-01-2025").unwrap();
        let record = parser.parse_card(&Element::new(html)).unwrap();

        assert_eq!(record.rfq_id, "991");
        assert_eq!(record.inquiry_time, "3 days ago");
        assert_eq!(record.quotes_left, "10");
        assert_eq!(record.country, "France");
        assert_eq!(record.quantity_required, "2000 Pieces");
        assert_eq!(record.buyer_name, "Marie");
        assert_eq!(record.buyer_image, "//img.example.com/a.png");
        assert_eq!(record.experienced_buyer, "Yes");
        assert_eq!(record.inquiry_url, "https://sourcing.example.com/rfq/detail.htm?p=991");
    }

    #[test]
    fn field_selectors_may_name_the_card_ancestors() {
        let page: Arc<str> = Arc::from(format!(
            r#"<html><body><aside>{}</aside><ul class="results"><li>{}</li></ul></body></html>"#,
            fake::card("1", "Sidebar ad"),
            fake::card("2", "Copper wire"),
        ));
        let config = SelectorConfig {
            title: "ul.results a.subject".into(),
            ..fake::selectors()
        };
        let parser = RfqParser::new(&config, "01-01-2025").unwrap();
        let cards = Element::select_in(&page, "div.rfq-card").unwrap();
        assert_eq!(cards.len(), 2);

        let err = parser.parse_card(&cards[0]).unwrap_err();
        assert!(matches!(err, ExtractionFailure::MissingField { field: "title", .. }));

        let record = parser.parse_card(&cards[1]).unwrap();
        assert_eq!(record.rfq_id, "2");
        assert_eq!(record.title, "Copper wire");
        assert_eq!(record.country, "Germany");
    }

    #[test]
    fn labels_split_across_lines_are_still_stripped() {
        let html = r#"
<div class="next-row">
  <a class="brh-rfq-item__subject-link" href="//sourcing.example.com/rfq/detail.htm?p=5">Valves</a>
  <div class="brh-rfq-item__publishtime">Date
      Posted: 3 days ago</div>
  <div class="brh-rfq-item__quote-left">Quotes
    Left 4</div>
  <div><span class="brh-rfq-item__quantity-num">10</span><span>Sets</span></div>
  <div class="brh-rfq-item__country">Posted   in: Chile</div>
  <div class="brh-rfq-item__other-info"><span class="text">Ana</span></div>
</div>"#;
        let parser = RfqParser::new(&SelectorConfig::marketplace_default(), "01-01-2025").unwrap();
        let record = parser.parse_card(&Element::new(html)).unwrap();
        assert_eq!(record.inquiry_time, "3 days ago");
        assert_eq!(record.quotes_left, "4");
        assert_eq!(record.country, "Chile");
    }
}
