use super::{markup, prefer_structured};
use crate::core::extractor::{parse_amount, PriceExtractor};
use crate::domain::model::{Currency, PriceObservation};
use crate::domain::ports::SiteParser;
use crate::utils::error::{EtlError, Result};
use regex::Regex;
use scraper::Html;

/// WordPress pricing page with `h2` session headings and "Starts at $129
/// for 1 hour" copy inside each expandable block.
pub struct WacoParser;

impl WacoParser {
    fn starts_at_pattern(&self, currency: Currency) -> Result<Regex> {
        let pattern = format!(
            r"(?i)starts\s+at\s*{}\s*(\d[\d,]*(?:\.\d+)?)",
            regex::escape(&currency.symbol().to_string())
        );
        Regex::new(&pattern).map_err(|e| EtlError::ParseError {
            strategy: self.name().to_string(),
            message: e.to_string(),
        })
    }
}

impl SiteParser for WacoParser {
    fn name(&self) -> &'static str {
        "waco"
    }

    fn parse(
        &self,
        markup: &str,
        currency: Currency,
        extractor: &PriceExtractor,
    ) -> Result<PriceObservation> {
        let document = Html::parse_document(markup);
        let headings = markup::selector(self.name(), "h2")?;
        let starts_at = self.starts_at_pattern(currency)?;
        let mut prices = PriceObservation::new();

        for heading in document.select(&headings) {
            let name = markup::element_text(heading);
            let Some(tier) = extractor.categorize(&name) else {
                continue;
            };
            let Some(block) = markup::parent_element(heading) else {
                continue;
            };

            let block_text = markup::element_text(block);
            let Some(amount) = starts_at.captures(&block_text).and_then(|c| c.get(1)) else {
                continue;
            };

            match parse_amount(amount.as_str()) {
                Ok(amount) => {
                    if let Some(price) = extractor.plausible_usd(amount, currency) {
                        tracing::debug!("waco block '{}' -> {} ${:.2}", name, tier, price);
                        prices.offer_min(tier, price);
                    }
                }
                Err(e) => tracing::debug!("waco block '{}': {}", name, e),
            }
        }

        Ok(prefer_structured(self.name(), prices, &document, currency, extractor))
    }
}
