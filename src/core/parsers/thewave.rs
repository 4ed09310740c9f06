use super::{markup, prefer_structured};
use crate::core::extractor::PriceExtractor;
use crate::domain::model::{Currency, PriceObservation};
use crate::domain::ports::SiteParser;
use crate::utils::error::Result;
use scraper::Html;

/// The Wave (Bristol) book-now page. Ticketing lives on another domain, so
/// only the session cards on the landing page are read: each card is an
/// `article`, `section` or `li` holding a single h2-h4 heading.
pub struct TheWaveParser;

impl SiteParser for TheWaveParser {
    fn name(&self) -> &'static str {
        "thewave"
    }

    fn parse(
        &self,
        markup: &str,
        currency: Currency,
        extractor: &PriceExtractor,
    ) -> Result<PriceObservation> {
        let document = Html::parse_document(markup);
        let cards = markup::selector(self.name(), "article, section, li")?;
        let headings = markup::selector(self.name(), "h2, h3, h4")?;
        let mut prices = PriceObservation::new();

        for card in document.select(&cards) {
            let mut card_headings = card.select(&headings);
            let (Some(heading), None) = (card_headings.next(), card_headings.next()) else {
                continue;
            };

            let label = markup::element_text(heading);
            let Some(tier) = extractor.categorize(&label) else {
                continue;
            };
            if let Some(price) = extractor.first_price_usd(&markup::element_text(card), currency) {
                tracing::debug!("thewave card '{}' -> {} ${:.2}", label, tier, price);
                prices.offer_min(tier, price);
            }
        }

        Ok(prefer_structured(self.name(), prices, &document, currency, extractor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PriceTier;

    #[test]
    fn test_session_cards() {
        let html = r#"<html><body><section class="sessions">
            <h2>Choose your session</h2>
            <article><h3>Cruiser Session</h3><p>From £55 per person</p></article>
            <article><h3>Beginner Session</h3><p>From £45 per person</p></article>
            <article><h3>Advanced Turns 2</h3><p>From £70</p></article>
            <article><h3>Surf Lesson</h3><p>From £65</p></article>
        </section></body></html>"#;

        let prices = TheWaveParser
            .parse(html, Currency::Gbp, &PriceExtractor::default())
            .unwrap();

        assert_eq!(prices.get(PriceTier::Beginner), Some(57.15));
        assert_eq!(prices.get(PriceTier::Intermediate), Some(69.85));
        assert_eq!(prices.get(PriceTier::Advanced), Some(88.9));
    }

    #[test]
    fn test_container_with_many_headings_is_not_a_card() {
        let html = r#"<html><body><section>
            <h3>Beginner Session</h3><h3>Expert Session</h3><p>£45 £90</p>
        </section></body></html>"#;

        let prices = TheWaveParser
            .parse(html, Currency::Gbp, &PriceExtractor::default())
            .unwrap();

        // 結構化解析找不到卡片，改用全文掃描
        assert_eq!(prices.get(PriceTier::Advanced), Some(57.15));
        assert_eq!(prices.get(PriceTier::Beginner), None);
    }
}
