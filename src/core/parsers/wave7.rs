use super::{markup, prefer_structured};
use crate::core::extractor::PriceExtractor;
use crate::domain::model::{Currency, PriceObservation};
use crate::domain::ports::SiteParser;
use crate::utils::error::Result;
use scraper::Html;

/// Wave7 booking platform (Atlantic Park, Lost Shore).
///
/// Catalog cards carry the session name in an `h3`; the price ("$ 103.00",
/// "£ 60.00") sits in bold text somewhere in the card, two levels up from
/// the heading.
pub struct Wave7Parser;

impl SiteParser for Wave7Parser {
    fn name(&self) -> &'static str {
        "wave7"
    }

    fn parse(
        &self,
        markup: &str,
        currency: Currency,
        extractor: &PriceExtractor,
    ) -> Result<PriceObservation> {
        let document = Html::parse_document(markup);
        let headings = markup::selector(self.name(), "h3")?;
        let mut prices = PriceObservation::new();

        for heading in document.select(&headings) {
            let name = markup::element_text(heading);
            let Some(tier) = extractor.categorize(&name) else {
                continue;
            };
            let Some(parent) = markup::parent_element(heading) else {
                continue;
            };
            let container = markup::parent_element(parent).unwrap_or(parent);

            let card_text = markup::element_text(container);
            if let Some(price) = extractor.first_price_usd(&card_text, currency) {
                tracing::debug!("wave7 card '{}' -> {} ${:.2}", name, tier, price);
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

    fn card(title: &str, price: &str) -> String {
        format!(
            r#"<div class="catalog-item"><div class="title"><h3>{}</h3></div>
               <p>Starting from <strong>{}</strong></p></div>"#,
            title, price
        )
    }

    #[test]
    fn test_cards_keep_lowest_price_per_tier() {
        let html = format!(
            "<html><body>{}{}{}{}{}</body></html>",
            card("Beginner Waves", "$ 103.00"),
            card("Beginner Waves Off-Peak", "$ 95.50"),
            card("Intermediate Waves", "$ 118.00"),
            card("Advanced Waves", "$ 133.00"),
            card("Gift Card", "$ 50.00"),
        );

        let prices = Wave7Parser
            .parse(&html, Currency::Usd, &PriceExtractor::default())
            .unwrap();

        assert_eq!(prices.len(), 3);
        assert_eq!(prices.get(PriceTier::Beginner), Some(95.5));
        assert_eq!(prices.get(PriceTier::Intermediate), Some(118.0));
        assert_eq!(prices.get(PriceTier::Advanced), Some(133.0));
    }

    #[test]
    fn test_gbp_cards_are_converted() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            card("Progressive Session", "£ 60.00"),
            card("Expert Session", "£ 80.00"),
        );

        let prices = Wave7Parser
            .parse(&html, Currency::Gbp, &PriceExtractor::default())
            .unwrap();

        assert_eq!(prices.get(PriceTier::Intermediate), Some(76.2));
        assert_eq!(prices.get(PriceTier::Advanced), Some(101.6));
    }

    #[test]
    fn test_falls_back_to_full_text_when_cards_missing() {
        // 改版後沒有 h3，只剩純文字列表
        let html = r#"<html><body><ul>
            <li>Beginner session - $99 per person, one hour in the lagoon</li>
            <li>Intermediate session - $115 per person, one hour in the lagoon</li>
        </ul></body></html>"#;

        let prices = Wave7Parser
            .parse(html, Currency::Usd, &PriceExtractor::default())
            .unwrap();

        assert_eq!(prices.get(PriceTier::Beginner), Some(99.0));
        assert_eq!(prices.get(PriceTier::Intermediate), Some(115.0));
    }
}
