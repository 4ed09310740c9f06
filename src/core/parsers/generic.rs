use super::markup;
use crate::core::extractor::PriceExtractor;
use crate::domain::model::{Currency, PriceObservation};
use crate::domain::ports::SiteParser;
use crate::utils::error::Result;
use scraper::Html;

/// Full-page text scan. Default for venues without a dedicated layout.
pub struct GenericParser;

impl SiteParser for GenericParser {
    fn name(&self) -> &'static str {
        super::GENERIC_STRATEGY
    }

    fn parse(
        &self,
        markup: &str,
        currency: Currency,
        extractor: &PriceExtractor,
    ) -> Result<PriceObservation> {
        let document = Html::parse_document(markup);
        Ok(extractor.extract(&markup::page_text(&document), currency))
    }
}
