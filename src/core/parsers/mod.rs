//! Per-layout parsing strategies and the registry that picks one by name.
//!
//! Layout-aware strategies read the venue's known markup first and fall back
//! to a full-page text scan when that pass finds fewer than
//! [`MIN_STRUCTURED_TIERS`] tiers.

pub mod generic;
pub mod markup;
pub mod thewave;
pub mod waco;
pub mod wave7;

use crate::core::extractor::PriceExtractor;
use crate::domain::model::{Currency, PriceObservation};
use crate::domain::ports::SiteParser;
use scraper::Html;

pub use generic::GenericParser;
pub use thewave::TheWaveParser;
pub use waco::WacoParser;
pub use wave7::Wave7Parser;

pub const GENERIC_STRATEGY: &str = "generic_price_scan";

pub const STRATEGIES: [&str; 4] = ["wave7", "waco", "thewave", GENERIC_STRATEGY];

pub const MIN_STRUCTURED_TIERS: usize = 2;

/// 依策略名稱取得解析器，未知名稱一律回退到通用掃描
pub fn dispatch(strategy: &str) -> &'static dyn SiteParser {
    match strategy.trim().to_ascii_lowercase().as_str() {
        "wave7" => &Wave7Parser,
        "waco" => &WacoParser,
        "thewave" => &TheWaveParser,
        "generic_price_scan" | "generic" => &GenericParser,
        other => {
            tracing::warn!(
                "⚠️ Unknown parser strategy '{}', using {}",
                other,
                GENERIC_STRATEGY
            );
            &GenericParser
        }
    }
}

pub fn is_known_strategy(strategy: &str) -> bool {
    let normalized = strategy.trim().to_ascii_lowercase();
    normalized == "generic" || STRATEGIES.contains(&normalized.as_str())
}

/// Keeps the layout-aware result when it covers enough tiers; otherwise the
/// full-page text scan replaces it, even when that scan finds fewer tiers.
pub(crate) fn prefer_structured(
    strategy: &str,
    structured: PriceObservation,
    document: &Html,
    currency: Currency,
    extractor: &PriceExtractor,
) -> PriceObservation {
    if structured.len() >= MIN_STRUCTURED_TIERS {
        return structured;
    }

    tracing::debug!(
        "{}: layout pass found {} tier(s), scanning full page text",
        strategy,
        structured.len()
    );
    extractor.extract(&markup::page_text(document), currency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::PriceTier;

    #[test]
    fn test_dispatch_known_strategies() {
        assert_eq!(dispatch("wave7").name(), "wave7");
        assert_eq!(dispatch("waco").name(), "waco");
        assert_eq!(dispatch("thewave").name(), "thewave");
        assert_eq!(dispatch("generic_price_scan").name(), GENERIC_STRATEGY);
        assert_eq!(dispatch(" Wave7 ").name(), "wave7");
    }

    #[test]
    fn test_dispatch_unknown_defaults_to_generic() {
        assert_eq!(dispatch("squarespace").name(), GENERIC_STRATEGY);
        assert_eq!(dispatch("").name(), GENERIC_STRATEGY);
        assert!(!is_known_strategy("squarespace"));
        assert!(is_known_strategy("generic"));
    }

    #[test]
    fn test_full_text_scan_replaces_single_tier_layout_result() {
        // 價格離標題太遠，全文掃描的視窗看不到標籤
        let html = format!(
            r#"<html><body><div class="catalog-item"><div class="title"><h3>Beginner Waves</h3></div>
               <p>{}</p><strong>$ 95.00</strong></div></body></html>"#,
            "Book early to secure your preferred slot. ".repeat(4)
        );
        let extractor = PriceExtractor::default();
        let document = Html::parse_document(&html);
        let structured: PriceObservation = [(PriceTier::Beginner, 95.0)].into_iter().collect();

        let chosen = prefer_structured("wave7", structured, &document, Currency::Usd, &extractor);
        assert!(chosen.is_empty());

        let parsed = dispatch("wave7").parse(&html, Currency::Usd, &extractor).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn test_layout_result_with_two_tiers_is_kept() {
        let extractor = PriceExtractor::default();
        let document = Html::parse_document("<html><body><p>Nothing here</p></body></html>");
        let structured: PriceObservation = [(PriceTier::Beginner, 95.0), (PriceTier::Advanced, 133.0)]
            .into_iter()
            .collect();

        let chosen = prefer_structured("wave7", structured.clone(), &document, Currency::Usd, &extractor);
        assert_eq!(chosen, structured);
    }
}
