use crate::config::toml_config::{
    CurrencyRates, ExtractionConfig, DEFAULT_WINDOW_AFTER, DEFAULT_WINDOW_BEFORE,
};
use crate::core::categorizer::SessionCategorizer;
use crate::domain::model::{is_plausible_price, Currency, PriceObservation, PriceTier};
use crate::utils::error::{EtlError, Result};
use regex::Regex;
use std::sync::LazyLock;

// 貨幣符號後可有空白 (例如 Wave7 的 "$ 103.00")，數字可含千分位逗號與小數
static USD_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*(\d[\d,]*(?:\.\d+)?)").expect("valid USD pattern"));
static GBP_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"£\s*(\d[\d,]*(?:\.\d+)?)").expect("valid GBP pattern"));
static EUR_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"€\s*(\d[\d,]*(?:\.\d+)?)").expect("valid EUR pattern"));

pub fn token_pattern(currency: Currency) -> &'static Regex {
    match currency {
        Currency::Usd => &USD_TOKEN,
        Currency::Gbp => &GBP_TOKEN,
        Currency::Eur => &EUR_TOKEN,
    }
}

/// Byte span of context scanned around a price token, snapped to char
/// boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextWindow {
    pub before: usize,
    pub after: usize,
}

impl ContextWindow {
    pub const fn new(before: usize, after: usize) -> Self {
        Self { before, after }
    }
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_BEFORE, DEFAULT_WINDOW_AFTER)
    }
}

impl From<&ExtractionConfig> for ContextWindow {
    fn from(config: &ExtractionConfig) -> Self {
        Self::new(config.window_before, config.window_after)
    }
}

/// A currency-prefixed number that passed the plausibility band.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceToken {
    /// Byte offset of the currency symbol.
    pub start: usize,
    /// Byte offset just past the last digit.
    pub end: usize,
    /// Value in the source currency.
    pub amount: f64,
}

/// 解析數字字面值並檢查合理價格區間 (以原幣計)
pub fn parse_amount(literal: &str) -> Result<f64> {
    let cleaned = literal.replace(',', "");
    let amount: f64 = cleaned.parse().map_err(|e| EtlError::InvalidToken {
        token: literal.to_string(),
        reason: format!("not a number: {}", e),
    })?;

    if !is_plausible_price(amount) {
        return Err(EtlError::InvalidToken {
            token: literal.to_string(),
            reason: "outside plausibility band (10, 500)".to_string(),
        });
    }
    Ok(amount)
}

fn floor_boundary(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_boundary(text: &str, mut index: usize) -> usize {
    index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[derive(Debug, Clone)]
pub struct PriceExtractor {
    categorizer: SessionCategorizer,
    rates: CurrencyRates,
    window: ContextWindow,
}

impl PriceExtractor {
    pub fn new(categorizer: SessionCategorizer, rates: CurrencyRates, window: ContextWindow) -> Self {
        Self {
            categorizer,
            rates,
            window,
        }
    }

    pub fn rates(&self) -> &CurrencyRates {
        &self.rates
    }

    pub fn categorize(&self, label: &str) -> Option<PriceTier> {
        self.categorizer.categorize(label)
    }

    pub fn to_usd(&self, amount: f64, currency: Currency) -> f64 {
        self.rates.to_usd(amount, currency)
    }

    /// USD value of `amount`, or `None` when the converted value falls
    /// outside the plausibility band.
    pub fn plausible_usd(&self, amount: f64, currency: Currency) -> Option<f64> {
        let price_usd = self.to_usd(amount, currency);
        if is_plausible_price(price_usd) {
            Some(price_usd)
        } else {
            tracing::debug!(
                "Dropping {}{} -> ${:.2}: outside plausibility band in USD",
                currency.symbol(),
                amount,
                price_usd
            );
            None
        }
    }

    /// All plausible tokens for `currency`, in text order. Rejected tokens
    /// are logged and dropped.
    pub fn find_tokens(&self, text: &str, currency: Currency) -> Vec<PriceToken> {
        token_pattern(currency)
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let number = caps.get(1)?;
                match parse_amount(number.as_str()) {
                    Ok(amount) => Some(PriceToken {
                        start: whole.start(),
                        end: whole.end(),
                        amount,
                    }),
                    Err(e) => {
                        tracing::debug!("Skipping token: {}", e);
                        None
                    }
                }
            })
            .collect()
    }

    /// First token in `text` that is plausible both in source units and in USD.
    pub fn first_price_usd(&self, text: &str, currency: Currency) -> Option<f64> {
        self.find_tokens(text, currency)
            .iter()
            .find_map(|token| self.plausible_usd(token.amount, currency))
    }

    pub fn extract(&self, text: &str, currency: Currency) -> PriceObservation {
        self.extract_with_window(text, currency, self.window)
    }

    /// 掃描全文中的價格，依附近文字分類，每個等級保留最低價
    pub fn extract_with_window(
        &self,
        text: &str,
        currency: Currency,
        window: ContextWindow,
    ) -> PriceObservation {
        let mut prices = PriceObservation::new();

        for token in self.find_tokens(text, currency) {
            let context = context_window(text, &token, window);
            let Some(tier) = self.categorize(context) else {
                continue;
            };
            let Some(price_usd) = self.plausible_usd(token.amount, currency) else {
                continue;
            };
            if prices.offer_min(tier, price_usd) {
                tracing::debug!("{} candidate {} -> ${:.2}", tier, currency, price_usd);
            }
        }

        prices
    }
}

/// Text from `window.before` bytes ahead of the token to `window.after`
/// bytes past it, token included.
pub fn context_window<'a>(text: &'a str, token: &PriceToken, window: ContextWindow) -> &'a str {
    let start = floor_boundary(text, token.start.saturating_sub(window.before));
    let end = ceil_boundary(text, token.end.saturating_add(window.after));
    &text[start..end]
}

impl Default for PriceExtractor {
    fn default() -> Self {
        Self::new(
            SessionCategorizer::default(),
            CurrencyRates::default(),
            ContextWindow::default(),
        )
    }
}
