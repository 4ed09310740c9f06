use crate::core::extractor::PriceExtractor;
use crate::core::parsers::{self, MIN_STRUCTURED_TIERS};
use crate::config::VenueConfig;
use crate::domain::model::{is_plausible_price, PriceObservation, SourceType};
use crate::domain::ports::Fetcher;
use crate::utils::error::Result;

/// Outcome of the live attempt, before reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveState {
    /// At least two tiers parsed.
    Ok,
    /// Page fetched but zero or one tier parsed.
    Partial,
    /// Transport or parse failure.
    Failed,
}

impl LiveState {
    pub fn of(live: Option<&PriceObservation>) -> Self {
        match live {
            None => LiveState::Failed,
            Some(prices) if prices.len() >= MIN_STRUCTURED_TIERS => LiveState::Ok,
            Some(_) => LiveState::Partial,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub live_state: LiveState,
    pub prices: PriceObservation,
    pub source: SourceType,
}

impl Reconciliation {
    /// Failed results are never persisted.
    pub fn is_persistable(&self) -> bool {
        self.source != SourceType::Failed && !self.prices.is_empty()
    }
}

/// 合併即時抓取結果與已知價格表
///
/// `live` is `None` when the live attempt failed outright. `known` is the
/// venue's fallback table already converted to USD.
pub fn reconcile(
    live: Option<&PriceObservation>,
    known: Option<&PriceObservation>,
) -> Reconciliation {
    let live_state = LiveState::of(live);

    if let (LiveState::Ok, Some(prices)) = (live_state, live) {
        return Reconciliation {
            live_state,
            prices: prices.clone(),
            source: SourceType::Scraped,
        };
    }

    match known {
        Some(table) => {
            let mut prices = table.clone();
            let mut overlaid = false;
            for (tier, price) in live.into_iter().flat_map(|p| p.iter()) {
                if is_plausible_price(price) {
                    prices.insert(tier, price);
                    overlaid = true;
                }
            }
            Reconciliation {
                live_state,
                prices,
                source: if overlaid {
                    SourceType::Mixed
                } else {
                    SourceType::Published
                },
            }
        }
        None => match live {
            Some(prices) if !prices.is_empty() => Reconciliation {
                live_state,
                prices: prices.clone(),
                source: SourceType::Scraped,
            },
            _ => Reconciliation {
                live_state,
                prices: PriceObservation::new(),
                source: SourceType::Failed,
            },
        },
    }
}

/// Fetch the venue page and run its configured strategy.
pub async fn attempt_live<F: Fetcher + ?Sized>(
    fetcher: &F,
    venue: &VenueConfig,
    extractor: &PriceExtractor,
) -> Result<PriceObservation> {
    let markup = fetcher.fetch(&venue.url).await?;
    let parser = parsers::dispatch(&venue.parser);
    tracing::debug!(
        "{}: parsing {} bytes with '{}'",
        venue.id,
        markup.len(),
        parser.name()
    );
    parser.parse(&markup, venue.currency, extractor)
}

/// 單一場館完整流程：即時抓取 -> 解析 -> 與已知價格表合併
///
/// Transport, parse and token errors stop here and route to the fallback
/// path; nothing propagates to other venues.
pub async fn process_venue<F: Fetcher + ?Sized>(
    fetcher: &F,
    venue: &VenueConfig,
    extractor: &PriceExtractor,
) -> Reconciliation {
    let live = match attempt_live(fetcher, venue, extractor).await {
        Ok(prices) => {
            if prices.is_empty() {
                tracing::warn!(
                    "⚠️ {}: no prices extracted (page structure may have changed)",
                    venue.name
                );
            } else {
                tracing::info!(
                    "✓ {}: found {} price level(s): {}",
                    venue.name,
                    prices.len(),
                    prices
                );
            }
            Some(prices)
        }
        Err(e) if e.is_venue_recoverable() => {
            tracing::warn!("✗ {}: live attempt failed: {}", venue.name, e);
            None
        }
        Err(e) => {
            tracing::error!(
                "✗ {}: live attempt failed ({:?}): {}",
                venue.name,
                e.category(),
                e
            );
            None
        }
    };

    let known = venue.known_prices_usd(extractor.rates());
    let result = reconcile(live.as_ref(), known.as_ref());

    match result.source {
        SourceType::Failed => {
            tracing::warn!("✗ {}: no usable prices, nothing recorded", venue.name)
        }
        source => tracing::info!(
            "{}: {} ({:?} live) {}",
            venue.name,
            source,
            result.live_state,
            result.prices
        ),
    }
    if let (SourceType::Published | SourceType::Mixed, Some(note)) =
        (result.source, venue.price_source.as_deref())
    {
        tracing::debug!("{}: fallback prices from {}", venue.id, note);
    }

    result
}
