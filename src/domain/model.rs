use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lower bound of the plausibility band (exclusive).
pub const MIN_PLAUSIBLE_PRICE: f64 = 10.0;
/// Upper bound of the plausibility band (exclusive).
pub const MAX_PLAUSIBLE_PRICE: f64 = 500.0;

pub fn is_plausible_price(value: f64) -> bool {
    value > MIN_PLAUSIBLE_PRICE && value < MAX_PLAUSIBLE_PRICE
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    Beginner,
    Intermediate,
    Advanced,
}

impl PriceTier {
    pub const ALL: [PriceTier; 3] = [
        PriceTier::Beginner,
        PriceTier::Intermediate,
        PriceTier::Advanced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Beginner => "beginner",
            PriceTier::Intermediate => "intermediate",
            PriceTier::Advanced => "advanced",
        }
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Gbp,
    Eur,
}

impl Currency {
    pub fn symbol(&self) -> char {
        match self {
            Currency::Usd => '$',
            Currency::Gbp => '£',
            Currency::Eur => '€',
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Gbp => "GBP",
            Currency::Eur => "EUR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Tier -> USD price. Missing tiers are absent, never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriceObservation(BTreeMap<PriceTier, f64>);

impl PriceObservation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tier: PriceTier) -> Option<f64> {
        self.0.get(&tier).copied()
    }

    pub fn insert(&mut self, tier: PriceTier, price: f64) {
        self.0.insert(tier, price);
    }

    /// 保留每個等級的最低價格 (base price)
    pub fn offer_min(&mut self, tier: PriceTier, price: f64) -> bool {
        match self.0.get(&tier) {
            Some(existing) if *existing <= price => false,
            _ => {
                self.0.insert(tier, price);
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PriceTier, f64)> + '_ {
        self.0.iter().map(|(tier, price)| (*tier, *price))
    }
}

impl FromIterator<(PriceTier, f64)> for PriceObservation {
    fn from_iter<I: IntoIterator<Item = (PriceTier, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for PriceObservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .map(|(tier, price)| format!("{}=${:.2}", tier, price))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Scraped,
    Published,
    Mixed,
    Failed,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Scraped => "scraped",
            SourceType::Published => "published",
            SourceType::Mixed => "mixed",
            SourceType::Failed => "failed",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// 舊版歷史檔沒有 source_type 欄位，當時只有即時抓取
fn legacy_source_type() -> SourceType {
    SourceType::Scraped
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    #[serde(rename = "park_id")]
    pub venue_id: String,
    #[serde(rename = "park_name")]
    pub venue_name: String,
    pub location: String,
    pub tech: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "prices_usd")]
    pub prices: PriceObservation,
    pub source_url: String,
    #[serde(default = "legacy_source_type")]
    pub source_type: SourceType,
}

impl PriceRecord {
    pub fn month_key(&self) -> String {
        self.timestamp.format("%Y-%m").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMetadata {
    pub created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub total_scrapes: usize,
    /// Keys written by other tools are carried through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub scrapes: Vec<PriceRecord>,
    pub metadata: HistoryMetadata,
}

impl History {
    pub fn new(created: DateTime<Utc>) -> Self {
        Self {
            scrapes: Vec::new(),
            metadata: HistoryMetadata {
                created,
                last_updated: None,
                total_scrapes: 0,
                extra: serde_json::Map::new(),
            },
        }
    }

    pub fn len(&self) -> usize {
        self.scrapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scrapes.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierStats {
    pub current: f64,
    pub running_avg: f64,
    pub min: f64,
    pub max: f64,
    pub data_points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VenueAggregate {
    pub park_id: String,
    pub park_name: String,
    pub location: String,
    pub tech: String,
    pub scrape_count: usize,
    pub first_scrape: DateTime<Utc>,
    pub last_scrape: DateTime<Utc>,
    pub averages: BTreeMap<PriceTier, TierStats>,
    pub monthly_averages: BTreeMap<String, BTreeMap<PriceTier, f64>>,
    pub source_breakdown: BTreeMap<SourceType, usize>,
}

pub type Aggregates = BTreeMap<String, VenueAggregate>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offer_min_keeps_cheapest() {
        let mut obs = PriceObservation::new();
        assert!(obs.offer_min(PriceTier::Beginner, 103.0));
        assert!(obs.offer_min(PriceTier::Beginner, 95.5));
        assert!(!obs.offer_min(PriceTier::Beginner, 99.0));
        assert_eq!(obs.get(PriceTier::Beginner), Some(95.5));
    }

    #[test]
    fn test_plausibility_band_is_exclusive() {
        assert!(!is_plausible_price(10.0));
        assert!(is_plausible_price(10.01));
        assert!(is_plausible_price(499.99));
        assert!(!is_plausible_price(500.0));
    }

    #[test]
    fn test_record_json_shape() {
        let record = PriceRecord {
            venue_id: "waco".to_string(),
            venue_name: "Waco Surf".to_string(),
            location: "Waco, TX".to_string(),
            tech: "PerfectSwell (AWM)".to_string(),
            timestamp: "2026-02-01T06:00:00Z".parse().unwrap(),
            prices: [(PriceTier::Beginner, 129.0)].into_iter().collect(),
            source_url: "https://www.wacosurf.com/surf-center/".to_string(),
            source_type: SourceType::Mixed,
        };

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["park_id"], "waco");
        assert_eq!(value["prices_usd"]["beginner"], 129.0);
        assert_eq!(value["source_type"], "mixed");
        assert_eq!(record.month_key(), "2026-02");
    }

    #[test]
    fn test_legacy_record_without_source_type() {
        let json = r#"{
            "park_id": "revel",
            "park_name": "Revel Surf",
            "location": "Mesa, AZ",
            "tech": "SwellMFG + UNIT",
            "timestamp": "2026-02-14T06:00:03.512345+00:00",
            "prices_usd": {"beginner": 95.0},
            "source_url": "https://www.revelsurf.com/surf"
        }"#;

        let record: PriceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.source_type, SourceType::Scraped);
        assert_eq!(record.prices.get(PriceTier::Beginner), Some(95.0));
    }
}
