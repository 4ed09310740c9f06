use crate::domain::model::{Currency, PriceObservation, PriceTier};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (compatible; SurfParkPriceTracker/1.0)";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 15;
pub const DEFAULT_HISTORY_FILE: &str = "price_history.json";
pub const DEFAULT_AVERAGES_FILE: &str = "price_averages.json";
pub const DEFAULT_PARSER: &str = "generic_price_scan";

/// Bytes of context scanned before a price token, snapped to a char boundary.
pub const DEFAULT_WINDOW_BEFORE: usize = 120;
/// Bytes of context scanned after a price token, snapped to a char boundary.
pub const DEFAULT_WINDOW_AFTER: usize = 40;

static ENV_VAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub tracker: TrackerInfo,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub currency_rates: CurrencyRates,
    #[serde(default)]
    pub keywords: KeywordConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    pub venues: Vec<VenueConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerInfo {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub output_path: String,
    #[serde(default = "default_history_file")]
    pub history_file: String,
    #[serde(default = "default_averages_file")]
    pub averages_file: String,
    pub summary_csv: Option<String>,
}

fn default_output_path() -> String {
    ".".to_string()
}

fn default_history_file() -> String {
    DEFAULT_HISTORY_FILE.to_string()
}

fn default_averages_file() -> String {
    DEFAULT_AVERAGES_FILE.to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_path: default_output_path(),
            history_file: default_history_file(),
            averages_file: default_averages_file(),
            summary_csv: None,
        }
    }
}

/// Static conversion table into USD. Not a live FX feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyRates {
    #[serde(rename = "USD", default = "usd_rate")]
    pub usd: f64,
    #[serde(rename = "GBP", default = "gbp_rate")]
    pub gbp: f64,
    #[serde(rename = "EUR", default = "eur_rate")]
    pub eur: f64,
}

fn usd_rate() -> f64 {
    1.0
}

fn gbp_rate() -> f64 {
    1.27
}

fn eur_rate() -> f64 {
    1.09
}

impl Default for CurrencyRates {
    fn default() -> Self {
        Self {
            usd: usd_rate(),
            gbp: gbp_rate(),
            eur: eur_rate(),
        }
    }
}

impl CurrencyRates {
    pub fn rate(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Usd => self.usd,
            Currency::Gbp => self.gbp,
            Currency::Eur => self.eur,
        }
    }

    pub fn to_usd(&self, amount: f64, currency: Currency) -> f64 {
        crate::domain::model::round2(amount * self.rate(currency))
    }
}

/// Curated keyword lists. Matching is uppercase substring containment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    #[serde(default = "default_skip")]
    pub skip: Vec<String>,
    #[serde(default = "default_advanced")]
    pub advanced: Vec<String>,
    #[serde(default = "default_intermediate")]
    pub intermediate: Vec<String>,
    #[serde(default = "default_beginner")]
    pub beginner: Vec<String>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn default_skip() -> Vec<String> {
    owned(&[
        "GIFT",
        "VOUCHER",
        "MERCH",
        "CABANA",
        "BEACH PASS",
        "LODGING",
        "ACCOMMODATION",
        "LESSON",
        "COACHING",
        "CAMP",
        "ADAPTIVE",
        "BODYBOARD",
        "BOOGIE",
        "SPECTATOR",
        "WETSUIT",
        "RENTAL",
        "MEMBERSHIP",
    ])
}

fn default_advanced() -> Vec<String> {
    owned(&[
        "ADVANCED",
        "EXPERT",
        "PRO ",
        "PRO BARREL",
        "HIGH PERFORMANCE",
        "BARREL",
        "MANOEUVRE",
        "TURNS 3",
        "TURNS 2",
    ])
}

fn default_intermediate() -> Vec<String> {
    owned(&[
        "INTERMEDIATE",
        "PROGRESSIVE",
        "CRUISER",
        "TURNS ",
        "NOVICE",
        "IMPROVER",
    ])
}

fn default_beginner() -> Vec<String> {
    owned(&["BEGINNER", "LEARN TO SURF", "FIRST WAVE", "INTRO", "STARTER"])
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            skip: default_skip(),
            advanced: default_advanced(),
            intermediate: default_intermediate(),
            beginner: default_beginner(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_window_before")]
    pub window_before: usize,
    #[serde(default = "default_window_after")]
    pub window_after: usize,
}

fn default_window_before() -> usize {
    DEFAULT_WINDOW_BEFORE
}

fn default_window_after() -> usize {
    DEFAULT_WINDOW_AFTER
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            window_before: default_window_before(),
            window_after: default_window_after(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnownPriceTable {
    pub beginner: Option<f64>,
    pub intermediate: Option<f64>,
    pub advanced: Option<f64>,
}

impl KnownPriceTable {
    pub fn entries(&self) -> impl Iterator<Item = (PriceTier, f64)> + '_ {
        PriceTier::ALL
            .into_iter()
            .filter_map(|tier| self.get(tier).map(|price| (tier, price)))
    }

    pub fn get(&self, tier: PriceTier) -> Option<f64> {
        match tier {
            PriceTier::Beginner => self.beginner,
            PriceTier::Intermediate => self.intermediate,
            PriceTier::Advanced => self.advanced,
        }
    }

    /// 將已知價格表換算成美元
    pub fn to_usd(&self, currency: Currency, rates: &CurrencyRates) -> PriceObservation {
        self.entries()
            .map(|(tier, price)| (tier, rates.to_usd(price, currency)))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    pub id: String,
    pub name: String,
    pub location: String,
    pub tech: String,
    pub url: String,
    pub currency: Currency,
    #[serde(default = "default_parser")]
    pub parser: String,
    pub known_prices: Option<KnownPriceTable>,
    /// Currency of `known_prices`; USD when omitted.
    pub known_prices_currency: Option<Currency>,
    pub price_source: Option<String>,
}

fn default_parser() -> String {
    DEFAULT_PARSER.to_string()
}

impl VenueConfig {
    /// 已知價格表 (美元)，沒有設定或表為空時回傳 None
    pub fn known_prices_usd(&self, rates: &CurrencyRates) -> Option<PriceObservation> {
        let table = self.known_prices.as_ref()?;
        let currency = self.known_prices_currency.unwrap_or(Currency::Usd);
        let prices = table.to_usd(currency, rates);
        (!prices.is_empty()).then_some(prices)
    }
}

impl TrackerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content =
            std::fs::read_to_string(&path).map_err(|e| EtlError::ConfigError {
                message: format!("cannot read {}: {}", path.as_ref().display(), e),
            })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${VENUE_URL})
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_PATTERN
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("tracker.name", &self.tracker.name)?;
        validation::validate_path("output.output_path", &self.output.output_path)?;
        validation::validate_path("output.history_file", &self.output.history_file)?;
        validation::validate_path("output.averages_file", &self.output.averages_file)?;
        if let Some(csv) = &self.output.summary_csv {
            validation::validate_path("output.summary_csv", csv)?;
        }
        validation::validate_positive_number(
            "fetch.timeout_seconds",
            self.fetch.timeout_seconds as usize,
            1,
        )?;

        validation::validate_positive_amount("currency_rates.USD", self.currency_rates.usd)?;
        validation::validate_positive_amount("currency_rates.GBP", self.currency_rates.gbp)?;
        validation::validate_positive_amount("currency_rates.EUR", self.currency_rates.eur)?;

        validation::validate_positive_number(
            "extraction.window_before",
            self.extraction.window_before,
            1,
        )?;
        validation::validate_positive_number(
            "extraction.window_after",
            self.extraction.window_after,
            1,
        )?;

        if self.venues.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "venues".to_string(),
            });
        }
        validation::validate_unique("venues.id", self.venues.iter().map(|v| v.id.as_str()))?;

        for venue in &self.venues {
            validation::validate_non_empty_string("venues.id", &venue.id)?;
            validation::validate_url(&format!("venues.{}.url", venue.id), &venue.url)?;
            if let Some(table) = &venue.known_prices {
                for (tier, price) in table.entries() {
                    validation::validate_positive_amount(
                        &format!("venues.{}.known_prices.{}", venue.id, tier),
                        price,
                    )?;
                }
            }
        }

        Ok(())
    }

    pub fn venue(&self, id: &str) -> Option<&VenueConfig> {
        self.venues.iter().find(|v| v.id == id)
    }
}

impl Validate for TrackerConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[tracker]
name = "test-tracker"

[[venues]]
id = "atlantic"
name = "Atlantic Park Surf"
location = "Virginia Beach, VA"
tech = "Wavegarden Cove"
url = "https://booking.atlanticparksurf.com/store"
currency = "USD"
parser = "wave7"

[venues.known_prices]
beginner = 119
intermediate = 129
advanced = 139

[[venues]]
id = "lostshore"
name = "Lost Shore Surf Resort"
location = "Edinburgh, UK"
tech = "Wavegarden Cove"
url = "https://booking.lostshore.com/surf-sessions"
currency = "GBP"
"#;

    #[test]
    fn test_parse_basic_config_with_defaults() {
        let config = TrackerConfig::from_toml_str(BASIC).unwrap();

        assert_eq!(config.tracker.name, "test-tracker");
        assert_eq!(config.venues.len(), 2);
        assert_eq!(config.fetch.timeout_seconds, 15);
        assert_eq!(config.output.history_file, "price_history.json");
        assert_eq!(config.currency_rates.rate(Currency::Gbp), 1.27);
        assert!(config.keywords.skip.contains(&"GIFT".to_string()));
        assert_eq!(config.extraction.window_before, DEFAULT_WINDOW_BEFORE);

        let lostshore = config.venue("lostshore").unwrap();
        assert_eq!(lostshore.currency, Currency::Gbp);
        assert_eq!(lostshore.parser, DEFAULT_PARSER);
        assert!(lostshore.known_prices.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_known_prices_converted_to_usd() {
        let mut config = TrackerConfig::from_toml_str(BASIC).unwrap();
        let rates = config.currency_rates.clone();

        let atlantic = config.venue("atlantic").unwrap();
        let usd = atlantic.known_prices_usd(&rates).unwrap();
        assert_eq!(usd.get(PriceTier::Beginner), Some(119.0));

        config.venues[0].known_prices_currency = Some(Currency::Gbp);
        let converted = config.venues[0].known_prices_usd(&rates).unwrap();
        assert_eq!(converted.get(PriceTier::Beginner), Some(151.13));
    }

    #[test]
    fn test_empty_known_price_table_is_treated_as_absent() {
        let mut config = TrackerConfig::from_toml_str(BASIC).unwrap();
        config.venues[0].known_prices = Some(KnownPriceTable::default());
        assert!(config.venues[0]
            .known_prices_usd(&config.currency_rates)
            .is_none());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("SURF_TEST_VENUE_URL", "https://test.example.com/book");

        let content = r#"
[tracker]
name = "env"

[[venues]]
id = "x"
name = "X"
location = "Somewhere"
tech = "Unknown"
url = "${SURF_TEST_VENUE_URL}"
currency = "EUR"
"#;

        let config = TrackerConfig::from_toml_str(content).unwrap();
        assert_eq!(config.venues[0].url, "https://test.example.com/book");

        std::env::remove_var("SURF_TEST_VENUE_URL");
    }

    #[test]
    fn test_validation_rejects_duplicate_ids_and_bad_urls() {
        let mut config = TrackerConfig::from_toml_str(BASIC).unwrap();
        config.venues[1].id = "atlantic".to_string();
        assert!(config.validate().is_err());

        let mut config = TrackerConfig::from_toml_str(BASIC).unwrap();
        config.venues[0].url = "not-a-url".to_string();
        assert!(config.validate().is_err());

        let mut config = TrackerConfig::from_toml_str(BASIC).unwrap();
        config.venues.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_currency_fails_to_parse() {
        let content = BASIC.replace("currency = \"GBP\"", "currency = \"JPY\"");
        assert!(TrackerConfig::from_toml_str(&content).is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = TrackerConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.tracker.name, "test-tracker");
    }

    #[test]
    fn test_missing_config_file_is_config_error() {
        let err = TrackerConfig::from_file("/nonexistent/surf-parks.toml").unwrap_err();
        assert!(matches!(err, EtlError::ConfigError { .. }));
    }

    #[test]
    fn test_shipped_config_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("configs/surf-parks.toml");
        let config = TrackerConfig::from_file(path).unwrap();
        config.validate().unwrap();
        assert_eq!(config.venues.len(), 8);
        assert_eq!(config.venue("thewave").unwrap().currency, Currency::Gbp);
        assert!(config.venues.iter().all(|v| v.known_prices.is_none()));
    }
}
