use crate::config::toml_config::KeywordConfig;
use crate::domain::model::PriceTier;

/// 將自由文字標籤歸類到價格等級
///
/// The skip list short-circuits everything. Tiers are then tried in
/// priority order advanced, intermediate, beginner; the first tier with a
/// keyword contained in the label wins. Matching is case-insensitive
/// substring containment, so a keyword embedded in an unrelated word still
/// matches.
#[derive(Debug, Clone)]
pub struct SessionCategorizer {
    skip: Vec<String>,
    tiers: [(PriceTier, Vec<String>); 3],
}

impl SessionCategorizer {
    pub fn new(keywords: &KeywordConfig) -> Self {
        let upper = |words: &[String]| -> Vec<String> {
            words
                .iter()
                .map(|w| w.to_uppercase())
                .filter(|w| !w.is_empty())
                .collect()
        };

        Self {
            skip: upper(&keywords.skip),
            tiers: [
                (PriceTier::Advanced, upper(&keywords.advanced)),
                (PriceTier::Intermediate, upper(&keywords.intermediate)),
                (PriceTier::Beginner, upper(&keywords.beginner)),
            ],
        }
    }

    pub fn categorize(&self, label: &str) -> Option<PriceTier> {
        let label = label.to_uppercase();

        if self.skip.iter().any(|w| label.contains(w.as_str())) {
            return None;
        }

        self.tiers
            .iter()
            .find(|(_, words)| words.iter().any(|w| label.contains(w.as_str())))
            .map(|(tier, _)| *tier)
    }
}

impl Default for SessionCategorizer {
    fn default() -> Self {
        Self::new(&KeywordConfig::default())
    }
}
