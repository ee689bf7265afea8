//! 獨特性（反主流）計分
//!
//! 以卡牌出場率估計「常見程度」，獎勵較少見的卡：
//! - `CardPopularity`: 出場率表（0.0 罕見 ~ 1.0 極常見），可覆寫或由牌組樣本重算
//! - `UniquenessScorer`: 單卡加分與牌組獨特性（算術或幾何平均）

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use super::cards::canonical_card_name;

/// 未收錄卡牌的出場率
pub const DEFAULT_POPULARITY: f64 = 0.5;
/// 權重上限，避免獨特性壓過卡牌強度
pub const MAX_UNIQUENESS_WEIGHT: f64 = 0.3;

// ============================================================================
// 出場率表
// ============================================================================

/// 預設出場率（正規卡名）
pub static CARD_POPULARITY: &[(&str, f64)] = &[
    // 極常見 (0.8 ~ 1.0)
    ("Zap", 0.95),
    ("Log", 0.92),
    ("Hog Rider", 0.90),
    ("Fireball", 0.88),
    ("Goblin Barrel", 0.88),
    ("Mini P.E.K.K.A", 0.85),
    ("Skeletons", 0.85),
    ("Musketeer", 0.82),
    ("Knight", 0.82),
    ("Baby Dragon", 0.82),
    ("Valkyrie", 0.80),
    ("Inferno Tower", 0.80),
    // 常見 (0.5 ~ 0.8)
    ("Ice Spirit", 0.78),
    ("Tesla", 0.78),
    ("Electro Wizard", 0.78),
    ("Archers", 0.75),
    ("Mega Minion", 0.75),
    ("Arrows", 0.75),
    ("Golem", 0.72),
    ("Wizard", 0.72),
    ("Bats", 0.72),
    ("Mega Knight", 0.72),
    ("Barbarian Barrel", 0.72),
    ("P.E.K.K.A", 0.70),
    ("Miner", 0.70),
    ("Goblins", 0.70),
    ("Royal Giant", 0.68),
    ("Princess", 0.68),
    ("Spear Goblins", 0.68),
    ("Goblin Gang", 0.68),
    ("Poison", 0.68),
    ("Giant", 0.65),
    ("Ice Wizard", 0.65),
    ("Minions", 0.65),
    ("Ice Golem", 0.65),
    ("Tornado", 0.65),
    ("Balloon", 0.62),
    ("Battle Ram", 0.62),
    ("Night Witch", 0.62),
    ("Inferno Dragon", 0.62),
    ("Lightning", 0.62),
    ("Electro Spirit", 0.62),
    ("Cannon", 0.62),
    ("Lumberjack", 0.60),
    ("Bandit", 0.60),
    ("Giant Snowball", 0.60),
    ("Ram Rider", 0.58),
    ("Graveyard", 0.58),
    ("Fisherman", 0.58),
    ("Electro Dragon", 0.58),
    ("Barbarians", 0.58),
    ("Rocket", 0.58),
    ("Fire Spirit", 0.58),
    ("Tombstone", 0.58),
    ("Goblin Drill", 0.58),
    ("Mortar", 0.55),
    ("Lava Hound", 0.55),
    ("Royal Ghost", 0.55),
    ("Dark Prince", 0.55),
    ("Heal Spirit", 0.55),
    ("Goblin Cage", 0.55),
    ("X-Bow", 0.52),
    ("Hunter", 0.52),
    ("Skeleton Barrel", 0.52),
    ("Prince", 0.52),
    ("Bomber", 0.52),
    ("Furnace", 0.52),
    ("Electro Giant", 0.52),
    ("Sparky", 0.50),
    ("Witch", 0.50),
    // 少見 (0.2 ~ 0.5)
    ("Flying Machine", 0.48),
    ("Executioner", 0.48),
    ("Freeze", 0.48),
    ("Dart Goblin", 0.48),
    ("Bomb Tower", 0.48),
    ("Royal Delivery", 0.48),
    ("Skeleton Dragons", 0.48),
    ("Bowler", 0.45),
    ("Earthquake", 0.45),
    ("Mother Witch", 0.45),
    ("Elixir Golem", 0.42),
    ("Three Musketeers", 0.42),
    ("Goblin Hut", 0.42),
    ("Wall Breakers", 0.42),
    ("Barbarian Hut", 0.38),
    ("Mirror", 0.35),
    ("Elixir Collector", 0.35),
    ("Rage", 0.30),
    ("Clone", 0.25),
    // 極罕見 (< 0.2)
    ("Heal", 0.15),
    ("Guardian", 0.12),
];

/// 卡牌出場率；覆寫值優先於預設表
#[derive(Clone, Debug, Default)]
pub struct CardPopularity {
    overrides: BTreeMap<String, f64>,
}

impl CardPopularity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn popularity(&self, card: &str) -> f64 {
        let name = canonical_card_name(card);
        if let Some(&value) = self.overrides.get(name) {
            return value;
        }
        CARD_POPULARITY
            .iter()
            .find(|(n, _)| *n == name)
            .map(|&(_, value)| value)
            .unwrap_or(DEFAULT_POPULARITY)
    }

    /// 1 - 出場率
    pub fn uniqueness(&self, card: &str) -> f64 {
        1.0 - self.popularity(card)
    }

    /// 覆寫單卡出場率（夾在 [0, 1]）
    pub fn set_popularity(&mut self, card: &str, popularity: f64) {
        let name = canonical_card_name(card).to_string();
        self.overrides.insert(name, popularity.clamp(0.0, 1.0));
    }

    /// 由牌組樣本重算出場率：出現頻率 × 2，上限 1；未出現的卡維持原值
    pub fn update_from_decks(&mut self, decks: &[Vec<String>]) {
        if decks.is_empty() {
            return;
        }
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for deck in decks {
            for card in deck {
                *counts.entry(canonical_card_name(card)).or_insert(0) += 1;
            }
        }
        let total = decks.len() as f64;
        for (card, count) in counts {
            let frequency = count as f64 / total;
            self.overrides.insert(card.to_string(), (frequency * 2.0).min(1.0));
        }
    }
}

/// 獨特性等級描述
pub fn uniqueness_tier(uniqueness: f64) -> &'static str {
    match uniqueness {
        u if u >= 0.8 => "Very Unique",
        u if u >= 0.6 => "Unique",
        u if u >= 0.4 => "Moderate",
        u if u >= 0.2 => "Common",
        _ => "Very Common",
    }
}

// ============================================================================
// 獨特性計分器
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UniquenessConfig {
    pub enabled: bool,
    /// 加分權重，夾在 [0, 0.3]
    pub weight: f64,
    /// 獨特性低於此值的卡不加分
    pub min_uniqueness_threshold: f64,
    /// 幾何平均：任一卡不達門檻時牌組分數為 0
    pub use_geometric_mean: bool,
}

impl Default for UniquenessConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            weight: 0.15,
            min_uniqueness_threshold: 0.5,
            use_geometric_mean: false,
        }
    }
}

impl UniquenessConfig {
    pub fn enabled(weight: f64) -> Self {
        Self { enabled: true, weight, ..Default::default() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UniquenessResult {
    pub final_score: f64,
    pub weighted_score: f64,
    pub average_uniqueness: f64,
    pub card_uniqueness: BTreeMap<String, f64>,
    pub qualifying_cards: usize,
    pub below_threshold_cards: Vec<String>,
    pub most_unique_card: Option<String>,
    pub least_unique_card: Option<String>,
}

/// 預設為停用（所有分數為 0）
#[derive(Clone, Debug, Default)]
pub struct UniquenessScorer {
    popularity: Arc<CardPopularity>,
    config: UniquenessConfig,
}

impl UniquenessScorer {
    pub fn new(config: UniquenessConfig) -> Self {
        Self::with_popularity(Arc::new(CardPopularity::new()), config)
    }

    pub fn with_popularity(popularity: Arc<CardPopularity>, mut config: UniquenessConfig) -> Self {
        config.weight = config.weight.clamp(0.0, MAX_UNIQUENESS_WEIGHT);
        Self { popularity, config }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &UniquenessConfig {
        &self.config
    }

    pub fn popularity(&self) -> &CardPopularity {
        &self.popularity
    }

    /// 達門檻的獨特性，否則為 0
    fn qualified(&self, card: &str) -> f64 {
        let uniqueness = self.popularity.uniqueness(card);
        if uniqueness >= self.config.min_uniqueness_threshold {
            uniqueness
        } else {
            0.0
        }
    }

    /// 單卡加分：權重 × 達門檻的獨特性
    pub fn score_card(&self, card: &str) -> f64 {
        if !self.is_enabled() {
            return 0.0;
        }
        self.qualified(card) * self.config.weight
    }

    /// 牌組獨特性 [0, 1]（未加權）
    pub fn score_deck(&self, deck: &[String]) -> f64 {
        if !self.is_enabled() || deck.is_empty() {
            return 0.0;
        }
        let scores: Vec<f64> = deck.iter().map(|c| self.qualified(c)).collect();
        self.combine(&scores)
    }

    fn combine(&self, scores: &[f64]) -> f64 {
        if scores.is_empty() {
            return 0.0;
        }
        if self.config.use_geometric_mean {
            geometric_mean(scores)
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        }
    }

    pub fn analyze(&self, deck: &[String]) -> UniquenessResult {
        let mut result = UniquenessResult::default();
        if !self.is_enabled() || deck.is_empty() {
            return result;
        }

        let mut scores = Vec::with_capacity(deck.len());
        let mut total = 0.0;
        let mut most: Option<(&String, f64)> = None;
        let mut least: Option<(&String, f64)> = None;
        for card in deck {
            let uniqueness = self.popularity.uniqueness(card);
            result.card_uniqueness.insert(card.clone(), uniqueness);

            if uniqueness >= self.config.min_uniqueness_threshold {
                scores.push(uniqueness);
                total += uniqueness;
                result.qualifying_cards += 1;
            } else {
                scores.push(0.0);
                result.below_threshold_cards.push(card.clone());
            }

            if most.map_or(true, |(_, u)| uniqueness > u) {
                most = Some((card, uniqueness));
            }
            if least.map_or(true, |(_, u)| uniqueness < u) {
                least = Some((card, uniqueness));
            }
        }

        result.average_uniqueness = total / deck.len() as f64;
        result.final_score = self.combine(&scores);
        result.weighted_score = result.final_score * self.config.weight;
        result.most_unique_card = most.map(|(c, _)| c.clone());
        result.least_unique_card = least.map(|(c, _)| c.clone());
        result
    }
}

/// 對數空間計算；任一值 ≤ 0 時為 0
fn geometric_mean(values: &[f64]) -> f64 {
    if values.is_empty() || values.iter().any(|&v| v <= 0.0) {
        return 0.0;
    }
    let sum_logs: f64 = values.iter().map(|v| v.ln()).sum();
    (sum_logs / values.len() as f64).exp()
}

// ============================================================================
// 單元測試
// ============================================================================
