//! 反制矩陣
//!
//! 威脅 → 反制卡（效果 0~1）的靜態表，以及每張卡提供的防守能力類別。
//!
//! # 架構
//!
//! - `THREAT_DEFS`: 預設威脅與反制關係
//! - `CAPABILITY_DEFS`: 能力類別 → 卡牌清單
//! - `CounterMatrix`: 建立後唯讀，可跨執行緒共享

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use super::cards::canonical_card_name;
use super::constants::STRONG_COUNTER_THRESHOLD;

// ============================================================================
// 能力類別
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterCategory {
    AirDefense,
    SplashDefense,
    TankKillers,
    ResetRetarget,
    Buildings,
    SwarmClear,
}

impl CounterCategory {
    pub fn all() -> &'static [CounterCategory] {
        &[
            CounterCategory::AirDefense,
            CounterCategory::SplashDefense,
            CounterCategory::TankKillers,
            CounterCategory::ResetRetarget,
            CounterCategory::Buildings,
            CounterCategory::SwarmClear,
        ]
    }

    pub fn key(self) -> &'static str {
        match self {
            CounterCategory::AirDefense => "air_defense",
            CounterCategory::SplashDefense => "splash_defense",
            CounterCategory::TankKillers => "tank_killers",
            CounterCategory::ResetRetarget => "reset_retarget",
            CounterCategory::Buildings => "buildings",
            CounterCategory::SwarmClear => "swarm_clear",
        }
    }
}

// ============================================================================
// 預設資料
// ============================================================================

/// 單一反制關係的靜態定義
#[derive(Clone, Copy)]
pub struct CounterDef {
    pub card: &'static str,
    pub effectiveness: f64,
    pub reason: &'static str,
}

const fn counter(card: &'static str, effectiveness: f64, reason: &'static str) -> CounterDef {
    CounterDef { card, effectiveness, reason }
}

/// 預設威脅表（依宣告順序分析）
pub static THREAT_DEFS: &[(&str, &[CounterDef])] = &[
    (
        "Mega Knight",
        &[
            counter("Inferno Tower", 1.0, "Percentage damage destroys MK quickly"),
            counter("Inferno Dragon", 0.95, "Percentage damage, needs protection"),
            counter("P.E.K.K.A", 0.9, "High damage tanks through MK"),
        ],
    ),
    (
        "Balloon",
        &[
            counter("Inferno Tower", 1.0, "Melts balloon instantly"),
            counter("Electro Wizard", 0.9, "Targets air, resets abilities"),
            counter("Musketeer", 0.85, "High DPS air targeting"),
        ],
    ),
    (
        "Graveyard",
        &[
            counter("Tornado", 0.95, "Groups skeletons for splash"),
            counter("Baby Dragon", 0.9, "Splash clears skeletons efficiently"),
            counter("Valkyrie", 0.9, "Spin attack clears all skeletons"),
        ],
    ),
    (
        "Hog Rider",
        &[
            counter("Tornado", 0.9, "Pulls to King Tower activation"),
            counter("Cannon", 0.85, "Cheap, reliable distraction"),
            counter("Tesla", 0.85, "Hidden until Hog arrives"),
        ],
    ),
];

/// 預設能力類別表
pub static CAPABILITY_DEFS: &[(CounterCategory, &[&str])] = &[
    (CounterCategory::AirDefense, &["Musketeer", "Electro Wizard", "Inferno Tower", "Tesla"]),
    (CounterCategory::SplashDefense, &["Valkyrie", "Baby Dragon", "Wizard"]),
    (CounterCategory::TankKillers, &["Inferno Tower", "P.E.K.K.A", "Mini P.E.K.K.A"]),
    (CounterCategory::ResetRetarget, &["Electro Wizard", "Zap", "Electro Spirit", "Electro Dragon"]),
    (CounterCategory::SwarmClear, &["Log", "Zap", "Arrows", "Valkyrie"]),
    (CounterCategory::Buildings, &["Cannon", "Tesla", "Inferno Tower", "Bomb Tower"]),
];

// ============================================================================
// 反制矩陣
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CounterEntry {
    pub card: String,
    pub effectiveness: f64,
    pub reason: String,
}

impl From<&CounterDef> for CounterEntry {
    fn from(def: &CounterDef) -> Self {
        Self {
            card: canonical_card_name(def.card).to_string(),
            effectiveness: def.effectiveness.clamp(0.0, 1.0),
            reason: def.reason.to_string(),
        }
    }
}

/// 牌組對單一威脅的反制分析
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreatCoverage {
    pub threat: String,
    pub can_counter: bool,
    /// 牌組內反制卡的平均效果
    pub effectiveness: f64,
    pub deck_counters: Vec<CounterEntry>,
    /// 牌組缺少的強力反制（效果 ≥ 0.8）
    pub missing_counters: Vec<CounterEntry>,
    pub reason: String,
    pub suggestion: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct CounterMatrix {
    /// 威脅名稱依插入順序保存
    threat_order: Vec<String>,
    threats: HashMap<String, Vec<CounterEntry>>,
    capabilities: HashMap<String, BTreeSet<CounterCategory>>,
}

impl CounterMatrix {
    /// 空矩陣
    pub fn new() -> Self {
        Self::default()
    }

    /// 內建預設資料
    pub fn with_defaults() -> Self {
        let mut matrix = Self::new();
        for (threat, counters) in THREAT_DEFS {
            for def in counters.iter() {
                matrix.add_counter(threat, CounterEntry::from(def));
            }
        }
        for (category, cards) in CAPABILITY_DEFS {
            for card in cards.iter() {
                matrix.add_capability(card, *category);
            }
        }
        matrix
    }

    pub fn add_counter(&mut self, threat: &str, entry: CounterEntry) {
        let threat = canonical_card_name(threat).to_string();
        if !self.threats.contains_key(&threat) {
            self.threat_order.push(threat.clone());
        }
        let entry = CounterEntry { card: canonical_card_name(&entry.card).to_string(), ..entry };
        self.threats.entry(threat).or_default().push(entry);
    }

    pub fn add_capability(&mut self, card: &str, category: CounterCategory) {
        self.capabilities
            .entry(canonical_card_name(card).to_string())
            .or_default()
            .insert(category);
    }

    pub fn threats(&self) -> &[String] {
        &self.threat_order
    }

    pub fn counters_for_threat(&self, threat: &str) -> Option<&[CounterEntry]> {
        self.threats.get(canonical_card_name(threat)).map(Vec::as_slice)
    }

    /// 反制效果，未知組合為 0
    pub fn counter_effectiveness(&self, threat: &str, card: &str) -> f64 {
        let card = canonical_card_name(card);
        self.counters_for_threat(threat)
            .and_then(|counters| counters.iter().find(|c| c.card == card))
            .map(|c| c.effectiveness)
            .unwrap_or(0.0)
    }

    /// 卡牌能力（依類別排序）
    pub fn card_capabilities(&self, card: &str) -> Vec<CounterCategory> {
        self.capabilities
            .get(canonical_card_name(card))
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn capability_count(&self, card: &str) -> usize {
        self.capabilities.get(canonical_card_name(card)).map(BTreeSet::len).unwrap_or(0)
    }

    pub fn has_capability(&self, card: &str, category: CounterCategory) -> bool {
        self.capabilities
            .get(canonical_card_name(card))
            .map(|set| set.contains(&category))
            .unwrap_or(false)
    }

    /// 具備某能力的所有卡（依名稱排序）
    pub fn cards_with_capability(&self, category: CounterCategory) -> Vec<String> {
        let mut cards: Vec<String> = self
            .capabilities
            .iter()
            .filter(|(_, set)| set.contains(&category))
            .map(|(card, _)| card.clone())
            .collect();
        cards.sort();
        cards
    }

    pub fn count_with_capability(&self, deck: &[String], category: CounterCategory) -> usize {
        deck.iter().filter(|card| self.has_capability(card, category)).count()
    }

    pub fn analyze_threat_coverage(&self, deck: &[String], threat: &str) -> ThreatCoverage {
        let mut coverage = ThreatCoverage { threat: threat.to_string(), ..Default::default() };

        let counters = match self.counters_for_threat(threat) {
            Some(counters) => counters,
            None => {
                coverage.reason = format!("No counter data for threat: {}", threat);
                return coverage;
            }
        };

        let in_deck = |card: &str| deck.iter().any(|d| canonical_card_name(d) == card);

        coverage.deck_counters = counters.iter().filter(|c| in_deck(&c.card)).cloned().collect();
        coverage.missing_counters = counters
            .iter()
            .filter(|c| c.effectiveness >= STRONG_COUNTER_THRESHOLD && !in_deck(&c.card))
            .cloned()
            .collect();
        coverage.can_counter = !coverage.deck_counters.is_empty();

        if coverage.can_counter {
            let total: f64 = coverage.deck_counters.iter().map(|c| c.effectiveness).sum();
            coverage.effectiveness = total / coverage.deck_counters.len() as f64;

            let names = join_counter_names(&coverage.deck_counters);
            coverage.reason = if coverage.effectiveness >= 0.9 {
                format!("Excellent counter: {}", names)
            } else if coverage.effectiveness >= 0.7 {
                format!("Good counter: {}", names)
            } else {
                format!("Weak counter: {}", names)
            };
        } else {
            coverage.reason = format!("No counters to {} in deck", threat);
            if !coverage.missing_counters.is_empty() {
                coverage.suggestion =
                    Some(format!("Consider adding: {}", join_counter_names(&coverage.missing_counters)));
            }
        }

        coverage
    }

    /// 對所有已知威脅逐一分析（依威脅宣告順序）
    pub fn analyze_deck_coverage(&self, deck: &[String]) -> Vec<ThreatCoverage> {
        self.threat_order
            .iter()
            .map(|threat| self.analyze_threat_coverage(deck, threat))
            .collect()
    }
}

fn join_counter_names(counters: &[CounterEntry]) -> String {
    if counters.is_empty() {
        return "none".to_string();
    }
    counters.iter().map(|c| c.card.as_str()).collect::<Vec<_>>().join(", ")
}

// ============================================================================
// 單元測試
// ============================================================================
