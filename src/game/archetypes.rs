//! 牌組原型
//!
//! 八種原型（依宣告順序決定平手時的優先權）及其代表卡，
//! 以及「避開某些原型」的卡牌懲罰計分。

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::cards::canonical_card_name;
use super::constants::ARCHETYPE_AVOIDANCE_PENALTY;
use super::strategy::Strategy;
use crate::service::error::DeckError;

// ============================================================================
// 原型
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    Beatdown,
    Cycle,
    Control,
    Siege,
    BridgeSpam,
    Midrange,
    Spawndeck,
    Bait,
}

impl Archetype {
    pub fn all() -> &'static [Archetype] {
        &[
            Archetype::Beatdown,
            Archetype::Cycle,
            Archetype::Control,
            Archetype::Siege,
            Archetype::BridgeSpam,
            Archetype::Midrange,
            Archetype::Spawndeck,
            Archetype::Bait,
        ]
    }

    pub fn to_index(self) -> usize {
        match self {
            Archetype::Beatdown => 0,
            Archetype::Cycle => 1,
            Archetype::Control => 2,
            Archetype::Siege => 3,
            Archetype::BridgeSpam => 4,
            Archetype::Midrange => 5,
            Archetype::Spawndeck => 6,
            Archetype::Bait => 7,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Archetype::Beatdown => "beatdown",
            Archetype::Cycle => "cycle",
            Archetype::Control => "control",
            Archetype::Siege => "siege",
            Archetype::BridgeSpam => "bridge_spam",
            Archetype::Midrange => "midrange",
            Archetype::Spawndeck => "spawndeck",
            Archetype::Bait => "bait",
        }
    }

    /// 原型代表卡
    pub fn cards(self) -> &'static [&'static str] {
        ARCHETYPE_CARDS[self.to_index()]
    }

    pub fn contains(self, card: &str) -> bool {
        let card = canonical_card_name(card);
        self.cards().iter().any(|c| c.eq_ignore_ascii_case(card))
    }

    /// 與此原型玩法一致的組牌策略
    pub fn matches_strategy(self, strategy: Strategy) -> bool {
        matches!(
            (self, strategy),
            (Archetype::Beatdown, Strategy::Aggro)
                | (Archetype::BridgeSpam, Strategy::Aggro)
                | (Archetype::Cycle, Strategy::Cycle)
                | (Archetype::Bait, Strategy::Cycle)
                | (Archetype::Bait, Strategy::Spell)
                | (Archetype::Control, Strategy::Control)
                | (Archetype::Siege, Strategy::Control)
                | (Archetype::Spawndeck, Strategy::Splash)
                | (Archetype::Midrange, Strategy::Balanced)
        )
    }

    /// 使用者輸入 → 原型（不分大小寫，接受常見別名）
    pub fn parse(input: &str) -> Option<Archetype> {
        let normalized = input.trim().to_lowercase();
        match normalized.as_str() {
            "beatdown" => Some(Archetype::Beatdown),
            "cycle" => Some(Archetype::Cycle),
            "control" => Some(Archetype::Control),
            "siege" => Some(Archetype::Siege),
            "bridge_spam" | "bridgespam" | "bridge spam" => Some(Archetype::BridgeSpam),
            "midrange" | "mid-range" | "mid range" => Some(Archetype::Midrange),
            "spawndeck" | "spawn deck" | "spawn" => Some(Archetype::Spawndeck),
            "bait" | "spell bait" | "spell_bait" => Some(Archetype::Bait),
            _ => None,
        }
    }
}

/// 原型代表卡表（順序與 Archetype 枚舉一致）
pub static ARCHETYPE_CARDS: [&[&str]; 8] = [
    // 0: Beatdown
    &[
        "Golem", "Giant", "Lava Hound", "Electro Giant", "Baby Dragon", "Night Witch",
        "Mega Minion", "Lumberjack", "Lightning", "Tornado", "Arrows",
    ],
    // 1: Cycle
    &[
        "Hog Rider", "Miner", "Skeletons", "Ice Spirit", "Ice Golem", "Cannon", "Musketeer",
        "Log", "Fireball", "Electro Spirit", "Bats",
    ],
    // 2: Control
    &[
        "Inferno Tower", "Cannon", "Bomb Tower", "Tesla", "Valkyrie", "Wizard", "Musketeer",
        "Archers", "Fireball", "Poison", "Log", "Arrows",
    ],
    // 3: Siege
    &[
        "X-Bow", "Mortar", "Tesla", "Cannon", "Archers", "Ice Wizard", "Rocket", "Log",
        "Fireball", "Skeletons", "Ice Spirit",
    ],
    // 4: Bridge Spam
    &[
        "Battle Ram", "Bandit", "Royal Ghost", "P.E.K.K.A", "Mega Knight", "Electro Wizard",
        "Magic Archer", "Poison", "Zap",
    ],
    // 5: Midrange
    &["Hog Rider", "Royal Giant", "Valkyrie", "Musketeer", "Knight", "Fireball", "Zap", "Cannon"],
    // 6: Spawndeck
    &["Goblin Hut", "Barbarian Hut", "Furnace", "Tombstone", "Poison", "Fireball", "Graveyard", "Giant"],
    // 7: Bait
    &[
        "Goblin Barrel", "Princess", "Goblin Gang", "Skeleton Army", "Rocket", "Log", "Zap",
        "Arrows", "Knight", "Ice Spirit", "Inferno Tower",
    ],
];

// ============================================================================
// 原型迴避計分
// ============================================================================

/// 對「要避開的原型」代表卡給予負分
#[derive(Clone, Debug, Default)]
pub struct ArchetypeAvoidanceScorer {
    avoided: BTreeSet<Archetype>,
}

impl ArchetypeAvoidanceScorer {
    /// 無法辨識的原型名稱會被忽略並記錄警告
    pub fn new<S: AsRef<str>>(archetypes: &[S]) -> Self {
        let mut avoided = BTreeSet::new();
        for input in archetypes {
            match Archetype::parse(input.as_ref()) {
                Some(archetype) => {
                    avoided.insert(archetype);
                }
                None => warn!(archetype = input.as_ref(), "ignoring unknown archetype"),
            }
        }
        Self { avoided }
    }

    /// 嚴格版本：任何無法辨識的名稱都是錯誤
    pub fn try_new<S: AsRef<str>>(archetypes: &[S]) -> Result<Self, DeckError> {
        let mut avoided = BTreeSet::new();
        for input in archetypes {
            let archetype = Archetype::parse(input.as_ref())
                .ok_or_else(|| DeckError::UnknownArchetype(input.as_ref().to_string()))?;
            avoided.insert(archetype);
        }
        Ok(Self { avoided })
    }

    pub fn is_enabled(&self) -> bool {
        !self.avoided.is_empty()
    }

    pub fn avoided(&self) -> impl Iterator<Item = Archetype> + '_ {
        self.avoided.iter().copied()
    }

    /// 每個包含此卡的避開原型扣 0.3
    pub fn score_card(&self, card: &str) -> f64 {
        let hits = self.avoided.iter().filter(|a| a.contains(card)).count();
        -(hits as f64) * ARCHETYPE_AVOIDANCE_PENALTY
    }

    /// 牌組平均懲罰
    pub fn score_deck(&self, deck: &[String]) -> f64 {
        if deck.is_empty() || !self.is_enabled() {
            return 0.0;
        }
        let total: f64 = deck.iter().map(|card| self.score_card(card)).sum();
        total / deck.len() as f64
    }
}

// ============================================================================
// 單元測試
// ============================================================================
