//! 協同資料庫
//!
//! 卡牌兩兩協同分數的靜態表，依類別分組，查詢對稱。
//!
//! # 架構
//!
//! - `SYNERGY_DEFS`: 聲明式協同表
//! - `SynergyDatabase`: 以無序鍵預先索引，唯讀、可跨執行緒共享
//! - `SynergyCache`: 單次組牌專用的記憶化快取，每次組牌重新建立

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use super::cards::canonical_card_name;
use super::constants::{MAX_DECK_PAIRS, SYNERGY_SUGGESTION_COUNT, TOP_SYNERGY_COUNT};

// ============================================================================
// 協同類別
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynergyCategory {
    TankSupport,
    Bait,
    SpellCombo,
    WinCondition,
    Defensive,
    Cycle,
    BridgeSpam,
}

impl SynergyCategory {
    pub fn all() -> &'static [SynergyCategory] {
        &[
            SynergyCategory::TankSupport,
            SynergyCategory::Bait,
            SynergyCategory::SpellCombo,
            SynergyCategory::WinCondition,
            SynergyCategory::Defensive,
            SynergyCategory::Cycle,
            SynergyCategory::BridgeSpam,
        ]
    }

    pub fn key(self) -> &'static str {
        match self {
            SynergyCategory::TankSupport => "tank_support",
            SynergyCategory::Bait => "bait",
            SynergyCategory::SpellCombo => "spell_combo",
            SynergyCategory::WinCondition => "win_condition",
            SynergyCategory::Defensive => "defensive",
            SynergyCategory::Cycle => "cycle",
            SynergyCategory::BridgeSpam => "bridge_spam",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            SynergyCategory::TankSupport => "Tank + Support",
            SynergyCategory::Bait => "Spell Bait",
            SynergyCategory::SpellCombo => "Spell Combo",
            SynergyCategory::WinCondition => "Win Condition",
            SynergyCategory::Defensive => "Defensive",
            SynergyCategory::Cycle => "Cycle",
            SynergyCategory::BridgeSpam => "Bridge Spam",
        }
    }
}

// ============================================================================
// 協同定義表
// ============================================================================

/// 協同靜態定義
#[derive(Clone, Copy)]
pub struct SynergyDef {
    pub card1: &'static str,
    pub card2: &'static str,
    pub category: SynergyCategory,
    pub score: f64,
    pub description: &'static str,
}

const fn pair(
    card1: &'static str,
    card2: &'static str,
    category: SynergyCategory,
    score: f64,
    description: &'static str,
) -> SynergyDef {
    SynergyDef { card1, card2, category, score, description }
}

/// 協同定義表
pub static SYNERGY_DEFS: &[SynergyDef] = &[
    pair("Giant", "Witch", SynergyCategory::TankSupport, 0.9, "Witch supports Giant with splash damage and spawns"),
    pair("Giant", "Sparky", SynergyCategory::TankSupport, 0.85, "Giant tanks while Sparky deals massive damage"),
    pair("Giant", "Musketeer", SynergyCategory::TankSupport, 0.8, "Musketeer provides ranged support behind Giant"),
    pair("Giant", "Dark Prince", SynergyCategory::TankSupport, 0.8, "Dark Prince provides splash support and charging damage"),
    pair("Giant", "Mini P.E.K.K.A", SynergyCategory::TankSupport, 0.75, "Mini PEKKA defends then supports Giant counter-push"),
    pair("Golem", "Night Witch", SynergyCategory::TankSupport, 0.95, "Classic Golem beatdown synergy"),
    pair("Golem", "Baby Dragon", SynergyCategory::TankSupport, 0.85, "Baby Dragon provides splash support"),
    pair("Golem", "Lumberjack", SynergyCategory::TankSupport, 0.9, "Lumberjack provides rage and fast clearing"),
    pair("Lava Hound", "Balloon", SynergyCategory::WinCondition, 0.95, "LavaLoon: overwhelming air pressure"),
    pair("Lava Hound", "Miner", SynergyCategory::WinCondition, 0.8, "Miner supports Lava Hound pups"),
    pair("Lava Hound", "Mega Minion", SynergyCategory::TankSupport, 0.85, "Mega Minion provides strong air support"),
    pair("Lava Hound", "Skeleton Dragons", SynergyCategory::TankSupport, 0.8, "Skeleton Dragons provide splash air support"),
    pair("Mega Knight", "Bats", SynergyCategory::TankSupport, 0.75, "Bats provide fast swarm defense"),
    pair("Mega Knight", "Inferno Dragon", SynergyCategory::TankSupport, 0.8, "Inferno Dragon handles tanks while MK defends"),
    pair("Mega Knight", "Minions", SynergyCategory::TankSupport, 0.75, "Minions provide air support for MK"),
    pair("Mega Knight", "Electro Wizard", SynergyCategory::TankSupport, 0.85, "E-Wiz provides reset and ranged support"),
    pair("Mega Knight", "Goblin Gang", SynergyCategory::TankSupport, 0.7, "Goblin Gang provides defensive bait value"),
    pair("Electro Giant", "Tornado", SynergyCategory::TankSupport, 0.9, "Tornado groups enemies for E-Giant zaps"),
    pair("Electro Giant", "Heal Spirit", SynergyCategory::TankSupport, 0.8, "Heal Spirit sustains E-Giant push"),
    pair("Electro Giant", "Mother Witch", SynergyCategory::TankSupport, 0.85, "Mother Witch converts swarms to hogs"),
    pair("Electro Giant", "Dark Prince", SynergyCategory::TankSupport, 0.8, "Dark Prince provides splash and charging support"),
    pair("P.E.K.K.A", "Electro Wizard", SynergyCategory::TankSupport, 0.85, "E-Wiz provides reset and support for PEKKA"),
    pair("P.E.K.K.A", "Magic Archer", SynergyCategory::TankSupport, 0.8, "Magic Archer provides ranged piercing support"),
    pair("P.E.K.K.A", "Dark Prince", SynergyCategory::TankSupport, 0.8, "Dark Prince provides splash support"),
    pair("Goblin Barrel", "Princess", SynergyCategory::Bait, 0.95, "Log bait: Princess baits log for Goblin Barrel"),
    pair("Goblin Barrel", "Goblin Gang", SynergyCategory::Bait, 0.9, "Multiple goblin threats overwhelm spells"),
    pair("Goblin Barrel", "Dart Goblin", SynergyCategory::Bait, 0.85, "Dart Goblin baits small spells"),
    pair("Goblin Barrel", "Skeleton Army", SynergyCategory::Bait, 0.85, "Swarm bait forces spell usage"),
    pair("Goblin Barrel", "Inferno Tower", SynergyCategory::Bait, 0.75, "Building bait punishes spell usage"),
    pair("Skeleton Barrel", "Goblin Barrel", SynergyCategory::Bait, 0.8, "Double barrel pressure"),
    pair("Princess", "Goblin Gang", SynergyCategory::Bait, 0.85, "Log bait pressure"),
    pair("Princess", "Dart Goblin", SynergyCategory::Bait, 0.85, "Dual log bait threats"),
    pair("Graveyard", "Skeleton Army", SynergyCategory::Bait, 0.75, "Skeleton flood overwhelms single spells"),
    pair("Graveyard", "Tombstone", SynergyCategory::Bait, 0.8, "Continuous skeleton pressure"),
    pair("Skeleton Army", "Goblin Gang", SynergyCategory::Bait, 0.8, "Dual swarm bait"),
    pair("Bats", "Minions", SynergyCategory::Bait, 0.75, "Zap bait flying swarms"),
    pair("Spear Goblins", "Goblins", SynergyCategory::Bait, 0.7, "Small spell bait pressure"),
    pair("Goblin Hut", "Furnace", SynergyCategory::Bait, 0.75, "Building spam forces spell usage"),
    pair("X-Bow", "Tesla", SynergyCategory::Bait, 0.9, "Double building bait and defense"),
    pair("Hog Rider", "Fireball", SynergyCategory::SpellCombo, 0.8, "Fireball clears defenders for Hog"),
    pair("Hog Rider", "Earthquake", SynergyCategory::SpellCombo, 0.85, "Earthquake destroys buildings for Hog"),
    pair("Hog Rider", "Freeze", SynergyCategory::SpellCombo, 0.8, "Freeze guarantees Hog tower damage"),
    pair("Tornado", "Fireball", SynergyCategory::SpellCombo, 0.85, "Tornado groups troops for Fireball"),
    pair("Tornado", "Rocket", SynergyCategory::SpellCombo, 0.8, "Tornado + Rocket tower finish"),
    pair("Tornado", "Executioner", SynergyCategory::SpellCombo, 0.9, "Tornado pulls troops into Executioner's axe"),
    pair("Tornado", "Bowler", SynergyCategory::SpellCombo, 0.8, "Tornado + Bowler knockback combo"),
    pair("Tornado", "Ice Wizard", SynergyCategory::SpellCombo, 0.8, "Tornado groups for Ice Wizard slow"),
    pair("Tornado", "Baby Dragon", SynergyCategory::SpellCombo, 0.8, "Tornado pulls troops for Baby Dragon splash"),
    pair("Graveyard", "Freeze", SynergyCategory::SpellCombo, 0.9, "Freeze allows Graveyard skeletons to connect"),
    pair("Graveyard", "Poison", SynergyCategory::SpellCombo, 0.85, "Poison clears small troops from Graveyard"),
    pair("Poison", "Miner", SynergyCategory::SpellCombo, 0.85, "Poison + Miner chip damage combo"),
    pair("Earthquake", "Royal Giant", SynergyCategory::SpellCombo, 0.85, "Earthquake removes buildings for RG"),
    pair("Earthquake", "Miner", SynergyCategory::SpellCombo, 0.8, "Earthquake clears buildings for Miner"),
    pair("Freeze", "Balloon", SynergyCategory::SpellCombo, 0.9, "Freeze guarantees Balloon connection"),
    pair("Rage", "Lumberjack", SynergyCategory::SpellCombo, 0.85, "Double rage acceleration"),
    pair("Rage", "Balloon", SynergyCategory::SpellCombo, 0.85, "Rage accelerates Balloon to tower"),
    pair("Rage", "Elite Barbarians", SynergyCategory::SpellCombo, 0.8, "Rage boosts E-Barbs speed and DPS"),
    pair("P.E.K.K.A", "Battle Ram", SynergyCategory::BridgeSpam, 0.85, "PEKKA Bridge Spam pressure"),
    pair("P.E.K.K.A", "Bandit", SynergyCategory::BridgeSpam, 0.8, "Bandit supports PEKKA counterpush"),
    pair("Battle Ram", "Bandit", SynergyCategory::BridgeSpam, 0.8, "Fast dual-lane pressure"),
    pair("Battle Ram", "Minions", SynergyCategory::BridgeSpam, 0.75, "Air support for Battle Ram push"),
    pair("Battle Ram", "Dark Prince", SynergyCategory::BridgeSpam, 0.85, "Dual charge pressure"),
    pair("Bandit", "Royal Ghost", SynergyCategory::BridgeSpam, 0.75, "Invisible bridge spam"),
    pair("Bandit", "Magic Archer", SynergyCategory::BridgeSpam, 0.75, "Bandit dash with Magic Archer support"),
    pair("Bandit", "Electro Wizard", SynergyCategory::BridgeSpam, 0.75, "E-Wiz support for Bandit"),
    pair("Royal Ghost", "Dark Prince", SynergyCategory::BridgeSpam, 0.75, "Dual invisible pressure"),
    pair("Royal Ghost", "Minions", SynergyCategory::BridgeSpam, 0.7, "Air support for Ghost push"),
    pair("Lumberjack", "Balloon", SynergyCategory::BridgeSpam, 0.95, "LumberLoon: Rage boost for Balloon"),
    pair("Cannon", "Ice Spirit", SynergyCategory::Defensive, 0.8, "Cheap defensive combo"),
    pair("Cannon", "Knight", SynergyCategory::Defensive, 0.8, "Knight + Cannon cheap defense"),
    pair("Tesla", "Ice Spirit", SynergyCategory::Defensive, 0.75, "Tesla + Ice Spirit kiting"),
    pair("Tesla", "Tornado", SynergyCategory::Defensive, 0.85, "Tornado pulls troops to Tesla"),
    pair("Inferno Tower", "Zap", SynergyCategory::Defensive, 0.85, "Zap resets for Inferno Tower"),
    pair("Inferno Tower", "Tornado", SynergyCategory::Defensive, 0.9, "Tornado pulls tanks to Inferno"),
    pair("Inferno Dragon", "Zap", SynergyCategory::Defensive, 0.8, "Zap protects Inferno Dragon beam"),
    pair("Bomb Tower", "Valkyrie", SynergyCategory::Defensive, 0.75, "Dual splash defensive combo"),
    pair("Goblin Cage", "Guards", SynergyCategory::Defensive, 0.7, "Defensive troops chain"),
    pair("Mega Minion", "Bats", SynergyCategory::Defensive, 0.75, "Air defense combo"),
    pair("Musketeer", "Ice Spirit", SynergyCategory::Defensive, 0.75, "Musketeer + freeze for air defense"),
    pair("Hunter", "Tornado", SynergyCategory::Defensive, 0.85, "Tornado groups for Hunter burst"),
    pair("Electro Wizard", "Mega Minion", SynergyCategory::Defensive, 0.75, "E-Wiz reset + air defense"),
    pair("Ice Spirit", "Skeletons", SynergyCategory::Cycle, 0.85, "Ultra-cheap cycle combo"),
    pair("Ice Spirit", "Fire Spirit", SynergyCategory::Cycle, 0.8, "Cheap spirit cycle"),
    pair("Ice Spirit", "Spear Goblins", SynergyCategory::Cycle, 0.75, "Fast cycle defensive combo"),
    pair("Ice Spirit", "Bats", SynergyCategory::Cycle, 0.75, "Ultra-cheap air cycle"),
    pair("Ice Spirit", "Log", SynergyCategory::Cycle, 0.8, "Cheap cycle and control"),
    pair("Skeletons", "Goblins", SynergyCategory::Cycle, 0.8, "Fast cycle swarm combo"),
    pair("Skeletons", "Ice Golem", SynergyCategory::Cycle, 0.8, "Cheap cycle tank"),
    pair("Skeletons", "Log", SynergyCategory::Cycle, 0.75, "Cycle and clear combo"),
    pair("Fire Spirit", "Heal Spirit", SynergyCategory::Cycle, 0.75, "Dual spirit cycle"),
    pair("Fire Spirit", "Goblins", SynergyCategory::Cycle, 0.7, "Fast rotation combo"),
    pair("Heal Spirit", "Skeletons", SynergyCategory::Cycle, 0.75, "Ultra-fast cycle"),
    pair("Hog Rider", "Valkyrie", SynergyCategory::WinCondition, 0.8, "Valkyrie tanks and clears for Hog"),
    pair("Hog Rider", "Ice Golem", SynergyCategory::WinCondition, 0.8, "Ice Golem kites and tanks for Hog"),
    pair("Hog Rider", "Musketeer", SynergyCategory::WinCondition, 0.75, "Musketeer supports Hog push"),
    pair("Royal Giant", "Fisherman", SynergyCategory::WinCondition, 0.85, "Fisherman activates King Tower for RG"),
    pair("Royal Giant", "Lightning", SynergyCategory::WinCondition, 0.9, "Lightning clears defensive buildings"),
    pair("Royal Giant", "Hunter", SynergyCategory::WinCondition, 0.75, "Hunter provides defensive synergy"),
    pair("X-Bow", "Archers", SynergyCategory::WinCondition, 0.8, "Archers defend X-Bow"),
    pair("X-Bow", "Ice Golem", SynergyCategory::WinCondition, 0.8, "Ice Golem kites for X-Bow defense"),
    pair("Mortar", "Cannon", SynergyCategory::WinCondition, 0.85, "Mortar + defensive building"),
    pair("Mortar", "Knight", SynergyCategory::WinCondition, 0.8, "Knight tanks and defends for Mortar"),
    pair("Mortar", "Archers", SynergyCategory::WinCondition, 0.75, "Archers support Mortar defense"),
    pair("Mortar", "Skeletons", SynergyCategory::WinCondition, 0.7, "Skeletons cycle and defend"),
    pair("Miner", "Balloon", SynergyCategory::WinCondition, 0.9, "Miner tanks for Balloon"),
    pair("Miner", "Goblin Barrel", SynergyCategory::WinCondition, 0.75, "Dual win condition pressure"),
    pair("Miner", "Wall Breakers", SynergyCategory::WinCondition, 0.8, "Dual tower pressure"),
    pair("Miner", "Skeleton Barrel", SynergyCategory::WinCondition, 0.75, "Dual air pressure"),
    pair("Ram Rider", "P.E.K.K.A", SynergyCategory::WinCondition, 0.8, "PEKKA supports Ram Rider push"),
    pair("Ram Rider", "Mega Knight", SynergyCategory::WinCondition, 0.75, "MK defends then Ram counterpush"),
    pair("Royal Hogs", "Earthquake", SynergyCategory::WinCondition, 0.85, "Earthquake clears buildings for Royal Hogs"),
    pair("Royal Hogs", "Fisherman", SynergyCategory::WinCondition, 0.75, "Fisherman pulls defenders away"),
    pair("Wall Breakers", "Giant", SynergyCategory::WinCondition, 0.75, "Dual tower threat pressure"),
    pair("Sparky", "Goblin Giant", SynergyCategory::WinCondition, 0.9, "Goblin Giant tanks with spear support"),
    pair("Sparky", "Tornado", SynergyCategory::WinCondition, 0.85, "Tornado groups enemies for Sparky"),
    pair("Three Musketeers", "Battle Ram", SynergyCategory::WinCondition, 0.9, "3M split with Battle Ram pressure"),
    pair("Three Musketeers", "Ice Golem", SynergyCategory::WinCondition, 0.8, "Ice Golem tanks for 3M split"),
];

// ============================================================================
// 協同資料庫
// ============================================================================

/// 兩張卡之間的無序協同關係
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynergyPair {
    pub card1: String,
    pub card2: String,
    pub category: SynergyCategory,
    pub score: f64,
    pub description: String,
}

impl SynergyPair {
    pub fn new(card1: &str, card2: &str, category: SynergyCategory, score: f64, description: &str) -> Self {
        Self {
            card1: canonical_card_name(card1).to_string(),
            card2: canonical_card_name(card2).to_string(),
            category,
            score: score.clamp(0.0, 1.0),
            description: description.to_string(),
        }
    }

    /// 另一張卡（`card` 不在此配對中時回傳 None）
    pub fn partner(&self, card: &str) -> Option<&str> {
        if self.card1 == card {
            Some(&self.card2)
        } else if self.card2 == card {
            Some(&self.card1)
        } else {
            None
        }
    }
}

impl From<&SynergyDef> for SynergyPair {
    fn from(def: &SynergyDef) -> Self {
        SynergyPair::new(def.card1, def.card2, def.category, def.score, def.description)
    }
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// 協同資料庫（唯讀）
#[derive(Clone, Debug)]
pub struct SynergyDatabase {
    pairs: Vec<SynergyPair>,
    index: HashMap<(String, String), usize>,
}

impl Default for SynergyDatabase {
    fn default() -> Self {
        Self::new()
    }
}

impl SynergyDatabase {
    /// 內建協同表
    pub fn new() -> Self {
        Self::from_pairs(SYNERGY_DEFS.iter().map(SynergyPair::from).collect())
    }

    /// 自訂協同表；自我配對會被捨棄，重複配對以先出現者為準
    pub fn from_pairs(pairs: Vec<SynergyPair>) -> Self {
        let mut kept = Vec::with_capacity(pairs.len());
        let mut index = HashMap::with_capacity(pairs.len());
        for p in pairs {
            if p.card1 == p.card2 {
                continue;
            }
            let key = pair_key(&p.card1, &p.card2);
            if index.contains_key(&key) {
                continue;
            }
            index.insert(key, kept.len());
            kept.push(p);
        }
        Self { pairs: kept, index }
    }

    pub fn pairs(&self) -> &[SynergyPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get_pair(&self, a: &str, b: &str) -> Option<&SynergyPair> {
        let (a, b) = (canonical_card_name(a), canonical_card_name(b));
        if a == b {
            return None;
        }
        self.index.get(&pair_key(a, b)).map(|&i| &self.pairs[i])
    }

    /// 對稱查詢；未知配對或同一張卡回傳 0
    pub fn get_synergy(&self, a: &str, b: &str) -> f64 {
        self.get_pair(a, b).map(|p| p.score).unwrap_or(0.0)
    }

    /// 依類別分組
    pub fn categories(&self) -> BTreeMap<SynergyCategory, Vec<&SynergyPair>> {
        let mut groups: BTreeMap<SynergyCategory, Vec<&SynergyPair>> = BTreeMap::new();
        for p in &self.pairs {
            groups.entry(p.category).or_default().push(p);
        }
        groups
    }

    /// 牌組協同分析
    pub fn analyze_deck_synergy(&self, deck: &[String]) -> DeckSynergyAnalysis {
        let mut found: Vec<SynergyPair> = Vec::new();
        let mut has_synergy = vec![false; deck.len()];
        let mut category_scores = BTreeMap::new();
        let mut total = 0.0;

        for i in 0..deck.len() {
            for j in (i + 1)..deck.len() {
                if let Some(p) = self.get_pair(&deck[i], &deck[j]) {
                    total += p.score;
                    has_synergy[i] = true;
                    has_synergy[j] = true;
                    *category_scores.entry(p.category).or_insert(0) += 1;
                    found.push(p.clone());
                }
            }
        }

        let average_score = if found.is_empty() { 0.0 } else { total / found.len() as f64 };
        let missing_synergies = deck
            .iter()
            .zip(&has_synergy)
            .filter(|(_, &has)| !has)
            .map(|(name, _)| name.clone())
            .collect();

        // 穩定排序：同分保留出現順序
        found.sort_by(|a, b| b.score.total_cmp(&a.score));
        found.truncate(TOP_SYNERGY_COUNT);

        DeckSynergyAnalysis {
            total_score: (total / MAX_DECK_PAIRS as f64 * 100.0).min(100.0),
            average_score,
            top_synergies: found,
            missing_synergies,
            category_scores,
        }
    }

    /// 推薦與目前牌組協同最高的卡（依平均協同排序，取前 10）
    pub fn suggest_synergy_cards(&self, deck: &[String], available: &[String]) -> Vec<SynergyRecommendation> {
        if deck.is_empty() || available.is_empty() {
            return Vec::new();
        }

        let mut result: Vec<SynergyRecommendation> = Vec::new();
        for candidate in available {
            if deck.contains(candidate) || result.iter().any(|r| &r.card_name == candidate) {
                continue;
            }
            let synergies: Vec<SynergyPair> = deck
                .iter()
                .filter_map(|d| self.get_pair(candidate, d))
                .cloned()
                .collect();
            if synergies.is_empty() {
                continue;
            }

            let avg = synergies.iter().map(|p| p.score).sum::<f64>() / synergies.len() as f64;
            let reason = if synergies.len() >= 3 {
                let partners: Vec<&str> = synergies.iter().filter_map(|p| p.partner(candidate)).collect();
                format!("Strong synergies with {} cards: {}", synergies.len(), partners.join(", "))
            } else {
                format!("Synergizes with {} cards in your deck", synergies.len())
            };

            result.push(SynergyRecommendation {
                card_name: candidate.clone(),
                synergy_score: avg,
                synergies,
                reason,
            });
        }

        result.sort_by(|a, b| {
            b.synergy_score
                .total_cmp(&a.synergy_score)
                .then_with(|| a.card_name.cmp(&b.card_name))
        });
        result.truncate(SYNERGY_SUGGESTION_COUNT);
        result
    }
}

// ============================================================================
// 分析結果
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DeckSynergyAnalysis {
    /// 0 ~ 100，以 28 對 × 1.0 為理論上限
    pub total_score: f64,
    pub average_score: f64,
    pub top_synergies: Vec<SynergyPair>,
    /// 沒有任何協同的卡
    pub missing_synergies: Vec<String>,
    pub category_scores: BTreeMap<SynergyCategory, usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SynergyRecommendation {
    pub card_name: String,
    pub synergy_score: f64,
    pub synergies: Vec<SynergyPair>,
    pub reason: String,
}

// ============================================================================
// 單次組牌快取
// ============================================================================

/// 協同查詢記憶化快取。每次組牌建立新實例，不跨組牌或執行緒共用。
pub struct SynergyCache<'a> {
    db: &'a SynergyDatabase,
    memo: HashMap<(String, String), f64>,
}

impl<'a> SynergyCache<'a> {
    pub fn new(db: &'a SynergyDatabase) -> Self {
        Self { db, memo: HashMap::new() }
    }

    pub fn get(&mut self, a: &str, b: &str) -> f64 {
        let key = pair_key(a, b);
        if let Some(&score) = self.memo.get(&key) {
            return score;
        }
        let score = self.db.get_synergy(a, b);
        self.memo.insert(key, score);
        score
    }

    /// 與牌組中各卡協同的總和
    pub fn sum_with(&mut self, card: &str, deck: &[String]) -> f64 {
        deck.iter().map(|d| self.get(card, d)).sum()
    }

    /// 與牌組中各卡協同的平均值
    pub fn average_with(&mut self, card: &str, deck: &[String]) -> f64 {
        let others: Vec<&String> = deck.iter().filter(|d| d.as_str() != card).collect();
        if others.is_empty() {
            return 0.0;
        }
        let total: f64 = others.iter().map(|d| self.get(card, d)).sum();
        total / others.len() as f64
    }

    pub fn len(&self) -> usize {
        self.memo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn deck(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_get_synergy_symmetric() {
        let db = SynergyDatabase::new();
        assert_eq!(db.get_synergy("Giant", "Witch"), 0.9);
        assert_eq!(db.get_synergy("Witch", "Giant"), 0.9);
        assert_eq!(db.get_synergy("Giant", "Giant"), 0.0);
        assert_eq!(db.get_synergy("Giant", "Not A Card"), 0.0);
        // 別名經正規化
        assert_eq!(db.get_synergy("Skeletons", "The Log"), db.get_synergy("Skeletons", "Log"));
    }

    #[test]
    fn test_self_pair_rejected() {
        let db = SynergyDatabase::from_pairs(vec![
            SynergyPair::new("Knight", "Knight", SynergyCategory::Cycle, 1.0, "invalid"),
            SynergyPair::new("Knight", "Archers", SynergyCategory::Defensive, 0.5, "ok"),
            SynergyPair::new("Archers", "Knight", SynergyCategory::Defensive, 0.9, "duplicate"),
        ]);
        assert_eq!(db.len(), 1);
        assert_eq!(db.get_synergy("Knight", "Knight"), 0.0);
        assert_eq!(db.get_synergy("Archers", "Knight"), 0.5);
    }

    #[test]
    fn test_analyze_empty_deck() {
        let db = SynergyDatabase::new();
        let analysis = db.analyze_deck_synergy(&[]);
        assert_eq!(analysis.total_score, 0.0);
        assert!(analysis.top_synergies.is_empty());
        assert!(analysis.missing_synergies.is_empty());
    }

    #[test]
    fn test_analyze_deck() {
        let db = SynergyDatabase::new();
        let d = deck(&["Giant", "Witch", "Musketeer", "Sparky", "Knight", "Zap", "Fireball", "Archers"]);
        let analysis = db.analyze_deck_synergy(&d);
        assert!(analysis.total_score > 0.0 && analysis.total_score <= 100.0);
        assert!(analysis.top_synergies.len() <= 5);
        assert_eq!(analysis.top_synergies[0].score, 0.9);
        for w in analysis.top_synergies.windows(2) {
            assert!(w[0].score >= w[1].score);
        }
        assert!(analysis.category_scores.get(&SynergyCategory::TankSupport).copied().unwrap_or(0) >= 3);
    }

    #[test]
    fn test_suggest_synergy_cards() {
        let db = SynergyDatabase::new();
        let d = deck(&["Giant"]);
        let available = deck(&["Witch", "Giant", "Knight", "Sparky"]);
        let recs = db.suggest_synergy_cards(&d, &available);
        assert_eq!(recs[0].card_name, "Witch");
        assert!(recs.iter().all(|r| r.card_name != "Giant"));
        assert_eq!(recs[0].reason, "Synergizes with 1 cards in your deck");
        assert!(db.suggest_synergy_cards(&[], &available).is_empty());
    }

    #[test]
    fn test_synergy_cache() {
        let db = SynergyDatabase::new();
        let mut cache = SynergyCache::new(&db);
        assert!(cache.is_empty());
        assert_eq!(cache.get("Witch", "Giant"), 0.9);
        assert_eq!(cache.get("Giant", "Witch"), 0.9);
        assert_eq!(cache.len(), 1);
        let avg = cache.average_with("Giant", &deck(&["Giant", "Witch", "Knight"]));
        assert!((avg - 0.45).abs() < 1e-9);
    }

    #[test]
    fn test_table_valid() {
        for def in SYNERGY_DEFS {
            assert_ne!(def.card1, def.card2);
            assert!((0.0..=1.0).contains(&def.score));
        }
        assert!(SynergyDatabase::new().categories().len() == SynergyCategory::all().len());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_synergy_symmetric(i in 0usize..SYNERGY_DEFS.len(), j in 0usize..SYNERGY_DEFS.len()) {
                let db = SynergyDatabase::new();
                let a = SYNERGY_DEFS[i].card1;
                let b = SYNERGY_DEFS[j].card2;
                prop_assert_eq!(db.get_synergy(a, b), db.get_synergy(b, a));
                prop_assert_eq!(db.get_synergy(a, a), 0.0);
            }
        }
    }
}
