//! 牌組一致性評分
//!
//! 偵測主要原型，記錄反協同、組成、聖水與缺卡等違規，
//! 從 0.8 起算扣分，策略與原型一致時加分，最後夾在 [0, 1]。

use serde::{Deserialize, Serialize};

use super::archetypes::Archetype;
use super::cards::{CardCandidate, Role};
use super::constants::BASE_COHERENCE;
use super::strategy::Strategy;

// ============================================================================
// 規則表
// ============================================================================

/// 兩組卡同時出現即違規
#[derive(Clone, Copy, Debug)]
pub struct AntiSynergyRule {
    pub name: &'static str,
    pub cards_a: &'static [&'static str],
    pub cards_b: &'static [&'static str],
    pub penalty: f64,
    pub reason: &'static str,
}

pub static ANTI_SYNERGY_RULES: &[AntiSynergyRule] = &[
    AntiSynergyRule {
        name: "Beatdown + Cycle",
        cards_a: &["Golem", "Lava Hound", "Electro Giant"],
        cards_b: &["Hog Rider"],
        penalty: 0.30,
        reason: "Slow beatdown win conditions conflict with fast cycle pacing",
    },
    AntiSynergyRule {
        name: "Siege + Beatdown",
        cards_a: &["X-Bow", "Mortar"],
        cards_b: &["Golem", "Giant", "Lava Hound", "Electro Giant"],
        penalty: 0.30,
        reason: "Siege and beatdown win conditions pull the deck in opposite directions",
    },
];

const TOO_MANY_BUILDINGS: usize = 2;
const TOO_MANY_SPELLS: usize = 4;
const BUILDINGS_PENALTY: f64 = 0.20;
const SPELLS_PENALTY: f64 = 0.20;
const NO_WIN_CONDITION_PENALTY: f64 = 0.40;
const ELIXIR_MISMATCH_PENALTY: f64 = 0.10;
const MISSING_CORE_PENALTY: f64 = 0.10;
const MIN_CORE_CARDS: usize = 3;
const ARCHETYPE_CORE_BONUS: f64 = 0.05;
const STRATEGY_ALIGNMENT_BONUS: f64 = 0.05;

// ============================================================================
// 結果
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    AntiSynergy,
    Composition,
    Elixir,
    MissingCards,
}

impl ViolationKind {
    pub fn key(self) -> &'static str {
        match self {
            ViolationKind::AntiSynergy => "anti_synergy",
            ViolationKind::Composition => "composition",
            ViolationKind::Elixir => "elixir",
            ViolationKind::MissingCards => "missing_cards",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    /// 嚴重度，同時也是扣分值
    pub severity: f64,
    pub message: String,
    pub cards: Vec<String>,
}

impl Violation {
    fn new(kind: ViolationKind, severity: f64, message: impl Into<String>) -> Self {
        Self { kind, severity, message: message.into(), cards: Vec::new() }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoherenceBonus {
    pub kind: String,
    pub bonus: f64,
    pub message: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CoherenceResult {
    pub primary_archetype: Option<Archetype>,
    /// 主要原型命中卡數 / 牌組張數
    pub archetype_confidence: f64,
    pub coherence_score: f64,

    pub average_elixir: f64,
    pub elixir_variance: f64,
    pub elixir_match: bool,

    pub violations: Vec<Violation>,
    pub bonuses: Vec<CoherenceBonus>,

    pub win_condition_count: usize,
    pub building_count: usize,
    pub spell_count: usize,
    pub support_count: usize,
    pub cycle_card_count: usize,
    pub bait_card_count: usize,
    /// 每個原型的命中數（依 `Archetype::to_index` 排列）
    pub archetype_matches: [usize; 8],
}

/// 角色統計（V2 評分共用）
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoleTally {
    pub win_conditions: usize,
    pub buildings: usize,
    pub spells: usize,
    pub support: usize,
    pub cycle: usize,
}

impl RoleTally {
    pub fn from_cards(cards: &[CardCandidate]) -> Self {
        let mut tally = Self::default();
        for role in cards.iter().filter_map(|c| c.role) {
            match role {
                Role::WinCondition => tally.win_conditions += 1,
                Role::Building => tally.buildings += 1,
                Role::SpellBig | Role::SpellSmall => tally.spells += 1,
                Role::Support => tally.support += 1,
                Role::Cycle => tally.cycle += 1,
            }
        }
        tally
    }
}

// ============================================================================
// 規則檢查（V2 評分共用）
// ============================================================================

/// 反協同違規
pub fn anti_synergy_violations(rules: &[AntiSynergyRule], names: &[&str]) -> Vec<Violation> {
    let present = |group: &[&str]| -> Vec<String> {
        group.iter().filter(|card| names.contains(*card)).map(|card| card.to_string()).collect()
    };

    let mut violations = Vec::new();
    for rule in rules {
        let cards_a = present(rule.cards_a);
        let cards_b = present(rule.cards_b);
        if cards_a.is_empty() || cards_b.is_empty() {
            continue;
        }
        let mut violation = Violation::new(ViolationKind::AntiSynergy, rule.penalty, rule.reason);
        violation.cards = cards_a.into_iter().chain(cards_b).collect();
        violations.push(violation);
    }
    violations
}

/// 組成違規：建築過多、法術過多、沒有勝利條件
pub fn composition_violations(tally: &RoleTally) -> Vec<Violation> {
    let mut violations = Vec::new();
    if tally.buildings > TOO_MANY_BUILDINGS {
        violations.push(Violation::new(
            ViolationKind::Composition,
            BUILDINGS_PENALTY,
            "More than 2 buildings makes deck too passive",
        ));
    }
    if tally.spells > TOO_MANY_SPELLS {
        violations.push(Violation::new(
            ViolationKind::Composition,
            SPELLS_PENALTY,
            "More than 4 spells leaves too few troops",
        ));
    }
    if tally.win_conditions == 0 {
        violations.push(Violation::new(
            ViolationKind::Composition,
            NO_WIN_CONDITION_PENALTY,
            "Deck needs a clear tower-damage win condition",
        ));
    }
    violations
}

/// 各原型命中數；主要原型取命中最多者，平手取宣告順序較前者
pub fn detect_archetype(names: &[&str]) -> ([usize; 8], Option<Archetype>) {
    let mut matches = [0usize; 8];
    for &archetype in Archetype::all() {
        matches[archetype.to_index()] = names.iter().filter(|n| archetype.contains(n)).count();
    }

    let mut primary: Option<Archetype> = None;
    for &archetype in Archetype::all() {
        let count = matches[archetype.to_index()];
        let best = primary.map(|p| matches[p.to_index()]).unwrap_or(0);
        if count > best {
            primary = Some(archetype);
        }
    }
    (matches, primary)
}

// ============================================================================
// 一致性評分器
// ============================================================================

#[derive(Clone, Copy, Debug)]
pub struct CoherenceScorer {
    rules: &'static [AntiSynergyRule],
}

impl Default for CoherenceScorer {
    fn default() -> Self {
        Self { rules: ANTI_SYNERGY_RULES }
    }
}

impl CoherenceScorer {
    pub fn new(rules: &'static [AntiSynergyRule]) -> Self {
        Self { rules }
    }

    pub fn analyze(&self, cards: &[CardCandidate], strategy: Strategy) -> CoherenceResult {
        if cards.is_empty() {
            return CoherenceResult::default();
        }

        let names: Vec<&str> = cards.iter().map(|c| c.name.as_str()).collect();
        let tally = RoleTally::from_cards(cards);
        let (matches, primary) = detect_archetype(&names);

        let mut result = CoherenceResult {
            primary_archetype: primary,
            archetype_confidence: primary
                .map(|p| matches[p.to_index()] as f64 / cards.len() as f64)
                .unwrap_or(0.0),
            win_condition_count: tally.win_conditions,
            building_count: tally.buildings,
            spell_count: tally.spells,
            support_count: tally.support,
            cycle_card_count: tally.cycle,
            bait_card_count: matches[Archetype::Bait.to_index()],
            archetype_matches: matches,
            ..Default::default()
        };

        result.violations.extend(anti_synergy_violations(self.rules, &names));
        result.violations.extend(composition_violations(&tally));

        if let Some(archetype) = primary {
            self.check_archetype_core(archetype, &tally, matches[archetype.to_index()], &mut result);
            if archetype.matches_strategy(strategy) {
                result.bonuses.push(CoherenceBonus {
                    kind: "strategy_alignment".to_string(),
                    bonus: STRATEGY_ALIGNMENT_BONUS,
                    message: format!("{} strategy fits {} archetype", strategy.name(), archetype.key()),
                });
            }
        }

        self.check_elixir(cards, strategy, &mut result);

        let penalties: f64 = result.violations.iter().map(|v| v.severity).sum();
        let bonuses: f64 = result.bonuses.iter().map(|b| b.bonus).sum();
        result.coherence_score = (BASE_COHERENCE - penalties + bonuses).clamp(0.0, 1.0);
        result
    }

    pub fn score(&self, cards: &[CardCandidate], strategy: Strategy) -> f64 {
        self.analyze(cards, strategy).coherence_score
    }

    fn check_archetype_core(
        &self,
        archetype: Archetype,
        tally: &RoleTally,
        core_cards: usize,
        result: &mut CoherenceResult,
    ) {
        if core_cards < MIN_CORE_CARDS {
            result.violations.push(Violation::new(
                ViolationKind::MissingCards,
                MISSING_CORE_PENALTY,
                format!("{} archetype needs at least {} core cards, has {}", archetype.key(), MIN_CORE_CARDS, core_cards),
            ));
        }
        if tally.win_conditions >= 1 && tally.support >= 2 {
            result.bonuses.push(CoherenceBonus {
                kind: "archetype_core".to_string(),
                bonus: ARCHETYPE_CORE_BONUS,
                message: format!("Solid {} core established", archetype.key()),
            });
        }
    }

    fn check_elixir(&self, cards: &[CardCandidate], strategy: Strategy, result: &mut CoherenceResult) {
        let n = cards.len() as f64;
        let average = cards.iter().map(|c| c.elixir as f64).sum::<f64>() / n;
        let variance = cards.iter().map(|c| (c.elixir as f64 - average).powi(2)).sum::<f64>() / n;
        result.average_elixir = average;
        result.elixir_variance = variance;

        let profile = strategy.def().elixir_profile;
        result.elixir_match = average >= profile.min && average <= profile.max;
        if !result.elixir_match {
            result.violations.push(Violation::new(
                ViolationKind::Elixir,
                ELIXIR_MISMATCH_PENALTY,
                format!(
                    "Average elixir {:.1} doesn't match {} strategy (target: {:.1}-{:.1})",
                    average,
                    strategy.name(),
                    profile.min,
                    profile.max
                ),
            ));
        }
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::Rarity;

    fn card(name: &str, elixir: u32, role: Role) -> CardCandidate {
        CardCandidate::new(name, 11, 14, Rarity::Common, elixir, Some(role))
    }

    fn hog_cycle() -> Vec<CardCandidate> {
        vec![
            card("Hog Rider", 4, Role::WinCondition),
            card("Musketeer", 4, Role::Support),
            card("Ice Golem", 2, Role::Support),
            card("Cannon", 3, Role::Building),
            card("Skeletons", 1, Role::Cycle),
            card("Ice Spirit", 1, Role::Cycle),
            card("Fireball", 4, Role::SpellBig),
            card("Log", 2, Role::SpellSmall),
        ]
    }

    #[test]
    fn test_hog_cycle_is_coherent() {
        let result = CoherenceScorer::default().analyze(&hog_cycle(), Strategy::Cycle);
        assert_eq!(result.primary_archetype, Some(Archetype::Cycle));
        assert!(result.coherence_score >= 0.7, "score {}", result.coherence_score);
        assert!(result.cycle_card_count >= 2);
        assert!(result.average_elixir >= 2.4 && result.average_elixir <= 3.2);
        assert!(result.violations.iter().all(|v| v.severity <= 0.2));
        assert!(result.elixir_match);
    }

    #[test]
    fn test_beatdown_plus_cycle_penalized() {
        let cards = vec![
            card("Golem", 8, Role::WinCondition),
            card("Hog Rider", 4, Role::WinCondition),
            card("Night Witch", 4, Role::Support),
            card("Baby Dragon", 4, Role::Support),
            card("Skeletons", 1, Role::Cycle),
            card("Ice Spirit", 1, Role::Cycle),
            card("Lightning", 6, Role::SpellBig),
            card("Tombstone", 3, Role::Building),
        ];
        let result = CoherenceScorer::default().analyze(&cards, Strategy::Balanced);
        assert!(result
            .violations
            .iter()
            .any(|v| v.kind == ViolationKind::AntiSynergy && v.severity >= 0.25));
        assert!(result.coherence_score <= 0.7, "score {}", result.coherence_score);
    }

    #[test]
    fn test_siege_vs_beatdown() {
        let cards = vec![
            card("X-Bow", 6, Role::WinCondition),
            card("Golem", 8, Role::WinCondition),
            card("Tesla", 4, Role::Building),
            card("Night Witch", 4, Role::Support),
            card("Skeletons", 1, Role::Cycle),
            card("Ice Spirit", 1, Role::Cycle),
            card("Fireball", 4, Role::SpellBig),
            card("Log", 2, Role::SpellSmall),
        ];
        let result = CoherenceScorer::default().analyze(&cards, Strategy::Balanced);
        let conflict = result
            .violations
            .iter()
            .find(|v| v.kind == ViolationKind::AntiSynergy)
            .expect("siege + beatdown violation");
        assert!(conflict.cards.contains(&"X-Bow".to_string()));
        assert!(conflict.cards.contains(&"Golem".to_string()));
    }

    #[test]
    fn test_too_many_buildings() {
        let cards = vec![
            card("X-Bow", 6, Role::WinCondition),
            card("Tesla", 4, Role::Building),
            card("Cannon", 3, Role::Building),
            card("Bomb Tower", 4, Role::Building),
            card("Furnace", 4, Role::Building),
            card("Skeletons", 1, Role::Cycle),
            card("Fireball", 4, Role::SpellBig),
            card("Log", 2, Role::SpellSmall),
        ];
        let result = CoherenceScorer::default().analyze(&cards, Strategy::Balanced);
        assert_eq!(result.building_count, 4);
        assert!(result.violations.iter().any(|v| v.kind == ViolationKind::Composition
            && v.message == "More than 2 buildings makes deck too passive"));
    }

    #[test]
    fn test_no_win_condition() {
        let cards = vec![
            card("Knight", 3, Role::Support),
            card("Valkyrie", 4, Role::Support),
            card("Baby Dragon", 4, Role::Support),
            card("Musketeer", 4, Role::Support),
            card("Skeletons", 1, Role::Cycle),
            card("Ice Spirit", 1, Role::Cycle),
            card("Fireball", 4, Role::SpellBig),
            card("Log", 2, Role::SpellSmall),
        ];
        let result = CoherenceScorer::default().analyze(&cards, Strategy::Balanced);
        assert!(result.violations.iter().any(|v| v.kind == ViolationKind::Composition
            && v.message == "Deck needs a clear tower-damage win condition"
            && (v.severity - 0.4).abs() < 1e-9));
    }

    #[test]
    fn test_bait_deck() {
        let cards = vec![
            card("Goblin Barrel", 3, Role::WinCondition),
            card("Princess", 3, Role::Support),
            card("Goblin Gang", 3, Role::Support),
            card("Knight", 3, Role::Support),
            card("Ice Spirit", 1, Role::Cycle),
            card("Log", 2, Role::SpellSmall),
            card("Rocket", 6, Role::SpellBig),
            card("Inferno Tower", 5, Role::Building),
        ];
        let result = CoherenceScorer::default().analyze(&cards, Strategy::Balanced);
        assert_eq!(result.primary_archetype, Some(Archetype::Bait));
        assert!(result.coherence_score >= 0.6);
        assert!(result.bait_card_count >= 2);
    }

    #[test]
    fn test_elixir_mismatch_with_cycle_strategy() {
        let cards = vec![
            card("Golem", 8, Role::WinCondition),
            card("Night Witch", 4, Role::Support),
            card("Baby Dragon", 4, Role::Support),
            card("Lumberjack", 4, Role::Support),
            card("Lightning", 6, Role::SpellBig),
            card("Tornado", 3, Role::SpellSmall),
            card("Tombstone", 3, Role::Building),
            card("Skeletons", 1, Role::Cycle),
        ];
        let result = CoherenceScorer::default().analyze(&cards, Strategy::Cycle);
        assert!(result.average_elixir > 4.0);
        assert!(!result.elixir_match);
        assert!(result.violations.iter().any(|v| v.kind == ViolationKind::Elixir));
    }

    #[test]
    fn test_archetype_tie_uses_declaration_order() {
        // Cannon 同時屬於 cycle、control、siege、midrange
        let (matches, primary) = detect_archetype(&["Cannon"]);
        assert_eq!(matches[Archetype::Cycle.to_index()], 1);
        assert_eq!(primary, Some(Archetype::Cycle));

        let (_, primary) = detect_archetype(&["Mystery Card"]);
        assert_eq!(primary, None);
    }

    #[test]
    fn test_empty_deck() {
        let result = CoherenceScorer::default().analyze(&[], Strategy::Balanced);
        assert_eq!(result.coherence_score, 0.0);
        assert!(result.primary_archetype.is_none());
    }
}
