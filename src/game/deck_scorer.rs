//! 牌組層級評分
//!
//! - `score_deck_v2`: 六個 [0, 1] 子分數的加權和（權重總和不為 1，最後夾在 [0, 1]）
//! - `archetype_free_score`: 不依賴原型的牌組適性，用於比較隨機生成的牌組

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::cards::{CardCandidate, Role};
use super::coherence::{anti_synergy_violations, composition_violations, RoleTally, ANTI_SYNERGY_RULES};
use super::constants::{COVERAGE_TANK_KILLER_DPS, DPS_PER_ELIXIR_CAP, HP_PER_ELIXIR_CAP, MAX_USEFUL_RANGE};
use super::strategy::Strategy;
use super::synergy::SynergyDatabase;

// ============================================================================
// 權重
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeckScoreWeights {
    pub card_quality: f64,
    pub synergy: f64,
    pub counter_coverage: f64,
    pub archetype: f64,
    pub elixir_fit: f64,
    pub combat: f64,
}

impl Default for DeckScoreWeights {
    fn default() -> Self {
        Self {
            card_quality: 0.60,
            synergy: 0.20,
            counter_coverage: 0.15,
            archetype: 0.10,
            elixir_fit: 0.25,
            combat: 0.20,
        }
    }
}

// 多卡組合加成
const ARCHETYPE_CORE_BONUS: f64 = 0.10;
const WIN_CONDITION_PACKAGE_BONUS: f64 = 0.15;
const DEFENSIVE_CORE_BONUS: f64 = 0.10;

// 防守覆蓋門檻 (最低, 理想)
const AIR_DEFENSE: (usize, usize) = (2, 3);
const TANK_KILLERS: (usize, usize) = (1, 2);
const SPLASH: (usize, usize) = (1, 2);
const SWARM_SPELLS: (usize, usize) = (1, 2);
const BUILDINGS: (usize, usize) = (0, 1);

const PERCENT_DAMAGE_CARDS: &[&str] = &["Inferno Dragon", "Inferno Tower"];
const KNOWN_SPLASH_CARDS: &[&str] = &["Valkyrie", "Baby Dragon", "Dark Prince"];

// ============================================================================
// 結果
// ============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckScoreDetails {
    pub detected_synergies: usize,
    pub max_possible_synergies: usize,
    pub avg_synergy_strength: f64,

    pub air_defense_count: usize,
    pub tank_killer_count: usize,
    pub splash_count: usize,
    pub swarm_spell_count: usize,
    pub building_count: usize,
    pub coverage_gaps: Vec<String>,

    pub anti_synergies: Vec<String>,
    pub multi_card_bonuses: Vec<String>,

    pub average_elixir: f64,
    pub elixir_variance: f64,
    pub curve_quality: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DeckScore {
    pub final_score: f64,
    pub card_quality: f64,
    pub synergy: f64,
    pub counter_coverage: f64,
    pub archetype: f64,
    pub elixir_fit: f64,
    pub combat: f64,
    pub details: DeckScoreDetails,
}

// ============================================================================
// V2 綜合評分
// ============================================================================

pub fn score_deck_v2(cards: &[CardCandidate], strategy: Strategy, synergy: Option<&SynergyDatabase>) -> DeckScore {
    score_deck_v2_with(cards, strategy, synergy, &DeckScoreWeights::default())
}

pub fn score_deck_v2_with(
    cards: &[CardCandidate],
    strategy: Strategy,
    synergy: Option<&SynergyDatabase>,
    weights: &DeckScoreWeights,
) -> DeckScore {
    if cards.is_empty() {
        return DeckScore::default();
    }

    let mut details = DeckScoreDetails::default();
    let card_quality = card_quality_score(cards);
    let synergy_score = synergy_score(cards, synergy, &mut details);
    let counter_coverage = counter_coverage_score(cards, &mut details);
    let archetype = archetype_score(cards, strategy, &mut details);
    let elixir_fit = elixir_fit_score(cards, strategy, &mut details);
    let combat = combat_stats_score(cards);

    let total = card_quality * weights.card_quality
        + synergy_score * weights.synergy
        + counter_coverage * weights.counter_coverage
        + archetype * weights.archetype
        + elixir_fit * weights.elixir_fit
        + combat * weights.combat;

    DeckScore {
        final_score: total.clamp(0.0, 1.0),
        card_quality,
        synergy: synergy_score,
        counter_coverage,
        archetype,
        elixir_fit,
        combat,
        details,
    }
}

/// 單卡品質：降低等級權重（0.6）的版本
pub fn card_quality_v2(card: &CardCandidate) -> f64 {
    let level = card.level_ratio() * 0.6 * card.rarity.boost();
    let evolution = if card.max_evolution_level > 0 && card.evolution_level > 0 {
        card.evolution_ratio() * 0.5
    } else {
        0.0
    };
    let role = if card.role.is_some() { 0.05 } else { 0.0 };
    level + evolution + role
}

fn card_quality_score(cards: &[CardCandidate]) -> f64 {
    let total: f64 = cards.iter().map(card_quality_v2).sum();
    (total / cards.len() as f64).clamp(0.0, 1.0)
}

fn synergy_score(cards: &[CardCandidate], db: Option<&SynergyDatabase>, details: &mut DeckScoreDetails) -> f64 {
    let db = match db {
        Some(db) if cards.len() >= 2 => db,
        _ => return 0.0,
    };

    let max_pairs = cards.len() * (cards.len() - 1) / 2;
    details.max_possible_synergies = max_pairs;

    let mut detected = 0;
    let mut strength = 0.0;
    for (i, a) in cards.iter().enumerate() {
        for b in &cards[i + 1..] {
            let score = db.get_synergy(&a.name, &b.name);
            if score > 0.0 {
                detected += 1;
                strength += score;
            }
        }
    }
    details.detected_synergies = detected;

    let average = if detected > 0 { strength / detected as f64 } else { 0.0 };
    details.avg_synergy_strength = average;

    let coverage = detected as f64 / max_pairs as f64;
    let base = average * 0.7 + coverage * 0.3;
    (base + multi_card_bonus(cards, details)).clamp(0.0, 1.0)
}

fn multi_card_bonus(cards: &[CardCandidate], details: &mut DeckScoreDetails) -> f64 {
    let mut bonus = 0.0;

    let mut by_role: BTreeMap<Role, usize> = BTreeMap::new();
    for role in cards.iter().filter_map(|c| c.role) {
        *by_role.entry(role).or_insert(0) += 1;
    }
    for (role, count) in &by_role {
        if *count >= 3 {
            bonus += ARCHETYPE_CORE_BONUS;
            details.multi_card_bonuses.push(format!("Archetype core: 3+ {} cards", role.key()));
        }
    }

    let tally = RoleTally::from_cards(cards);
    if tally.win_conditions >= 1 && tally.support >= 2 && tally.spells >= 1 {
        bonus += WIN_CONDITION_PACKAGE_BONUS;
        details.multi_card_bonuses.push("Complete win condition package".to_string());
    }
    if tally.buildings >= 1 && tally.support >= 1 && tally.spells >= 1 {
        bonus += DEFENSIVE_CORE_BONUS;
        details.multi_card_bonuses.push("Defensive core established".to_string());
    }
    bonus
}

/// 依門檻計分：未達最低線性 0 → 0.6，最低到理想線性 0.6 → 1.0
pub fn coverage_score(count: usize, (min, ideal): (usize, usize)) -> f64 {
    if count < min {
        return 0.6 * count as f64 / min as f64;
    }
    if count >= ideal {
        return 1.0;
    }
    0.6 + 0.4 * (count - min) as f64 / (ideal - min) as f64
}

fn tank_killer_sources(card: &CardCandidate) -> usize {
    let by_stats = card.stats.map(|s| s.damage_per_second >= COVERAGE_TANK_KILLER_DPS).unwrap_or(false);
    by_stats as usize + PERCENT_DAMAGE_CARDS.contains(&card.name.as_str()) as usize
}

fn splash_sources(card: &CardCandidate) -> usize {
    let by_stats = card.stats.map(|s| s.is_splash()).unwrap_or(false);
    by_stats as usize + KNOWN_SPLASH_CARDS.contains(&card.name.as_str()) as usize
}

fn counter_coverage_score(cards: &[CardCandidate], details: &mut DeckScoreDetails) -> f64 {
    let air = cards.iter().filter(|c| c.is_air_defense()).count();
    let tank_killers: usize = cards.iter().map(tank_killer_sources).sum();
    let splash: usize = cards.iter().map(splash_sources).sum();
    let swarm = cards.iter().filter(|c| c.has_role(Role::SpellSmall)).count();
    let buildings = cards.iter().filter(|c| c.has_role(Role::Building)).count();

    details.air_defense_count = air;
    details.tank_killer_count = tank_killers;
    details.splash_count = splash;
    details.swarm_spell_count = swarm;
    details.building_count = buildings;

    let gaps = [
        (air < AIR_DEFENSE.0, "Insufficient air defense"),
        (tank_killers < TANK_KILLERS.0, "No tank killer"),
        (splash < SPLASH.0, "No splash damage"),
        (swarm < SWARM_SPELLS.0, "No swarm spell"),
    ];
    details.coverage_gaps = gaps.iter().filter(|(gap, _)| *gap).map(|(_, msg)| msg.to_string()).collect();

    // 大法術基準 0.10
    coverage_score(air, AIR_DEFENSE) * 0.25
        + coverage_score(tank_killers, TANK_KILLERS) * 0.20
        + coverage_score(splash, SPLASH) * 0.20
        + coverage_score(swarm, SWARM_SPELLS) * 0.15
        + coverage_score(buildings, BUILDINGS) * 0.10
        + 0.10
}

fn archetype_score(cards: &[CardCandidate], strategy: Strategy, details: &mut DeckScoreDetails) -> f64 {
    let names: Vec<&str> = cards.iter().map(|c| c.name.as_str()).collect();
    let tally = RoleTally::from_cards(cards);

    let mut violations = anti_synergy_violations(ANTI_SYNERGY_RULES, &names);
    violations.extend(composition_violations(&tally));

    let penalties: f64 = violations.iter().map(|v| v.severity).sum();
    details.anti_synergies = violations.into_iter().map(|v| v.message).collect();

    let has = |card: &str| names.contains(&card);
    let mut score = 0.8 - penalties;
    if strategy == Strategy::Cycle && has("Hog Rider") {
        score += 0.05;
    }
    if strategy == Strategy::Aggro && (has("Golem") || has("Giant") || has("Lava Hound")) {
        score += 0.05;
    }
    score.clamp(0.0, 1.0)
}

fn elixir_fit_score(cards: &[CardCandidate], strategy: Strategy, details: &mut DeckScoreDetails) -> f64 {
    let n = cards.len() as f64;
    let average = cards.iter().map(|c| c.elixir as f64).sum::<f64>() / n;
    details.average_elixir = average;
    details.elixir_variance = cards.iter().map(|c| (c.elixir as f64 - average).powi(2)).sum::<f64>() / n;

    let profile = strategy.def().elixir_profile;
    let strategy_match = if average < profile.min {
        1.0 - (profile.min - average) / 1.5
    } else if average > profile.max {
        1.0 - (average - profile.max) / 1.5
    } else {
        1.0
    }
    .max(0.0);

    let curve = curve_quality(cards);
    details.curve_quality = curve;
    strategy_match * 0.6 + curve * 0.4
}

/// 聖水分佈品質：便宜 2~3 張、中價 3~4 張、高價 1~2 張為理想
pub fn curve_quality(cards: &[CardCandidate]) -> f64 {
    if cards.is_empty() {
        return 0.0;
    }
    let cheap = cards.iter().filter(|c| (1..=2).contains(&c.elixir)).count();
    let medium = cards.iter().filter(|c| (3..=4).contains(&c.elixir)).count();
    let heavy = cards.iter().filter(|c| c.elixir >= 5).count();

    let cheap_score = match cheap {
        2..=3 => 1.0,
        0..=1 => cheap as f64 / 2.0,
        _ => (1.0 - (cheap - 3) as f64 * 0.2).max(0.0),
    };
    let medium_score = match medium {
        3..=4 => 1.0,
        0..=2 => medium as f64 / 3.0,
        _ => (1.0 - (medium - 4) as f64 * 0.2).max(0.0),
    };
    let heavy_score = match heavy {
        1..=2 => 1.0,
        0 => 0.7,
        _ => (1.0 - (heavy - 2) as f64 * 0.3).max(0.0),
    };
    cheap_score * 0.3 + medium_score * 0.5 + heavy_score * 0.2
}

fn combat_stats_score(cards: &[CardCandidate]) -> f64 {
    let scores: Vec<f64> = cards
        .iter()
        .filter_map(|card| {
            let stats = card.stats?;
            let elixir = card.elixir.max(1);
            let dps = (stats.dps_per_elixir(elixir) / DPS_PER_ELIXIR_CAP).min(1.0);
            let hp = (stats.hp_per_elixir(elixir) / HP_PER_ELIXIR_CAP).min(1.0);
            let range = (stats.range / MAX_USEFUL_RANGE).min(1.0);
            Some(dps * 0.35 + hp * 0.35 + stats.targets.coverage() * 0.15 + range * 0.15)
        })
        .collect();

    if scores.is_empty() {
        return 0.5;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

// ============================================================================
// 原型無關適性
// ============================================================================

/// `0.35·協同 + 0.25·覆蓋 + 0.25·品質 + 0.15·聖水`
pub fn archetype_free_score(cards: &[CardCandidate], synergy: Option<&SynergyDatabase>) -> f64 {
    if cards.is_empty() {
        return 0.0;
    }
    free_synergy(cards, synergy) * 0.35
        + free_coverage(cards) * 0.25
        + free_quality(cards) * 0.25
        + free_elixir_fit(cards) * 0.15
}

fn free_synergy(cards: &[CardCandidate], db: Option<&SynergyDatabase>) -> f64 {
    let db = match db {
        Some(db) if cards.len() >= 2 => db,
        _ => return 0.5,
    };
    let mut pairs = 0;
    let mut total = 0.0;
    for (i, a) in cards.iter().enumerate() {
        for b in &cards[i + 1..] {
            let score = db.get_synergy(&a.name, &b.name);
            if score > 0.0 {
                pairs += 1;
                total += score;
            }
        }
    }
    if pairs == 0 {
        return 0.3;
    }
    let average = total / pairs as f64;
    (average + (pairs as f64 / 10.0).min(0.3)).min(1.0)
}

fn free_coverage(cards: &[CardCandidate]) -> f64 {
    let mut coverage: f64 = 0.10;
    if cards.iter().any(CardCandidate::is_win_condition) {
        coverage += 0.25;
    }
    if cards.iter().any(CardCandidate::is_spell) {
        coverage += 0.15;
    }
    coverage += match cards.iter().filter(|c| c.is_air_defense()).count() {
        0 => 0.0,
        1 => 0.15,
        _ => 0.30,
    };
    if cards.iter().any(|c| splash_sources(c) > 0) {
        coverage += 0.20;
    }
    coverage.min(1.0)
}

fn free_quality(cards: &[CardCandidate]) -> f64 {
    cards.iter().map(CardCandidate::level_ratio).sum::<f64>() / cards.len() as f64
}

fn free_elixir_fit(cards: &[CardCandidate]) -> f64 {
    let average = cards.iter().map(|c| c.elixir as f64).sum::<f64>() / cards.len() as f64;
    if (3.0..=3.8).contains(&average) {
        return 1.0;
    }
    let distance = if average < 3.0 { 3.0 - average } else { average - 3.8 };
    (1.0 - distance / 2.0).max(0.0)
}

// ============================================================================
// 單元測試
// ============================================================================
