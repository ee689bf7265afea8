//! 計分引擎
//!
//! 單卡計分：等級、稀有度、聖水、角色、進化、戰鬥數據與策略親和度。
//! 所有函數皆為純函數，回傳分數而不修改候選卡。

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use super::cards::{CardCandidate, CombatStats, Rarity, Role};
use super::constants::{
    DPS_PER_ELIXIR_CAP, ELIXIR_CYCLE_PENALTY_RATE, ELIXIR_CYCLE_PENALTY_THRESHOLD, ELIXIR_MAX_DIFF,
    ELIXIR_OPTIMAL, ELIXIR_PENALTY_RATE, HP_PER_ELIXIR_CAP,
};
use super::level_curves::LevelCurve;
use super::strategy::StrategyConfig;

// ============================================================================
// 計分權重
// ============================================================================

/// 計分權重（不可變值物件，預設值即標準公式）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoringWeights {
    pub level: f64,
    pub elixir: f64,
    pub role_bonus: f64,
    pub evolution: f64,
    /// 戰鬥分數混合比例，0 表示停用
    pub combat: f64,
    pub combat_dps: f64,
    pub combat_hp: f64,
    pub combat_role: f64,
    /// 策略加成的全域縮放
    pub strategy_scaling: f64,
    /// 牌組內協同加成
    pub synergy: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            level: 1.2,
            elixir: 0.15,
            role_bonus: 0.05,
            evolution: 0.15,
            combat: 0.25,
            combat_dps: 0.4,
            combat_hp: 0.4,
            combat_role: 0.2,
            strategy_scaling: 1.0,
            synergy: 0.15,
        }
    }
}

impl ScoringWeights {
    pub fn without_combat(self) -> Self {
        Self { combat: 0.0, ..self }
    }
}

// ============================================================================
// 基礎計分
// ============================================================================

pub fn linear_level_ratio(level: u32, max_level: u32) -> f64 {
    if max_level == 0 {
        return 0.0;
    }
    level as f64 / max_level as f64
}

/// 三角聖水偏好，峰值在 3 聖水
pub fn elixir_preference(elixir: u32) -> f64 {
    1.0 - (elixir as f64 - ELIXIR_OPTIMAL).abs() / ELIXIR_MAX_DIFF
}

pub fn evolution_bonus(evolution_level: u32, max_evolution_level: u32, weight: f64) -> f64 {
    if evolution_level == 0 || max_evolution_level == 0 {
        return 0.0;
    }
    weight * (evolution_level as f64 / max_evolution_level as f64).min(1.0)
}

/// 以已算好的等級比例計分
pub fn score_from_ratio(
    weights: &ScoringWeights,
    level_ratio: f64,
    rarity: Rarity,
    elixir: u32,
    role: Option<Role>,
    evolution_level: u32,
    max_evolution_level: u32,
) -> f64 {
    let role_bonus = if role.is_some() { weights.role_bonus } else { 0.0 };
    level_ratio * weights.level * rarity.boost()
        + elixir_preference(elixir) * weights.elixir
        + role_bonus
        + evolution_bonus(evolution_level, max_evolution_level, weights.evolution)
}

/// 單卡分數（預設權重，線性等級比例），典型範圍 0.0 ~ 1.65
pub fn score_card(
    level: u32,
    max_level: u32,
    rarity: Rarity,
    elixir: u32,
    role: Option<Role>,
    evolution_level: u32,
    max_evolution_level: u32,
) -> f64 {
    score_from_ratio(
        &ScoringWeights::default(),
        linear_level_ratio(level, max_level),
        rarity,
        elixir,
        role,
        evolution_level,
        max_evolution_level,
    )
}

/// 候選卡基礎分數；提供等級曲線時以非線性比例取代線性比例
pub fn base_score(card: &CardCandidate, weights: &ScoringWeights, curve: Option<&LevelCurve>) -> f64 {
    let ratio = match curve {
        Some(curve) => curve.relative_level_ratio(&card.name, card.level, card.max_level),
        None => linear_level_ratio(card.level, card.max_level),
    };
    score_from_ratio(
        weights,
        ratio,
        card.rarity,
        card.elixir,
        card.role,
        card.evolution_level,
        card.max_evolution_level,
    )
}

// ============================================================================
// 戰鬥計分
// ============================================================================

/// 戰鬥效能 [0, 1]：DPS/聖水、HP/聖水、角色效能 40/40/20
pub fn combat_score(stats: &CombatStats, elixir: u32, role: Option<Role>, weights: &ScoringWeights) -> f64 {
    let dps = (stats.dps_per_elixir(elixir) / DPS_PER_ELIXIR_CAP).min(1.0);
    let hp = (stats.hp_per_elixir(elixir) / HP_PER_ELIXIR_CAP).min(1.0);
    let role_eff = stats.role_effectiveness(role);
    (dps * weights.combat_dps + hp * weights.combat_hp + role_eff * weights.combat_role).clamp(0.0, 1.0)
}

/// 混合戰鬥分數：`base·(1−w) + combat·w`；w 為 0 或無數據時原樣回傳 base
pub fn blend_combat(base: f64, card: &CardCandidate, weights: &ScoringWeights) -> f64 {
    let w = weights.combat.clamp(0.0, 1.0);
    match card.stats {
        Some(ref stats) if w > 0.0 => {
            let combat = combat_score(stats, card.elixir, card.role, weights);
            base * (1.0 - w) + combat * w
        }
        _ => base,
    }
}

pub fn score_with_combat(card: &CardCandidate, weights: &ScoringWeights, curve: Option<&LevelCurve>) -> f64 {
    blend_combat(base_score(card, weights, curve), card, weights)
}

// ============================================================================
// 策略計分
// ============================================================================

/// 聖水調整：目標區間內為 0，區間外依距離扣分
pub fn elixir_adjustment(elixir: u32, config: &StrategyConfig) -> f64 {
    let cost = elixir as f64;
    let (min, max) = (config.target_elixir_min, config.target_elixir_max);
    if cost >= min && cost <= max {
        return 0.0;
    }
    let distance = if cost < min { min - cost } else { cost - max };
    if max <= ELIXIR_OPTIMAL && cost > ELIXIR_CYCLE_PENALTY_THRESHOLD {
        return -ELIXIR_CYCLE_PENALTY_RATE * distance;
    }
    -ELIXIR_PENALTY_RATE * distance
}

/// 策略分數：（含戰鬥）基礎分 + 角色加成 + 親和度 + 聖水調整
pub fn score_with_strategy(
    card: &CardCandidate,
    weights: &ScoringWeights,
    curve: Option<&LevelCurve>,
    config: &StrategyConfig,
) -> f64 {
    let base = score_with_combat(card, weights, curve);
    let role_bonus = config.role_bonus(card.role) * weights.strategy_scaling;
    let affinity = config.affinity(&card.name) * weights.strategy_scaling;
    base + role_bonus + affinity + elixir_adjustment(card.elixir, config)
}

// ============================================================================
// 候選卡工具
// ============================================================================

/// 排序規則：分數高者優先，同分時名稱字典序小者優先
pub fn rank_order(a: (f64, &str), b: (f64, &str)) -> Ordering {
    b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

pub fn sort_by_score(cards: &mut [CardCandidate]) {
    cards.sort_by(|a, b| rank_order((a.score, &a.name), (b.score, &b.name)));
}

pub fn top_n(cards: &[CardCandidate], n: usize) -> Vec<CardCandidate> {
    let mut sorted = cards.to_vec();
    sort_by_score(&mut sorted);
    sorted.truncate(n);
    sorted
}

pub fn filter_by_role(cards: &[CardCandidate], role: Role) -> Vec<CardCandidate> {
    cards.iter().filter(|c| c.has_role(role)).cloned().collect()
}

pub fn filter_by_elixir_range(cards: &[CardCandidate], min: u32, max: u32) -> Vec<CardCandidate> {
    cards.iter().filter(|c| c.elixir >= min && c.elixir <= max).cloned().collect()
}

pub fn exclude_cards(cards: &[CardCandidate], excluded: &[String]) -> Vec<CardCandidate> {
    cards
        .iter()
        .filter(|c| !excluded.iter().any(|e| e == &c.name))
        .cloned()
        .collect()
}

pub fn average_elixir(cards: &[CardCandidate]) -> f64 {
    if cards.is_empty() {
        return 0.0;
    }
    cards.iter().map(|c| c.elixir as f64).sum::<f64>() / cards.len() as f64
}

pub fn level_distribution(cards: &[CardCandidate]) -> BTreeMap<u32, usize> {
    let mut dist = BTreeMap::new();
    for card in cards {
        *dist.entry(card.level).or_insert(0) += 1;
    }
    dist
}

pub fn rarity_distribution(cards: &[CardCandidate]) -> HashMap<Rarity, usize> {
    let mut dist = HashMap::new();
    for card in cards {
        *dist.entry(card.rarity).or_insert(0) += 1;
    }
    dist
}

/// 截斷到指定小數位（不四捨五入）
pub fn truncate_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).trunc() / factor
}

// ============================================================================
// 單元測試
// ============================================================================
