//! 候選池計分服務
//!
//! 將玩家收藏轉為已計分的候選池：補齊聖水與角色、套用策略與原型迴避。

use std::collections::HashSet;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::game::archetypes::ArchetypeAvoidanceScorer;
use crate::game::cards::{card_elixir, classify_card, CardCandidate, CombatStats, Rarity};
use crate::game::level_curves::LevelCurve;
use crate::game::scoring::{score_with_strategy, sort_by_score, ScoringWeights};
use crate::game::strategy::{Strategy, StrategyConfig};
use crate::game::uniqueness::UniquenessScorer;

/// 收藏中的一張卡（輸入格式）
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollectionCard {
    pub name: String,
    pub level: u32,
    pub max_level: u32,
    pub rarity: String,
    /// 缺少或為 0 時查表
    pub elixir: Option<u32>,
    pub evolution_level: u32,
    pub max_evolution_level: u32,
    pub stats: Option<CombatStats>,
}

impl CollectionCard {
    pub fn new(name: &str, level: u32, max_level: u32, rarity: &str) -> Self {
        Self {
            name: name.to_string(),
            level,
            max_level,
            rarity: rarity.to_string(),
            ..Default::default()
        }
    }

    /// 未計分的候選卡；未知稀有度視為 Common
    pub fn to_candidate(&self) -> CardCandidate {
        let rarity = Rarity::parse(&self.rarity).unwrap_or_default();
        let elixir = card_elixir(&self.name, self.elixir);
        let role = classify_card(&self.name, elixir);
        let mut candidate = CardCandidate::new(&self.name, self.level, self.max_level, rarity, elixir, role)
            .with_evolution(self.evolution_level, self.max_evolution_level);
        candidate.stats = self.stats;
        candidate
    }
}

/// 候選池計分選項
#[derive(Clone, Debug, Default)]
pub struct PoolOptions {
    pub weights: ScoringWeights,
    pub strategy: Strategy,
    pub level_curve: Option<Arc<LevelCurve>>,
    pub avoidance: ArchetypeAvoidanceScorer,
    pub uniqueness: UniquenessScorer,
}

impl PoolOptions {
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy, ..Default::default() }
    }

    /// 單卡情境分數（策略分數 + 原型迴避懲罰 + 獨特性加分）
    pub fn score(&self, card: &CardCandidate, config: &StrategyConfig) -> f64 {
        let curve = self.level_curve.as_deref();
        score_with_strategy(card, &self.weights, curve, config)
            + self.avoidance.score_card(&card.name)
            + self.uniqueness.score_card(&card.name)
    }
}

/// 建立已計分、依分數排序的候選池；重複卡名只保留第一張
pub fn build_candidates(cards: &[CollectionCard], options: &PoolOptions) -> Vec<CardCandidate> {
    let config = options.strategy.config();

    let mut seen = HashSet::with_capacity(cards.len());
    let unique: Vec<CardCandidate> = cards
        .iter()
        .map(CollectionCard::to_candidate)
        .filter(|c| !c.name.is_empty() && seen.insert(c.name.clone()))
        .collect();

    let mut scored: Vec<CardCandidate> = unique
        .into_par_iter()
        .map(|c| {
            let score = options.score(&c, &config);
            c.with_score(score)
        })
        .collect();
    sort_by_score(&mut scored);

    debug!(
        strategy = options.strategy.name(),
        collection = cards.len(),
        pool = scored.len(),
        "candidate pool scored"
    );
    scored
}

/// 以另一策略重新計分（回傳新的候選池，原池不變）
pub fn rescore(candidates: &[CardCandidate], options: &PoolOptions) -> Vec<CardCandidate> {
    let config = options.strategy.config();
    let mut scored: Vec<CardCandidate> = candidates
        .par_iter()
        .map(|c| c.clone().with_score(options.score(c, &config)))
        .collect();
    sort_by_score(&mut scored);
    scored
}

// ============================================================================
// 單元測試
// ============================================================================
