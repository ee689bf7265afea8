//! 牌組核心模組
//!
//! 包含卡牌與牌組評估的核心定義：
//! - `constants`: 常量
//! - `cards`: 卡牌、角色、稀有度、戰鬥數據定義
//! - `level_curves`: 非線性等級曲線
//! - `strategy`: 組牌策略預設
//! - `scoring`: 單卡計分引擎
//! - `synergy`: 協同資料庫
//! - `counters`: 反制矩陣
//! - `archetypes`: 牌組原型與原型迴避
//! - `coherence`: 牌組一致性評分
//! - `redundancy`: 角色冗餘懲罰
//! - `uniqueness`: 獨特性（反主流）計分
//! - `deck_scorer`: 牌組層級評分 (V2)
//!
//! 注意：本模組只有靜態表與純函數，組牌流程在 `service` 模組

#![allow(unused_imports)]

pub mod constants;
pub mod cards;
pub mod level_curves;
pub mod strategy;
pub mod scoring;
pub mod synergy;
pub mod counters;
pub mod archetypes;
pub mod coherence;
pub mod redundancy;
pub mod uniqueness;
pub mod deck_scorer;

// Re-export 常用類型（公開 API，可能未在內部使用）
pub use constants::*;
pub use cards::{
    canonical_card_name, card_elixir, classify_card, count_roles, has_balanced_roles,
    CardCandidate, CombatStats, Rarity, Role, Targets, ROLE_COUNT,
};
pub use level_curves::{CardLevelConfig, LevelCurve};
pub use strategy::{ElixirProfile, RoleComposition, Strategy, StrategyConfig, STRATEGY_DEFS};
pub use scoring::{
    base_score, rank_order, score_card, score_with_combat, score_with_strategy, sort_by_score,
    ScoringWeights,
};
pub use synergy::{
    DeckSynergyAnalysis, SynergyCache, SynergyCategory, SynergyDatabase, SynergyPair,
    SynergyRecommendation,
};
pub use counters::{CounterCategory, CounterEntry, CounterMatrix, ThreatCoverage};
pub use archetypes::{Archetype, ArchetypeAvoidanceScorer};
pub use coherence::{CoherenceResult, CoherenceScorer, Violation, ViolationKind};
pub use redundancy::{analyze_redundancy, RedundancyReport, RedundantRole};
pub use uniqueness::{CardPopularity, UniquenessConfig, UniquenessResult, UniquenessScorer};
pub use deck_scorer::{archetype_free_score, score_deck_v2, DeckScore, DeckScoreWeights};
