//! 服務層模組
//!
//! 提供候選池建立、五種組牌策略、推薦牌組與蒙地卡羅牌組生成

#![allow(unused_imports)]

pub mod error;
pub mod scoring;
pub mod strategies;
pub mod synergy_graph;
pub mod constraint_builder;
pub mod role_first;
pub mod counter_centric;
pub mod meta_learning;
pub mod recommend;
pub mod fuzzer;

pub use error::DeckError;
pub use scoring::{build_candidates, rescore, CollectionCard, PoolOptions};
pub use strategies::{build_multiple, build_multiple_report, create_strategy, BatchReport, BuilderConfig, DeckStrategy, StrategyKind};
pub use synergy_graph::SynergyGraphBuilder;
pub use constraint_builder::ConstraintSatisfactionBuilder;
pub use role_first::RoleFirstBuilder;
pub use counter_centric::CounterCentricBuilder;
pub use meta_learning::{CoOccurrenceMatrix, MetaLearningBuilder};
pub use recommend::{CardDetail, DeckBuilder, DeckMetrics, DeckRecommendation};
pub use fuzzer::{DeckFuzzer, FuzzedDeck, FuzzingConfig, FuzzingStats};

#[cfg(test)]
mod integration_tests;
