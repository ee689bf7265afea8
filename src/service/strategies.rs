//! 組牌策略介面
//!
//! 五種可互換的組牌演算法共用一個 trait，由名稱工廠建立。
//!
//! # 架構
//!
//! - `DeckStrategy`: 組出一副 8 張牌組
//! - `BuilderConfig`: 候選池與協作者（協同資料庫、反制矩陣）
//! - `create_strategy` / `build_multiple`: 名稱 → 策略；批次執行，略過失敗者
//! - `build_multiple_report`: 批次執行並保留失敗原因

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::game::cards::CardCandidate;
use crate::game::constants::DECK_SIZE;
use crate::game::counters::CounterMatrix;
use crate::game::scoring::rank_order;
use crate::game::synergy::{SynergyCache, SynergyDatabase};
use crate::service::constraint_builder::ConstraintSatisfactionBuilder;
use crate::service::counter_centric::CounterCentricBuilder;
use crate::service::error::DeckError;
use crate::service::meta_learning::MetaLearningBuilder;
use crate::service::role_first::RoleFirstBuilder;
use crate::service::synergy_graph::SynergyGraphBuilder;

// ============================================================================
// 策略介面
// ============================================================================

pub trait DeckStrategy: Send + Sync {
    /// 成功時回傳 8 張不重複、皆來自候選池的卡名
    fn build(&self) -> Result<Vec<String>, DeckError>;

    fn name(&self) -> &'static str;
}

// ============================================================================
// 組牌設定
// ============================================================================

#[derive(Clone, Debug)]
pub struct BuilderConfig {
    pub candidates: Vec<CardCandidate>,
    pub synergy_db: Option<Arc<SynergyDatabase>>,
    pub counter_matrix: Option<Arc<CounterMatrix>>,
    pub preferred_elixir: f64,
    /// 完整牌組平均聖水上限，0 表示不限制
    pub max_elixir: f64,
    pub require_win_condition: bool,
    pub require_spell: bool,
    pub require_air_defense: bool,
    /// 需要隨機起手的策略使用
    pub seed: u64,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            candidates: Vec::new(),
            synergy_db: None,
            counter_matrix: Some(Arc::new(CounterMatrix::with_defaults())),
            preferred_elixir: 3.5,
            max_elixir: 4.5,
            require_win_condition: true,
            require_spell: true,
            require_air_defense: true,
            seed: 0,
        }
    }
}

impl BuilderConfig {
    pub fn new(candidates: Vec<CardCandidate>) -> Self {
        Self { candidates, ..Default::default() }
    }

    pub fn with_synergy(mut self, db: Arc<SynergyDatabase>) -> Self {
        self.synergy_db = Some(db);
        self
    }

    pub fn with_counter_matrix(mut self, matrix: Option<Arc<CounterMatrix>>) -> Self {
        self.counter_matrix = matrix;
        self
    }

    /// 候選池不足 8 張（以不重複卡名計）即失敗
    pub fn ensure_pool(&self) -> Result<(), DeckError> {
        let unique: HashSet<&str> = self.candidates.iter().map(|c| c.name.as_str()).collect();
        if unique.len() < DECK_SIZE {
            return Err(DeckError::InsufficientCandidates { need: DECK_SIZE, got: unique.len() });
        }
        Ok(())
    }

    /// 每次組牌建立新的協同快取
    pub fn synergy_cache(&self) -> Option<SynergyCache<'_>> {
        self.synergy_db.as_deref().map(SynergyCache::new)
    }

    /// 完整牌組的硬性條件：勝利條件、法術、防空、平均聖水上限
    pub fn meets_constraints(&self, deck: &[&CardCandidate]) -> bool {
        if self.require_win_condition && !deck.iter().any(|c| c.is_win_condition()) {
            return false;
        }
        if self.require_spell && !deck.iter().any(|c| c.is_spell()) {
            return false;
        }
        if self.require_air_defense && !deck.iter().any(|c| c.is_air_defense()) {
            return false;
        }
        if self.max_elixir > 0.0 && !deck.is_empty() {
            let avg = deck.iter().map(|c| c.elixir as f64).sum::<f64>() / deck.len() as f64;
            if avg > self.max_elixir {
                return false;
            }
        }
        true
    }
}

// ============================================================================
// 策略種類與工廠
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StrategyKind {
    SynergyGraph,
    ConstraintSatisfaction,
    RoleFirst,
    CounterCentric,
    MetaLearning,
}

impl StrategyKind {
    pub fn all() -> &'static [StrategyKind] {
        &[
            StrategyKind::SynergyGraph,
            StrategyKind::ConstraintSatisfaction,
            StrategyKind::RoleFirst,
            StrategyKind::CounterCentric,
            StrategyKind::MetaLearning,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::SynergyGraph => "synergy_graph",
            StrategyKind::ConstraintSatisfaction => "constraint_satisfaction",
            StrategyKind::RoleFirst => "role_first",
            StrategyKind::CounterCentric => "counter_centric",
            StrategyKind::MetaLearning => "meta_learning",
        }
    }

    pub fn parse(input: &str) -> Result<StrategyKind, DeckError> {
        let normalized = input.trim().to_ascii_lowercase();
        StrategyKind::all()
            .iter()
            .copied()
            .find(|k| k.name() == normalized)
            .ok_or_else(|| DeckError::UnknownBuilder(input.to_string()))
    }
}

/// 名稱 → 策略；缺少必要協作者時回傳 `MissingDependency`
pub fn create_strategy(name: &str, config: BuilderConfig) -> Result<Box<dyn DeckStrategy>, DeckError> {
    let strategy: Box<dyn DeckStrategy> = match StrategyKind::parse(name)? {
        StrategyKind::SynergyGraph => Box::new(SynergyGraphBuilder::new(config)?),
        StrategyKind::ConstraintSatisfaction => Box::new(ConstraintSatisfactionBuilder::new(config)),
        StrategyKind::RoleFirst => Box::new(RoleFirstBuilder::new(config)),
        StrategyKind::CounterCentric => Box::new(CounterCentricBuilder::new(config)?),
        StrategyKind::MetaLearning => Box::new(MetaLearningBuilder::new(config)),
    };
    Ok(strategy)
}

/// 批次組牌結果
#[derive(Debug, Default)]
pub struct BatchReport {
    pub decks: BTreeMap<String, Vec<String>>,
    pub failures: BTreeMap<String, DeckError>,
}

impl BatchReport {
    /// 設定錯誤造成的失敗（缺少協作者、未知策略名稱）
    pub fn unrecoverable(&self) -> impl Iterator<Item = (&String, &DeckError)> {
        self.failures.iter().filter(|(_, err)| !err.is_recoverable())
    }
}

/// 批次組牌（平行執行）；可恢復的失敗記為 debug，設定錯誤記為 warn
pub fn build_multiple_report(names: &[&str], config: &BuilderConfig) -> BatchReport {
    let results: Vec<(&str, Result<Vec<String>, DeckError>)> = names
        .par_iter()
        .map(|&name| (name, create_strategy(name, config.clone()).and_then(|s| s.build())))
        .collect();

    let mut report = BatchReport::default();
    for (name, result) in results {
        match result {
            Ok(deck) => {
                debug!(strategy = name, "deck built");
                report.decks.insert(name.to_string(), deck);
            }
            Err(err) => {
                if err.is_recoverable() {
                    debug!(strategy = name, error = %err, "strategy found no deck");
                } else {
                    warn!(strategy = name, error = %err, "skipping misconfigured strategy");
                }
                report.failures.insert(name.to_string(), err);
            }
        }
    }
    report
}

/// 名稱 → 牌組，失敗的策略不出現在結果中
pub fn build_multiple(names: &[&str], config: &BuilderConfig) -> BTreeMap<String, Vec<String>> {
    build_multiple_report(names, config).decks
}

// ============================================================================
// 共用工具
// ============================================================================

/// 依分數挑最佳候選；同分時名稱字典序小者優先
pub(crate) fn pick_best<'c, I, F>(candidates: I, mut score: F) -> Option<(&'c CardCandidate, f64)>
where
    I: IntoIterator<Item = &'c CardCandidate>,
    F: FnMut(&CardCandidate) -> f64,
{
    let mut best: Option<(&'c CardCandidate, f64)> = None;
    for card in candidates {
        let s = score(card);
        let better = match best {
            None => true,
            Some((b, bs)) => rank_order((s, &card.name), (bs, &b.name)) == Ordering::Less,
        };
        if better {
            best = Some((card, s));
        }
    }
    best
}

/// 與牌組的協同總和；沒有資料庫時為 0
pub(crate) fn synergy_to_deck(cache: &mut Option<SynergyCache<'_>>, card: &str, deck: &[String]) -> f64 {
    cache.as_mut().map(|c| c.sum_with(card, deck)).unwrap_or(0.0)
}

/// 候選池中尚未使用的卡
pub(crate) fn unused<'c: 'u, 'u>(
    candidates: &'c [CardCandidate],
    used: &'u HashSet<String>,
) -> impl Iterator<Item = &'c CardCandidate> + 'u {
    candidates.iter().filter(move |c| !used.contains(&c.name))
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::game::cards::{CombatStats, Rarity, Role, Targets};

    pub(crate) fn candidate(name: &str, elixir: u32, role: Role, level: u32) -> CardCandidate {
        CardCandidate::new(name, level, 14, Rarity::Common, elixir, Some(role))
    }

    pub(crate) fn air(card: CardCandidate) -> CardCandidate {
        card.with_stats(CombatStats {
            hitpoints: 700.0,
            damage: 180.0,
            damage_per_second: 160.0,
            range: 6.0,
            targets: Targets::AirAndGround,
            radius: 0.0,
            lifetime: 0.0,
        })
    }

    /// 12 張、角色齊全的測試候選池
    pub(crate) fn sample_pool() -> Vec<CardCandidate> {
        vec![
            candidate("Hog Rider", 4, Role::WinCondition, 13),
            candidate("Giant", 5, Role::WinCondition, 11),
            air(candidate("Musketeer", 4, Role::Support, 12)),
            air(candidate("Baby Dragon", 4, Role::Support, 11)).with_stats(CombatStats {
                hitpoints: 1000.0,
                damage: 130.0,
                damage_per_second: 85.0,
                range: 3.5,
                targets: Targets::AirAndGround,
                radius: 1.5,
                lifetime: 0.0,
            }),
            candidate("Valkyrie", 4, Role::Support, 12),
            candidate("Cannon", 3, Role::Building, 12),
            candidate("Fireball", 4, Role::SpellBig, 12),
            candidate("Log", 2, Role::SpellSmall, 13),
            candidate("Zap", 2, Role::SpellSmall, 10),
            candidate("Ice Spirit", 1, Role::Cycle, 13),
            candidate("Skeletons", 1, Role::Cycle, 12),
            candidate("Ice Golem", 2, Role::Cycle, 11),
        ]
    }

    pub(crate) fn assert_valid_deck(deck: &[String], pool: &[CardCandidate]) {
        assert_eq!(deck.len(), DECK_SIZE);
        let unique: HashSet<&String> = deck.iter().collect();
        assert_eq!(unique.len(), DECK_SIZE, "duplicate cards in {:?}", deck);
        for name in deck {
            assert!(pool.iter().any(|c| &c.name == name), "{} not in pool", name);
        }
    }

    #[test]
    fn test_strategy_kind_parse() {
        assert_eq!(StrategyKind::parse("Role_First").unwrap(), StrategyKind::RoleFirst);
        assert!(matches!(StrategyKind::parse("genetic"), Err(DeckError::UnknownBuilder(_))));
        for &kind in StrategyKind::all() {
            assert_eq!(StrategyKind::parse(kind.name()).unwrap(), kind);
        }
    }

    #[test]
    fn test_factory_missing_dependencies() {
        let config = BuilderConfig::new(sample_pool());
        let err = create_strategy("synergy_graph", config.clone()).err().unwrap();
        assert!(matches!(err, DeckError::MissingDependency(_)));

        let no_matrix = config.with_counter_matrix(None);
        let err = create_strategy("counter_centric", no_matrix).err().unwrap();
        assert!(matches!(err, DeckError::MissingDependency(_)));
    }

    #[test]
    fn test_factory_names() {
        let config = BuilderConfig::new(sample_pool()).with_synergy(Arc::new(SynergyDatabase::new()));
        for &kind in StrategyKind::all() {
            let strategy = create_strategy(kind.name(), config.clone()).unwrap();
            assert_eq!(strategy.name(), kind.name());
        }
        assert!(matches!(
            create_strategy("nope", config).err().unwrap(),
            DeckError::UnknownBuilder(_)
        ));
    }

    #[test]
    fn test_ensure_pool() {
        let mut pool = sample_pool();
        pool.truncate(7);
        let err = BuilderConfig::new(pool).ensure_pool().unwrap_err();
        assert!(matches!(err, DeckError::InsufficientCandidates { need: 8, got: 7 }));
    }

    #[test]
    fn test_meets_constraints() {
        let pool = sample_pool();
        let config = BuilderConfig::new(pool.clone());
        let refs: Vec<&CardCandidate> = pool.iter().take(8).collect();
        assert!(config.meets_constraints(&refs));

        // 沒有勝利條件
        let refs: Vec<&CardCandidate> = pool.iter().skip(2).take(8).collect();
        assert!(!config.meets_constraints(&refs));
    }

    #[test]
    fn test_pick_best_tie_breaks_by_name() {
        let pool = vec![
            candidate("Zap", 2, Role::SpellSmall, 10),
            candidate("Arrows", 3, Role::SpellSmall, 10),
        ];
        let (best, score) = pick_best(&pool, |_| 1.0).unwrap();
        assert_eq!(best.name, "Arrows");
        assert_eq!(score, 1.0);
        assert!(pick_best(&Vec::<CardCandidate>::new(), |_| 1.0).is_none());
    }

    #[test]
    fn test_build_multiple_skips_failures() {
        let config = BuilderConfig::new(sample_pool());
        // 沒有協同資料庫：synergy_graph 被略過
        let decks = build_multiple(&["synergy_graph", "role_first", "constraint_satisfaction", "bogus"], &config);
        assert!(!decks.contains_key("synergy_graph"));
        assert!(!decks.contains_key("bogus"));
        assert!(decks.contains_key("role_first"));
        assert!(decks.contains_key("constraint_satisfaction"));
        for deck in decks.values() {
            assert_valid_deck(deck, &config.candidates);
        }
    }

    #[test]
    fn test_batch_report_separates_failures() {
        let config = BuilderConfig::new(sample_pool());
        let report = build_multiple_report(&["synergy_graph", "role_first", "bogus"], &config);
        assert_eq!(report.decks.keys().collect::<Vec<_>>(), vec!["role_first"]);

        let unrecoverable: Vec<&String> = report.unrecoverable().map(|(name, _)| name).collect();
        assert_eq!(unrecoverable, vec!["bogus", "synergy_graph"]);
        assert!(matches!(report.failures["synergy_graph"], DeckError::MissingDependency(_)));

        let mut small = sample_pool();
        small.truncate(7);
        let report = build_multiple_report(&["role_first", "meta_learning"], &BuilderConfig::new(small));
        assert!(report.decks.is_empty());
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.unrecoverable().count(), 0);
        assert!(report.failures.values().all(DeckError::is_recoverable));
    }
}
