//! 牌組推薦
//!
//! 依策略的角色配置逐角色挑卡，產生附帶說明、進化欄位與評估指標的推薦牌組。
//!
//! 流程：
//! 1. 收藏 → 已計分候選池（排除指定卡）
//! 2. 強制加入的卡
//! 3. 依角色配置填位（勝利條件 → 建築 → 大法術 → 小法術 → 支援 → 循環）
//! 4. 以最高情境分數補滿
//! 5. 進化欄位、說明、指標

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::game::archetypes::ArchetypeAvoidanceScorer;
use crate::game::cards::{canonical_card_name, CardCandidate, Role};
use crate::game::coherence::{CoherenceResult, CoherenceScorer};
use crate::game::constants::{
    DECK_SIZE, HIGH_AVG_ELIXIR_NOTE, LOW_AVG_ELIXIR_NOTE, MAX_AVG_ELIXIR, MAX_EVOLUTION_SLOTS,
};
use crate::game::counters::{CounterMatrix, ThreatCoverage};
use crate::game::deck_scorer::{score_deck_v2, DeckScore};
use crate::game::redundancy::{analyze_redundancy, RedundancyReport};
use crate::game::level_curves::LevelCurve;
use crate::game::scoring::{truncate_to, ScoringWeights};
use crate::game::strategy::Strategy;
use crate::game::synergy::{DeckSynergyAnalysis, SynergyCache, SynergyDatabase};
use crate::game::uniqueness::{UniquenessResult, UniquenessScorer};
use crate::service::error::DeckError;
use crate::service::scoring::{build_candidates, CollectionCard, PoolOptions};
use crate::service::strategies::pick_best;

pub const NO_WIN_CONDITION_NOTE: &str = "No win condition found; selected highest power cards instead.";
pub const NO_BUILDING_NOTE: &str = "No defensive building available; play troops high to kite.";
pub const NO_SPELL_NOTE: &str = "No spell picked; beware of swarm matchups.";
pub const HIGH_ELIXIR_NOTE: &str = "High average elixir; play patiently and build pushes.";
pub const LOW_ELIXIR_NOTE: &str = "Low average elixir; pressure often and out-cycle counters.";

// ============================================================================
// 推薦結果
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardDetail {
    pub name: String,
    pub level: u32,
    pub max_level: u32,
    pub rarity: String,
    pub elixir: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// 入選時的情境分數（截斷至小數兩位）
    pub score: f64,
    #[serde(default)]
    pub evolution_level: u32,
    #[serde(default)]
    pub max_evolution_level: u32,
}

impl CardDetail {
    fn from_pick(card: &CardCandidate, score: f64) -> Self {
        Self {
            name: card.name.clone(),
            level: card.level,
            max_level: card.max_level,
            rarity: card.rarity.name().to_string(),
            elixir: card.elixir,
            role: card.role,
            score: truncate_to(score, 2),
            evolution_level: card.evolution_level,
            max_evolution_level: card.max_evolution_level,
        }
    }
}

/// 推薦牌組的評估指標
#[derive(Clone, Debug, Serialize)]
pub struct DeckMetrics {
    pub coherence: CoherenceResult,
    /// 沒有協同資料庫時為 None
    pub synergy: Option<DeckSynergyAnalysis>,
    pub counter_coverage: Vec<ThreatCoverage>,
    pub score: DeckScore,
    pub redundancy: RedundancyReport,
    /// 未啟用獨特性計分時為 None
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uniqueness: Option<UniquenessResult>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeckRecommendation {
    pub deck: Vec<String>,
    pub deck_detail: Vec<CardDetail>,
    #[serde(rename = "average_elixir")]
    pub avg_elixir: f64,
    pub strategy: String,
    pub notes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evolution_slots: Vec<String>,
    #[serde(skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<DeckMetrics>,
}

impl DeckRecommendation {
    pub fn add_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// 由卡牌明細重新計算平均聖水（截斷至小數兩位）
    pub fn calculate_avg_elixir(&self) -> f64 {
        if self.deck_detail.is_empty() {
            return 0.0;
        }
        let total: u32 = self.deck_detail.iter().map(|c| c.elixir).sum();
        truncate_to(total as f64 / self.deck_detail.len() as f64, 2)
    }

    pub fn validate(&self) -> Result<(), DeckError> {
        if self.deck.len() != DECK_SIZE || self.deck_detail.len() != DECK_SIZE {
            return Err(DeckError::InvalidDeck {
                reason: format!("deck must contain exactly {} cards", DECK_SIZE),
            });
        }
        let unique: HashSet<&String> = self.deck.iter().collect();
        if unique.len() != DECK_SIZE {
            return Err(DeckError::InvalidDeck { reason: "deck contains duplicate cards".to_string() });
        }
        if !(0.0..=MAX_AVG_ELIXIR).contains(&self.avg_elixir) {
            return Err(DeckError::InvalidDeck {
                reason: format!("average elixir must be between 0 and {}", MAX_AVG_ELIXIR),
            });
        }
        Ok(())
    }
}

// ============================================================================
// 進化欄位
// ============================================================================

/// 進化欄位優先序（數字越小越優先）
pub fn evolution_priority(role: Option<Role>) -> u32 {
    match role {
        Some(Role::WinCondition) => 1,
        Some(Role::Building) => 2,
        Some(Role::SpellBig) => 3,
        Some(Role::Support) => 4,
        Some(Role::SpellSmall) => 5,
        Some(Role::Cycle) => 6,
        None => 100,
    }
}

/// 已解鎖進化的卡不超過上限時全數入選（保持牌組順序），
/// 否則依角色優先序、分數、名稱取前 `limit` 張
pub fn select_evolution_slots(picks: &[(&CardCandidate, f64)], limit: usize) -> Vec<String> {
    let mut evolved: Vec<&(&CardCandidate, f64)> =
        picks.iter().filter(|(c, _)| c.can_evolve() && c.evolution_level > 0).collect();
    if evolved.len() > limit {
        evolved.sort_by(|(a, sa), (b, sb)| {
            evolution_priority(a.role)
                .cmp(&evolution_priority(b.role))
                .then_with(|| sb.total_cmp(sa))
                .then_with(|| a.name.cmp(&b.name))
        });
        evolved.truncate(limit);
    }
    evolved.into_iter().map(|(c, _)| c.name.clone()).collect()
}

// ============================================================================
// 選牌狀態
// ============================================================================

/// 單次組牌的已選卡與協同快取
struct Selection<'p> {
    pool: &'p [CardCandidate],
    cache: Option<SynergyCache<'p>>,
    synergy_weight: f64,
    picks: Vec<(&'p CardCandidate, f64)>,
    names: Vec<String>,
}

impl<'p> Selection<'p> {
    fn new(pool: &'p [CardCandidate], synergy: Option<&'p SynergyDatabase>, synergy_weight: f64) -> Self {
        Self {
            pool,
            cache: synergy.map(SynergyCache::new),
            synergy_weight,
            picks: Vec::with_capacity(DECK_SIZE),
            names: Vec::with_capacity(DECK_SIZE),
        }
    }

    fn is_full(&self) -> bool {
        self.picks.len() >= DECK_SIZE
    }

    fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    fn push(&mut self, card: &'p CardCandidate, score: f64) {
        self.names.push(card.name.clone());
        self.picks.push((card, score));
    }

    /// 與已選卡中「有協同」者的平均協同
    fn synergy_bonus(&mut self, name: &str) -> f64 {
        let Some(cache) = self.cache.as_mut() else {
            return 0.0;
        };
        let positive: Vec<f64> = self
            .names
            .iter()
            .map(|d| cache.get(name, d))
            .filter(|&s| s > 0.0)
            .collect();
        if positive.is_empty() {
            return 0.0;
        }
        positive.iter().sum::<f64>() / positive.len() as f64
    }

    fn contextual_score(&mut self, card: &CardCandidate) -> f64 {
        card.score + self.synergy_bonus(&card.name) * self.synergy_weight
    }

    /// 挑一張指定角色（None = 任意）的最佳卡；沒有可選卡時回傳 false
    fn pick(&mut self, role: Option<Role>) -> bool {
        let pool = self.pool;
        let eligible: Vec<&'p CardCandidate> = pool
            .iter()
            .filter(|c| !self.contains(&c.name) && role.map_or(true, |r| c.has_role(r)))
            .collect();
        match pick_best(eligible, |c| self.contextual_score(c)) {
            Some((card, score)) => {
                self.push(card, score);
                true
            }
            None => false,
        }
    }
}

// ============================================================================
// 牌組推薦器
// ============================================================================

#[derive(Clone, Debug)]
pub struct DeckBuilder {
    options: PoolOptions,
    synergy_db: Option<Arc<SynergyDatabase>>,
    counter_matrix: Arc<CounterMatrix>,
    coherence: CoherenceScorer,
    include: Vec<String>,
    exclude: Vec<String>,
    evolution_slot_limit: usize,
}

impl Default for DeckBuilder {
    fn default() -> Self {
        Self::new(Strategy::default())
    }
}

impl DeckBuilder {
    pub fn new(strategy: Strategy) -> Self {
        Self {
            options: PoolOptions::new(strategy),
            synergy_db: None,
            counter_matrix: Arc::new(CounterMatrix::with_defaults()),
            coherence: CoherenceScorer::default(),
            include: Vec::new(),
            exclude: Vec::new(),
            evolution_slot_limit: MAX_EVOLUTION_SLOTS,
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.options.strategy
    }

    pub fn with_synergy(mut self, db: Arc<SynergyDatabase>) -> Self {
        self.synergy_db = Some(db);
        self
    }

    pub fn with_counter_matrix(mut self, matrix: Arc<CounterMatrix>) -> Self {
        self.counter_matrix = matrix;
        self
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.options.weights = weights;
        self
    }

    pub fn with_level_curve(mut self, curve: Arc<LevelCurve>) -> Self {
        self.options.level_curve = Some(curve);
        self
    }

    pub fn with_avoidance(mut self, avoidance: ArchetypeAvoidanceScorer) -> Self {
        self.options.avoidance = avoidance;
        self
    }

    pub fn with_uniqueness(mut self, uniqueness: UniquenessScorer) -> Self {
        self.options.uniqueness = uniqueness;
        self
    }

    pub fn with_include<S: AsRef<str>>(mut self, cards: &[S]) -> Self {
        self.include = cards.iter().map(|c| canonical_card_name(c.as_ref()).to_string()).collect();
        self
    }

    pub fn with_exclude<S: AsRef<str>>(mut self, cards: &[S]) -> Self {
        self.exclude = cards.iter().map(|c| canonical_card_name(c.as_ref()).to_string()).collect();
        self
    }

    pub fn with_evolution_slot_limit(mut self, limit: usize) -> Self {
        self.evolution_slot_limit = limit;
        self
    }

    /// 已計分、已排除指定卡的候選池
    pub fn candidates(&self, collection: &[CollectionCard]) -> Vec<CardCandidate> {
        build_candidates(collection, &self.options)
            .into_iter()
            .filter(|c| !self.exclude.contains(&c.name))
            .collect()
    }

    pub fn build(&self, collection: &[CollectionCard]) -> Result<DeckRecommendation, DeckError> {
        let pool = self.candidates(collection);
        if pool.len() < DECK_SIZE {
            return Err(DeckError::InsufficientCandidates { need: DECK_SIZE, got: pool.len() });
        }

        let strategy = self.options.strategy;
        let mut selection = Selection::new(&pool, self.synergy_db.as_deref(), self.options.weights.synergy);
        let mut notes = Vec::new();

        for name in &self.include {
            if selection.is_full() {
                break;
            }
            match pool.iter().find(|c| &c.name == name) {
                Some(card) if !selection.contains(&card.name) => selection.push(card, card.score),
                Some(_) => {}
                None => warn!(card = %name, "included card not in candidate pool"),
            }
        }

        let composition = strategy.config().composition();
        for &role in Role::all() {
            for i in 0..composition.count(role) {
                if selection.is_full() {
                    break;
                }
                if !selection.pick(Some(role)) {
                    if i == 0 && role == Role::WinCondition {
                        notes.push(NO_WIN_CONDITION_NOTE.to_string());
                    }
                    break;
                }
            }
        }

        while !selection.is_full() {
            if !selection.pick(None) {
                return Err(DeckError::InsufficientCandidates { need: DECK_SIZE, got: selection.picks.len() });
            }
        }

        let evolution_slots = select_evolution_slots(&selection.picks, self.evolution_slot_limit);
        let deck_detail: Vec<CardDetail> =
            selection.picks.iter().map(|&(c, s)| CardDetail::from_pick(c, s)).collect();
        let cards: Vec<CardCandidate> = selection.picks.iter().map(|&(c, _)| c.clone()).collect();

        let mut recommendation = DeckRecommendation {
            deck: selection.names.clone(),
            deck_detail,
            avg_elixir: 0.0,
            strategy: strategy.name().to_string(),
            notes,
            evolution_slots,
            metrics: Some(self.metrics(&cards)),
        };
        recommendation.avg_elixir = recommendation.calculate_avg_elixir();
        add_strategic_notes(&mut recommendation);

        debug!(
            strategy = strategy.name(),
            avg_elixir = recommendation.avg_elixir,
            deck = ?recommendation.deck,
            "deck recommended"
        );
        Ok(recommendation)
    }

    /// 牌組指標：一致性、協同分析、威脅覆蓋、V2 分數、冗餘、獨特性
    pub fn metrics(&self, cards: &[CardCandidate]) -> DeckMetrics {
        let strategy = self.options.strategy;
        let names: Vec<String> = cards.iter().map(|c| c.name.clone()).collect();
        let uniqueness = &self.options.uniqueness;
        DeckMetrics {
            coherence: self.coherence.analyze(cards, strategy),
            synergy: self.synergy_db.as_ref().map(|db| db.analyze_deck_synergy(&names)),
            counter_coverage: self.counter_matrix.analyze_deck_coverage(&names),
            score: score_deck_v2(cards, strategy, self.synergy_db.as_deref()),
            redundancy: analyze_redundancy(cards),
            uniqueness: uniqueness.is_enabled().then(|| uniqueness.analyze(&names)),
        }
    }
}

fn add_strategic_notes(recommendation: &mut DeckRecommendation) {
    let has_building = recommendation.deck_detail.iter().any(|c| c.role == Some(Role::Building));
    let has_spell = recommendation
        .deck_detail
        .iter()
        .any(|c| c.role.map_or(false, Role::is_spell));

    if !has_building {
        recommendation.add_note(NO_BUILDING_NOTE);
    }
    if !has_spell {
        recommendation.add_note(NO_SPELL_NOTE);
    }
    if recommendation.avg_elixir > HIGH_AVG_ELIXIR_NOTE {
        recommendation.add_note(HIGH_ELIXIR_NOTE);
    } else if recommendation.avg_elixir < LOW_AVG_ELIXIR_NOTE {
        recommendation.add_note(LOW_ELIXIR_NOTE);
    }
    if !recommendation.evolution_slots.is_empty() {
        let note = format!("Evolution slots: {}", recommendation.evolution_slots.join(", "));
        recommendation.add_note(note);
    }
}

// ============================================================================
// 單元測試
// ============================================================================
