//! 蒙地卡羅牌組產生器
//!
//! 從玩家收藏隨機產生合法的 8 張牌組，三種模式：
//!
//! - 標準：依角色配置做加權抽樣（權重 = 卡牌分數），不足時隨機補、再依分數補
//! - 協同優先：4 組不重疊的協同配對，不足時隨機補
//! - 進化核心：先選進化潛力最高的 N 張，再依角色補滿，最後驗證進化卡數量
//!
//! 每次嘗試都檢查平均聖水、必選與排除清單；失敗重試，最多 100 次。

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::game::archetypes::Archetype;
use crate::game::cards::{canonical_card_name, CardCandidate, Role, ROLE_COUNT};
use crate::game::coherence::detect_archetype;
use crate::game::constants::{DECK_SIZE, MAX_AVG_ELIXIR, MAX_GENERATION_ATTEMPTS};
use crate::game::deck_scorer::{archetype_free_score, score_deck_v2};
use crate::game::redundancy::analyze_redundancy;
use crate::game::scoring::rank_order;
use crate::game::strategy::{RoleComposition, Strategy};
use crate::game::synergy::SynergyDatabase;
use crate::service::error::DeckError;
use crate::service::scoring::CollectionCard;

/// 單卡抽樣權重的放大倍數（等級比例 × 10）
const SAMPLE_SCORE_SCALE: f64 = 10.0;
const SYNERGY_PAIRS_PER_DECK: usize = 4;
const EVOLUTION_LEVEL_BONUS: f64 = 3.0;
const EVOLUTION_HEADROOM_BONUS: f64 = 2.0;

// ============================================================================
// 設定
// ============================================================================

#[derive(Clone, Debug)]
pub struct FuzzingConfig {
    pub count: usize,
    pub workers: usize,
    /// 0 表示以系統亂數初始化
    pub seed: u64,
    pub include_cards: Vec<String>,
    pub exclude_cards: Vec<String>,
    pub min_avg_elixir: f64,
    pub max_avg_elixir: f64,
    pub synergy_first: bool,
    pub evolution_centric: bool,
    pub min_evolution_cards: usize,
    pub min_evo_level: u32,
    pub evo_weight: f64,
    /// `evaluate` 使用的策略
    pub strategy: Strategy,
}

impl Default for FuzzingConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            workers: 1,
            seed: 0,
            include_cards: Vec::new(),
            exclude_cards: Vec::new(),
            min_avg_elixir: 0.0,
            max_avg_elixir: MAX_AVG_ELIXIR,
            synergy_first: false,
            evolution_centric: false,
            min_evolution_cards: 3,
            min_evo_level: 1,
            evo_weight: 0.3,
            strategy: Strategy::Balanced,
        }
    }
}

impl FuzzingConfig {
    /// 將非法值換回預設值
    fn normalized(mut self) -> Self {
        let defaults = Self::default();
        if self.count == 0 {
            self.count = defaults.count;
        }
        if self.workers == 0 {
            self.workers = defaults.workers;
        }
        if self.min_avg_elixir < 0.0 || self.min_avg_elixir.is_nan() {
            self.min_avg_elixir = 0.0;
        }
        if !(self.max_avg_elixir > 0.0 && self.max_avg_elixir <= MAX_AVG_ELIXIR) {
            self.max_avg_elixir = MAX_AVG_ELIXIR;
        }
        if self.min_evolution_cards == 0 {
            self.min_evolution_cards = defaults.min_evolution_cards;
        }
        if !(self.evo_weight > 0.0) {
            self.evo_weight = defaults.evo_weight;
        }
        self.include_cards = canonical_names(&self.include_cards);
        self.exclude_cards = canonical_names(&self.exclude_cards);
        self
    }
}

/// 去除空白、正規化別名、去重（保留順序）
fn canonical_names(names: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = canonical_card_name(name.trim());
        if !name.is_empty() && !out.iter().any(|n| n == name) {
            out.push(name.to_string());
        }
    }
    out
}

// ============================================================================
// 統計與結果
// ============================================================================

/// 統計快照；`generated` 以嘗試次數計，`skipped_exclude` 為建立時被排除清單移出候選池的卡數
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FuzzingStats {
    pub generated: usize,
    pub success: usize,
    pub failed: usize,
    pub skipped_elixir: usize,
    pub skipped_include: usize,
    pub skipped_exclude: usize,
    pub unique_decks: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FuzzedDeck {
    pub deck: Vec<String>,
    pub avg_elixir: f64,
    pub overall_score: f64,
    pub synergy_score: f64,
    pub archetype_free_score: f64,
    /// 角色冗餘懲罰 [0, 1]
    pub redundancy_penalty: f64,
    pub archetype: Option<Archetype>,
}

/// 單次嘗試被拒的原因，不會離開本模組
#[derive(Debug)]
enum Rejection {
    IncludeUnavailable(String),
    Incomplete(usize),
    NotEnoughPairs(usize),
    NotEnoughEvolution { found: usize, need: usize },
    ElixirOutOfRange(f64),
    MissingInclude(String),
}

/// 嘗試中的牌組，最多 8 張且不重複
#[derive(Default)]
struct Draft {
    deck: Vec<String>,
}

impl Draft {
    fn contains(&self, name: &str) -> bool {
        self.deck.iter().any(|n| n == name)
    }

    fn push(&mut self, name: &str) -> bool {
        if self.deck.len() >= DECK_SIZE || self.contains(name) {
            return false;
        }
        self.deck.push(name.to_string());
        true
    }

    fn remaining(&self) -> usize {
        DECK_SIZE.saturating_sub(self.deck.len())
    }

    fn is_full(&self) -> bool {
        self.deck.len() >= DECK_SIZE
    }
}

// ============================================================================
// 產生器
// ============================================================================

pub struct DeckFuzzer {
    config: FuzzingConfig,
    composition: RoleComposition,
    all_cards: Vec<CardCandidate>,
    cards_by_role: [Vec<CardCandidate>; ROLE_COUNT],
    synergy_db: Arc<SynergyDatabase>,
    /// 僅供循序路徑使用
    rng: Mutex<StdRng>,
    stats: Mutex<FuzzingStats>,
    signatures: DashMap<String, usize>,
}

impl DeckFuzzer {
    /// 收藏少於 8 張時失敗；排除清單中的卡不會進入候選池
    pub fn new(cards: &[CollectionCard], config: FuzzingConfig) -> Result<Self, DeckError> {
        Self::with_synergy(cards, config, Arc::new(SynergyDatabase::new()))
    }

    pub fn with_synergy(
        cards: &[CollectionCard],
        config: FuzzingConfig,
        synergy_db: Arc<SynergyDatabase>,
    ) -> Result<Self, DeckError> {
        if cards.len() < DECK_SIZE {
            return Err(DeckError::InsufficientCandidates { need: DECK_SIZE, got: cards.len() });
        }
        let config = config.normalized();

        let mut all_cards: Vec<CardCandidate> = Vec::with_capacity(cards.len());
        let mut cards_by_role: [Vec<CardCandidate>; ROLE_COUNT] = Default::default();
        let mut stats = FuzzingStats::default();
        for card in cards {
            let mut candidate = card.to_candidate();
            if candidate.name.is_empty() || all_cards.iter().any(|c| c.name == candidate.name) {
                continue;
            }
            if config.exclude_cards.contains(&candidate.name) {
                stats.skipped_exclude += 1;
                continue;
            }
            candidate.score = sample_score(&candidate);
            if let Some(role) = candidate.role {
                cards_by_role[role.to_index()].push(candidate.clone());
            }
            all_cards.push(candidate);
        }

        let rng = if config.seed == 0 { StdRng::from_entropy() } else { StdRng::seed_from_u64(config.seed) };
        debug!(pool = all_cards.len(), excluded = stats.skipped_exclude, seed = config.seed, "fuzzer ready");

        Ok(Self {
            config,
            composition: RoleComposition::default(),
            all_cards,
            cards_by_role,
            synergy_db,
            rng: Mutex::new(rng),
            stats: Mutex::new(stats),
            signatures: DashMap::new(),
        })
    }

    pub fn config(&self) -> &FuzzingConfig {
        &self.config
    }

    pub fn set_role_composition(&mut self, composition: RoleComposition) {
        self.composition = composition;
    }

    pub fn cards_by_role(&self, role: Role) -> &[CardCandidate] {
        &self.cards_by_role[role.to_index()]
    }

    pub fn all_cards(&self) -> &[CardCandidate] {
        &self.all_cards
    }

    pub fn stats(&self) -> FuzzingStats {
        let mut snapshot = self.lock_stats().clone();
        snapshot.unique_decks = self.signatures.len();
        snapshot
    }

    fn lock_stats(&self) -> std::sync::MutexGuard<'_, FuzzingStats> {
        self.stats.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ========================================================================
    // 單副牌組
    // ========================================================================

    /// 使用共用亂數產生一副牌組
    pub fn generate_random_deck(&self) -> Result<Vec<String>, DeckError> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.generate_random_deck_with_rng(&mut rng)
    }

    /// 由呼叫端提供亂數，可在多執行緒下使用
    pub fn generate_random_deck_with_rng(&self, rng: &mut StdRng) -> Result<Vec<String>, DeckError> {
        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let attempted = if self.config.synergy_first {
                self.synergy_attempt(rng)
            } else if self.config.evolution_centric {
                self.evolution_attempt(rng)
            } else {
                self.standard_attempt(rng)
            };

            match attempted.and_then(|deck| self.validate(deck)) {
                Ok(deck) => {
                    self.record_success(&deck);
                    return Ok(deck);
                }
                Err(rejection) => {
                    self.record_failure();
                    debug!(attempt, ?rejection, "fuzzer attempt rejected");
                }
            }
        }
        warn!(attempts = MAX_GENERATION_ATTEMPTS, "fuzzer gave up on deck");
        Err(DeckError::GenerationExhausted { attempts: MAX_GENERATION_ATTEMPTS })
    }

    /// 必選卡優先放入
    fn start_draft(&self) -> Result<Draft, Rejection> {
        let mut draft = Draft::default();
        for name in &self.config.include_cards {
            if !self.is_available(name) {
                return Err(Rejection::IncludeUnavailable(name.clone()));
            }
            draft.push(name);
        }
        Ok(draft)
    }

    fn standard_attempt(&self, rng: &mut StdRng) -> Result<Vec<String>, Rejection> {
        let mut draft = self.start_draft()?;

        for &role in Role::all() {
            let want = self.composition.count(role).min(draft.remaining());
            if want == 0 {
                continue;
            }
            let picked = self.sample_role(rng, role, want, &draft);
            for name in &picked {
                draft.push(name);
            }
            if picked.len() < want {
                self.fill_shuffled(rng, want - picked.len(), &mut draft);
            }
        }

        self.fill_highest_score(&mut draft);
        Ok(draft.deck)
    }

    fn synergy_attempt(&self, rng: &mut StdRng) -> Result<Vec<String>, Rejection> {
        let mut pairs: Vec<(&str, &str)> = self
            .synergy_db
            .pairs()
            .iter()
            .filter(|p| self.is_available(&p.card1) && self.is_available(&p.card2))
            .map(|p| (p.card1.as_str(), p.card2.as_str()))
            .collect();
        if pairs.len() < SYNERGY_PAIRS_PER_DECK {
            return Err(Rejection::NotEnoughPairs(pairs.len()));
        }

        let mut draft = self.start_draft()?;
        pairs.shuffle(rng);

        let mut selected = 0;
        for (a, b) in pairs {
            if selected >= SYNERGY_PAIRS_PER_DECK || draft.remaining() < 2 {
                break;
            }
            if draft.contains(a) || draft.contains(b) {
                continue;
            }
            draft.push(a);
            draft.push(b);
            selected += 1;
        }

        self.fill_shuffled(rng, draft.remaining(), &mut draft);
        Ok(draft.deck)
    }

    fn evolution_attempt(&self, rng: &mut StdRng) -> Result<Vec<String>, Rejection> {
        let mut draft = self.start_draft()?;

        let need = self.config.min_evolution_cards.min(draft.remaining());
        let evolution_cards: Vec<&CardCandidate> = self
            .ranked_by_evolution()
            .into_iter()
            .filter(|c| !draft.contains(&c.name) && self.is_evolution_eligible(c))
            .take(need)
            .collect();
        if evolution_cards.len() < need {
            return Err(Rejection::NotEnoughEvolution { found: evolution_cards.len(), need });
        }
        for card in evolution_cards {
            draft.push(&card.name);
        }

        for &role in Role::all() {
            let want = self.composition.count(role).min(draft.remaining());
            if want == 0 {
                continue;
            }
            for name in self.sample_role(rng, role, want, &draft) {
                draft.push(&name);
            }
        }
        self.fill_highest_score(&mut draft);

        let found = draft
            .deck
            .iter()
            .filter_map(|n| self.card(n))
            .filter(|c| self.is_evolution_eligible(c))
            .count();
        if found < self.config.min_evolution_cards {
            return Err(Rejection::NotEnoughEvolution { found, need: self.config.min_evolution_cards });
        }
        Ok(draft.deck)
    }

    /// 張數、平均聖水、必選清單；排除的卡在建立時已移出候選池
    fn validate(&self, deck: Vec<String>) -> Result<Vec<String>, Rejection> {
        if deck.len() != DECK_SIZE {
            return Err(Rejection::Incomplete(deck.len()));
        }

        let avg = self.average_elixir(&deck);
        if avg < self.config.min_avg_elixir || avg > self.config.max_avg_elixir {
            self.lock_stats().skipped_elixir += 1;
            return Err(Rejection::ElixirOutOfRange(avg));
        }
        if let Some(missing) = self.config.include_cards.iter().find(|n| !deck.contains(n)) {
            self.lock_stats().skipped_include += 1;
            return Err(Rejection::MissingInclude(missing.clone()));
        }
        Ok(deck)
    }

    // ========================================================================
    // 抽樣
    // ========================================================================

    /// 依分數加權、不放回地抽取某角色的卡
    fn sample_role(&self, rng: &mut StdRng, role: Role, count: usize, draft: &Draft) -> Vec<String> {
        let mut available: Vec<&CardCandidate> = self.cards_by_role[role.to_index()]
            .iter()
            .filter(|c| !draft.contains(&c.name))
            .collect();

        let mut picked = Vec::with_capacity(count);
        while picked.len() < count && !available.is_empty() {
            let total: f64 = available.iter().map(|c| c.score).sum();
            let target = rng.gen::<f64>() * total;

            let mut cumulative = 0.0;
            let index = available
                .iter()
                .position(|c| {
                    cumulative += c.score;
                    target <= cumulative
                })
                .unwrap_or_else(|| rng.gen_range(0..available.len()));

            picked.push(available.remove(index).name.clone());
        }
        picked
    }

    /// 從整個候選池隨機補 `count` 張
    fn fill_shuffled(&self, rng: &mut StdRng, count: usize, draft: &mut Draft) {
        let mut available: Vec<&CardCandidate> =
            self.all_cards.iter().filter(|c| !draft.contains(&c.name)).collect();
        available.shuffle(rng);
        for card in available.into_iter().take(count) {
            draft.push(&card.name);
        }
    }

    fn fill_highest_score(&self, draft: &mut Draft) {
        if draft.is_full() {
            return;
        }
        let mut available: Vec<&CardCandidate> =
            self.all_cards.iter().filter(|c| !draft.contains(&c.name)).collect();
        available.sort_by(|a, b| rank_order((a.score, &a.name), (b.score, &b.name)));
        for card in available {
            if !draft.push(&card.name) {
                break;
            }
        }
    }

    /// 等級分數加上進化等級與可進化空間的加分
    fn evolution_score(&self, card: &CardCandidate) -> f64 {
        let mut score = sample_score(card);
        if card.evolution_level >= self.config.min_evo_level {
            score += card.evolution_level as f64 * EVOLUTION_LEVEL_BONUS * self.config.evo_weight;
        }
        if card.evolution_level < card.max_evolution_level {
            score += EVOLUTION_HEADROOM_BONUS * self.config.evo_weight;
        }
        score
    }

    fn ranked_by_evolution(&self) -> Vec<&CardCandidate> {
        let mut ranked: Vec<(&CardCandidate, f64)> =
            self.all_cards.iter().map(|c| (c, self.evolution_score(c))).collect();
        ranked.sort_by(|a, b| rank_order((a.1, &a.0.name), (b.1, &b.0.name)));
        ranked.into_iter().map(|(c, _)| c).collect()
    }

    fn is_evolution_eligible(&self, card: &CardCandidate) -> bool {
        card.evolution_level >= self.config.min_evo_level
            || (card.max_evolution_level > 0 && card.evolution_level < card.max_evolution_level)
    }

    fn card(&self, name: &str) -> Option<&CardCandidate> {
        self.all_cards.iter().find(|c| c.name == name)
    }

    fn is_available(&self, name: &str) -> bool {
        self.card(name).is_some()
    }

    fn average_elixir(&self, deck: &[String]) -> f64 {
        if deck.is_empty() {
            return 0.0;
        }
        let total: u32 = deck.iter().filter_map(|n| self.card(n)).map(|c| c.elixir).sum();
        total as f64 / deck.len() as f64
    }

    fn record_success(&self, deck: &[String]) {
        {
            let mut stats = self.lock_stats();
            stats.generated += 1;
            stats.success += 1;
        }
        *self.signatures.entry(deck_signature(deck)).or_insert(0) += 1;
    }

    fn record_failure(&self) {
        let mut stats = self.lock_stats();
        stats.generated += 1;
        stats.failed += 1;
    }

    // ========================================================================
    // 批次
    // ========================================================================

    /// 循序產生，失敗的牌組直接略過
    pub fn generate_decks(&self, count: usize) -> Vec<Vec<String>> {
        let decks: Vec<Vec<String>> = (0..count).filter_map(|_| self.generate_random_deck().ok()).collect();
        info!(requested = count, generated = decks.len(), "fuzzing finished");
        decks
    }

    /// 固定數量的工作執行緒，每個執行緒有自己的亂數與工作佇列
    ///
    /// 工作依序輪流分派（第 i 件給 `i % workers`），種子與工作數固定時，
    /// 產生的牌組集合與執行緒排程無關；結果順序不固定。
    pub fn generate_decks_parallel(&self) -> Vec<Vec<String>> {
        let workers = self.config.workers;
        let count = self.config.count;
        if workers <= 1 {
            return self.generate_decks(count);
        }

        let (work_txs, work_rxs): (Vec<_>, Vec<_>) = (0..workers).map(|_| mpsc::channel::<usize>()).unzip();
        for job in 0..count {
            // 接收端在本函式內，送出不會失敗
            let _ = work_txs[job % workers].send(job);
        }
        drop(work_txs);
        let (result_tx, result_rx) = mpsc::channel::<Vec<String>>();

        thread::scope(|scope| {
            for (worker, work_rx) in work_rxs.into_iter().enumerate() {
                let result_tx = result_tx.clone();
                let seed = worker_seed(self.config.seed, worker, workers);
                scope.spawn(move || {
                    let mut rng = StdRng::seed_from_u64(seed);
                    for _job in work_rx {
                        if let Ok(deck) = self.generate_random_deck_with_rng(&mut rng) {
                            if result_tx.send(deck).is_err() {
                                break;
                            }
                        }
                    }
                });
            }
        });
        drop(result_tx);

        let decks: Vec<Vec<String>> = result_rx.into_iter().collect();
        info!(requested = count, generated = decks.len(), workers, "parallel fuzzing finished");
        decks
    }

    // ========================================================================
    // 評估
    // ========================================================================

    /// 以 V2 評分、協同、原型無關適性與冗餘懲罰評估一副牌組；不在候選池的卡名被忽略
    pub fn evaluate(&self, deck: &[String]) -> FuzzedDeck {
        let cards: Vec<CardCandidate> = deck.iter().filter_map(|n| self.card(n)).cloned().collect();
        let names: Vec<&str> = cards.iter().map(|c| c.name.as_str()).collect();
        let score = score_deck_v2(&cards, self.config.strategy, Some(&self.synergy_db));

        FuzzedDeck {
            deck: deck.to_vec(),
            avg_elixir: self.average_elixir(deck),
            overall_score: score.final_score,
            synergy_score: score.synergy,
            archetype_free_score: archetype_free_score(&cards, Some(&self.synergy_db)),
            redundancy_penalty: analyze_redundancy(&cards).penalty,
            archetype: detect_archetype(&names).1,
        }
    }
}

/// 第 `worker` 個執行緒的種子：`seed + worker × workers`
pub fn worker_seed(seed: u64, worker: usize, workers: usize) -> u64 {
    seed.wrapping_add((worker as u64).wrapping_mul(workers as u64))
}

/// 抽樣權重：單純的等級比例（不含進化）
fn sample_score(card: &CardCandidate) -> f64 {
    if card.max_level == 0 {
        return 0.0;
    }
    card.level as f64 / card.max_level as f64 * SAMPLE_SCORE_SCALE
}

/// 與順序無關的牌組識別字串
fn deck_signature(deck: &[String]) -> String {
    let mut names: Vec<&str> = deck.iter().map(String::as_str).collect();
    names.sort_unstable();
    names.join("|")
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn collection() -> Vec<CollectionCard> {
        vec![
            CollectionCard::new("Hog Rider", 13, 14, "Rare"),
            CollectionCard::new("Giant", 11, 14, "Rare"),
            CollectionCard::new("Fireball", 12, 14, "Rare"),
            CollectionCard::new("Zap", 12, 14, "Common"),
            CollectionCard::new("The Log", 11, 14, "Legendary"),
            CollectionCard::new("Musketeer", 12, 14, "Rare"),
            CollectionCard::new("Valkyrie", 12, 14, "Rare"),
            CollectionCard::new("Knight", 13, 14, "Common"),
            CollectionCard::new("Cannon", 12, 14, "Common"),
            CollectionCard::new("Bomb Tower", 10, 14, "Rare"),
            CollectionCard::new("Inferno Tower", 10, 14, "Rare"),
            CollectionCard::new("Ice Spirit", 13, 14, "Common"),
            CollectionCard::new("Skeletons", 13, 14, "Common"),
        ]
    }

    fn seeded(config: FuzzingConfig) -> FuzzingConfig {
        FuzzingConfig { seed: 42, ..config }
    }

    fn assert_valid(deck: &[String], fuzzer: &DeckFuzzer) {
        assert_eq!(deck.len(), DECK_SIZE);
        let unique: HashSet<&String> = deck.iter().collect();
        assert_eq!(unique.len(), DECK_SIZE, "duplicates in {:?}", deck);
        for name in deck {
            assert!(fuzzer.all_cards().iter().any(|c| &c.name == name), "{} not owned", name);
        }
    }

    #[test]
    fn test_requires_eight_cards() {
        let cards: Vec<CollectionCard> = collection().into_iter().take(7).collect();
        assert!(matches!(
            DeckFuzzer::new(&cards, FuzzingConfig::default()),
            Err(DeckError::InsufficientCandidates { need: 8, got: 7 })
        ));
    }

    #[test]
    fn test_config_normalized() {
        let config = FuzzingConfig {
            count: 0,
            workers: 0,
            min_avg_elixir: -1.0,
            max_avg_elixir: 15.0,
            min_evolution_cards: 0,
            evo_weight: 0.0,
            include_cards: vec![" The Log ".to_string(), "Log".to_string()],
            ..Default::default()
        };
        let fuzzer = DeckFuzzer::new(&collection(), config).unwrap();
        let config = fuzzer.config();
        assert_eq!(config.count, 1000);
        assert_eq!(config.workers, 1);
        assert_eq!(config.min_avg_elixir, 0.0);
        assert_eq!(config.max_avg_elixir, 10.0);
        assert_eq!(config.min_evolution_cards, 3);
        assert_eq!(config.evo_weight, 0.3);
        assert_eq!(config.include_cards, vec!["Log".to_string()]);
    }

    #[test]
    fn test_generate_with_wide_bounds() {
        let fuzzer = DeckFuzzer::new(&collection(), seeded(FuzzingConfig::default())).unwrap();
        let decks = fuzzer.generate_decks(20);
        assert_eq!(decks.len(), 20);
        for deck in &decks {
            assert_valid(deck, &fuzzer);
        }
        let stats = fuzzer.stats();
        assert_eq!(stats.success, 20);
        assert_eq!(stats.failed, 0);
        assert!(stats.unique_decks >= 1);
    }

    #[test]
    fn test_unavailable_include_always_fails() {
        let config = seeded(FuzzingConfig { include_cards: vec!["Mega Knight".to_string()], ..Default::default() });
        let fuzzer = DeckFuzzer::new(&collection(), config).unwrap();

        let err = fuzzer.generate_random_deck().unwrap_err();
        assert!(matches!(err, DeckError::GenerationExhausted { attempts: 100 }));
        assert!(fuzzer.generate_decks(3).is_empty());
        assert_eq!(fuzzer.stats().success, 0);
    }

    #[test]
    fn test_include_and_exclude_honored() {
        let config = seeded(FuzzingConfig {
            include_cards: vec!["Giant".to_string()],
            exclude_cards: vec!["hog".to_string()],
            ..Default::default()
        });
        let fuzzer = DeckFuzzer::new(&collection(), config).unwrap();
        assert!(fuzzer.cards_by_role(Role::WinCondition).iter().all(|c| c.name != "Hog Rider"));
        assert_eq!(fuzzer.stats().skipped_exclude, 1);

        for deck in fuzzer.generate_decks(10) {
            assert_valid(&deck, &fuzzer);
            assert!(deck.contains(&"Giant".to_string()));
            assert!(!deck.contains(&"Hog Rider".to_string()));
        }
    }

    #[test]
    fn test_impossible_elixir_bounds() {
        let config = seeded(FuzzingConfig { min_avg_elixir: 9.0, ..Default::default() });
        let fuzzer = DeckFuzzer::new(&collection(), config).unwrap();
        assert!(fuzzer.generate_random_deck().is_err());
        let stats = fuzzer.stats();
        assert_eq!(stats.skipped_elixir, MAX_GENERATION_ATTEMPTS);
        assert_eq!(stats.failed, MAX_GENERATION_ATTEMPTS);
    }

    #[test]
    fn test_seeded_runs_repeat() {
        let a = DeckFuzzer::new(&collection(), seeded(FuzzingConfig::default())).unwrap();
        let b = DeckFuzzer::new(&collection(), seeded(FuzzingConfig::default())).unwrap();
        assert_eq!(a.generate_decks(5), b.generate_decks(5));
    }

    #[test]
    fn test_synergy_first_uses_pairs() {
        let config = seeded(FuzzingConfig { synergy_first: true, ..Default::default() });
        let fuzzer = DeckFuzzer::new(&collection(), config).unwrap();
        let db = SynergyDatabase::new();

        for deck in fuzzer.generate_decks(10) {
            assert_valid(&deck, &fuzzer);
            let mut pairs = 0;
            for (i, a) in deck.iter().enumerate() {
                for b in &deck[i + 1..] {
                    if db.get_synergy(a, b) > 0.0 {
                        pairs += 1;
                    }
                }
            }
            assert!(pairs >= SYNERGY_PAIRS_PER_DECK, "{:?}", deck);
        }
    }

    #[test]
    fn test_synergy_first_needs_four_pairs() {
        let cards: Vec<CollectionCard> = ["Golem", "Skeletons", "Goblins", "Arrows", "Rocket", "Archers", "Bomber", "Wizard"]
            .iter()
            .map(|n| CollectionCard::new(n, 10, 14, "Common"))
            .collect();
        let config = seeded(FuzzingConfig { synergy_first: true, ..Default::default() });
        let fuzzer = DeckFuzzer::new(&cards, config).unwrap();
        assert!(fuzzer.generate_random_deck().is_err());
    }

    #[test]
    fn test_evolution_centric() {
        let mut cards = collection();
        for card in cards.iter_mut().filter(|c| ["Knight", "Valkyrie", "Skeletons"].contains(&c.name.as_str())) {
            card.max_evolution_level = 1;
        }
        cards[7].evolution_level = 1;

        let config = seeded(FuzzingConfig { evolution_centric: true, ..Default::default() });
        let fuzzer = DeckFuzzer::new(&cards, config).unwrap();
        let deck = fuzzer.generate_random_deck().unwrap();
        assert_valid(&deck, &fuzzer);
        // 進化等級最高的 Knight 排第一
        assert_eq!(deck[0], "Knight");
        for name in ["Knight", "Valkyrie", "Skeletons"] {
            assert!(deck.contains(&name.to_string()));
        }

        let config = seeded(FuzzingConfig { evolution_centric: true, min_evolution_cards: 4, ..Default::default() });
        let fuzzer = DeckFuzzer::new(&cards, config).unwrap();
        assert!(fuzzer.generate_random_deck().is_err());
    }

    #[test]
    fn test_role_composition_respected() {
        let mut fuzzer = DeckFuzzer::new(&collection(), seeded(FuzzingConfig::default())).unwrap();
        fuzzer.set_role_composition(RoleComposition::new(2, 1, 1, 1, 1, 2));
        for deck in fuzzer.generate_decks(10) {
            assert!(deck.contains(&"Hog Rider".to_string()));
            assert!(deck.contains(&"Giant".to_string()));
        }
    }

    #[test]
    fn test_parallel_generation() {
        let config = seeded(FuzzingConfig { count: 40, workers: 4, ..Default::default() });
        let fuzzer = DeckFuzzer::new(&collection(), config).unwrap();
        let decks = fuzzer.generate_decks_parallel();
        assert_eq!(decks.len(), 40);
        for deck in &decks {
            assert_valid(deck, &fuzzer);
        }
        assert_eq!(fuzzer.stats().success, 40);
    }

    #[test]
    fn test_excluded_cards_counted_at_construction() {
        let config = FuzzingConfig {
            exclude_cards: vec!["hog".to_string(), "Zap".to_string(), "Mega Knight".to_string()],
            ..Default::default()
        };
        let fuzzer = DeckFuzzer::new(&collection(), config).unwrap();
        assert_eq!(fuzzer.all_cards().len(), collection().len() - 2);
        assert_eq!(fuzzer.stats().skipped_exclude, 2);
    }

    #[test]
    fn test_worker_seed() {
        assert_eq!(worker_seed(42, 0, 4), 42);
        assert_eq!(worker_seed(42, 1, 4), 46);
        assert_eq!(worker_seed(42, 3, 4), 54);
        assert_eq!(worker_seed(u64::MAX, 1, 2), 1);
    }

    fn sorted(mut decks: Vec<Vec<String>>) -> Vec<Vec<String>> {
        decks.sort();
        decks
    }

    #[test]
    fn test_parallel_runs_repeat_with_pinned_seed() {
        let config = || seeded(FuzzingConfig { count: 24, workers: 3, ..Default::default() });
        let first = DeckFuzzer::new(&collection(), config()).unwrap().generate_decks_parallel();
        let second = DeckFuzzer::new(&collection(), config()).unwrap().generate_decks_parallel();
        assert_eq!(first.len(), 24);
        assert_eq!(sorted(first), sorted(second));
    }

    #[test]
    fn test_parallel_workers_follow_serial_streams() {
        // 2 個執行緒各 3 件：worker 0 用種子 42，worker 1 用 42 + 1 × 2
        let config = seeded(FuzzingConfig { count: 6, workers: 2, ..Default::default() });
        let parallel = DeckFuzzer::new(&collection(), config).unwrap().generate_decks_parallel();

        let serial = |seed: u64| {
            let fuzzer = DeckFuzzer::new(&collection(), FuzzingConfig { seed, ..Default::default() }).unwrap();
            fuzzer.generate_decks(3)
        };
        let worker_zero = serial(42);
        for deck in &worker_zero {
            assert!(parallel.contains(deck), "{:?} missing", deck);
        }

        let mut expected = worker_zero;
        expected.extend(serial(worker_seed(42, 1, 2)));
        assert_eq!(sorted(parallel), sorted(expected));
    }

    #[test]
    fn test_evaluate() {
        let fuzzer = DeckFuzzer::new(&collection(), seeded(FuzzingConfig::default())).unwrap();
        let deck: Vec<String> = ["Hog Rider", "Fireball", "Log", "Musketeer", "Valkyrie", "Cannon", "Ice Spirit", "Skeletons"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let result = fuzzer.evaluate(&deck);
        assert!((result.avg_elixir - 2.875).abs() < 1e-9);
        assert!(result.overall_score > 0.0 && result.overall_score <= 1.0);
        assert!(result.synergy_score > 0.0);
        assert!(result.archetype_free_score > 0.0);
        assert!((0.0..=1.0).contains(&result.redundancy_penalty));
        assert!(result.archetype.is_some());
    }
}
