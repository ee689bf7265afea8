//! 共現學習組牌
//!
//! 從範例牌組學習 `P(B | A)`（A 出現時 B 也出現的機率），
//! 再以機率總和貪婪地擴充牌組。

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::debug;

use crate::game::cards::{canonical_card_name, CardCandidate};
use crate::game::constants::DECK_SIZE;
use crate::service::error::DeckError;
use crate::service::strategies::{pick_best, synergy_to_deck, unused, BuilderConfig, DeckStrategy};

const LEVEL_WEIGHT: f64 = 0.1;
const SYNERGY_WEIGHT: f64 = 0.05;

// ============================================================================
// 共現矩陣
// ============================================================================

/// 卡牌共現次數；可多次學習累加
#[derive(Clone, Debug, Default)]
pub struct CoOccurrenceMatrix {
    card_count: HashMap<String, usize>,
    pair_count: HashMap<String, HashMap<String, usize>>,
}

impl CoOccurrenceMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// 牌組內重複的卡只計一次
    pub fn learn_from_decks<S: AsRef<str>>(&mut self, decks: &[Vec<S>]) {
        for deck in decks {
            let mut seen: Vec<&str> = Vec::with_capacity(deck.len());
            for name in deck {
                let name = canonical_card_name(name.as_ref());
                if !seen.contains(&name) {
                    seen.push(name);
                }
            }
            for &a in &seen {
                *self.card_count.entry(a.to_string()).or_default() += 1;
                let row = self.pair_count.entry(a.to_string()).or_default();
                for &b in seen.iter().filter(|&&b| b != a) {
                    *row.entry(b.to_string()).or_default() += 1;
                }
            }
        }
    }

    /// `P(b | a)`；`a` 未出現過時為 0
    pub fn probability(&self, a: &str, b: &str) -> f64 {
        let a = canonical_card_name(a);
        let total = self.card_count.get(a).copied().unwrap_or(0);
        if total == 0 {
            return 0.0;
        }
        let together = self
            .pair_count
            .get(a)
            .and_then(|row| row.get(canonical_card_name(b)))
            .copied()
            .unwrap_or(0);
        together as f64 / total as f64
    }

    /// 已學習的卡牌數
    pub fn len(&self) -> usize {
        self.card_count.len()
    }

    pub fn is_empty(&self) -> bool {
        self.card_count.is_empty()
    }
}

// ============================================================================
// 組牌
// ============================================================================

pub struct MetaLearningBuilder {
    config: BuilderConfig,
    co_occurrence: CoOccurrenceMatrix,
}

impl MetaLearningBuilder {
    /// 空矩陣：退化為等級與協同的貪婪法
    pub fn new(config: BuilderConfig) -> Self {
        Self { config, co_occurrence: CoOccurrenceMatrix::new() }
    }

    pub fn with_co_occurrence(config: BuilderConfig, co_occurrence: CoOccurrenceMatrix) -> Self {
        Self { config, co_occurrence }
    }

    /// 候選池中第一張勝利條件，否則隨機一張
    fn start_card(&self) -> Option<&CardCandidate> {
        self.config
            .candidates
            .iter()
            .find(|c| c.is_win_condition())
            .or_else(|| {
                let mut rng = StdRng::seed_from_u64(self.config.seed);
                self.config.candidates.choose(&mut rng)
            })
    }
}

impl DeckStrategy for MetaLearningBuilder {
    fn build(&self) -> Result<Vec<String>, DeckError> {
        self.config.ensure_pool()?;

        let start = self.start_card().ok_or_else(|| DeckError::ConstraintUnsatisfiable {
            slot: "starting card".to_string(),
        })?;
        debug!(start = %start.name, learned = self.co_occurrence.len(), "meta learning start");

        let mut cache = self.config.synergy_cache();
        let mut deck: Vec<String> = vec![start.name.clone()];
        let mut used: HashSet<String> = HashSet::from([start.name.clone()]);

        while deck.len() < DECK_SIZE {
            let best = pick_best(unused(&self.config.candidates, &used), |c| {
                let probability: f64 = deck.iter().map(|d| self.co_occurrence.probability(d, &c.name)).sum();
                probability
                    + c.level_ratio() * LEVEL_WEIGHT
                    + synergy_to_deck(&mut cache, &c.name, &deck) * SYNERGY_WEIGHT
            })
            .map(|(c, _)| c);

            let card = match best.or_else(|| unused(&self.config.candidates, &used).next()) {
                Some(card) => card,
                None => {
                    return Err(DeckError::ConstraintUnsatisfiable {
                        slot: format!("card {} of {}", deck.len() + 1, DECK_SIZE),
                    })
                }
            };
            used.insert(card.name.clone());
            deck.push(card.name.clone());
        }

        Ok(deck)
    }

    fn name(&self) -> &'static str {
        "meta_learning"
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::Role;
    use crate::service::strategies::tests::{assert_valid_deck, candidate, sample_pool};

    fn sample_decks() -> Vec<Vec<&'static str>> {
        vec![
            vec!["Hog Rider", "Fireball", "Musketeer", "Ice Spirit"],
            vec!["Hog Rider", "Fireball", "Valkyrie", "The Log"],
            vec!["Golem", "Fireball", "Baby Dragon", "Zap"],
        ]
    }

    #[test]
    fn test_co_occurrence_probability() {
        let mut matrix = CoOccurrenceMatrix::new();
        matrix.learn_from_decks(&sample_decks());

        assert_eq!(matrix.probability("Hog Rider", "Fireball"), 1.0);
        assert!((matrix.probability("Fireball", "Hog Rider") - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(matrix.probability("Hog Rider", "Golem"), 0.0);
        assert_eq!(matrix.probability("Unknown", "Fireball"), 0.0);
        // 別名正規化
        assert_eq!(matrix.probability("Hog Rider", "Log"), 0.5);
    }

    #[test]
    fn test_learning_accumulates() {
        let mut matrix = CoOccurrenceMatrix::new();
        matrix.learn_from_decks(&sample_decks());
        matrix.learn_from_decks(&[vec!["Hog Rider", "Hog Rider", "Zap"]]);
        // Hog Rider 出現在 3 副牌組，其中 2 副有 Fireball
        assert!((matrix.probability("Hog Rider", "Fireball") - 2.0 / 3.0).abs() < 1e-9);
        assert!((matrix.probability("Hog Rider", "Zap") - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_builds_from_learned_decks() {
        let pool = sample_pool();
        let mut matrix = CoOccurrenceMatrix::new();
        matrix.learn_from_decks(&sample_decks());

        let builder = MetaLearningBuilder::with_co_occurrence(BuilderConfig::new(pool.clone()), matrix);
        let deck = builder.build().unwrap();
        assert_valid_deck(&deck, &pool);
        assert_eq!(deck[0], "Hog Rider");
        // P(Fireball | Hog Rider) = 1.0 最高
        assert_eq!(deck[1], "Fireball");
    }

    #[test]
    fn test_random_start_is_seeded() {
        let pool: Vec<CardCandidate> = (0..10)
            .map(|i| candidate(&format!("Troop {}", i), 3, Role::Support, 10))
            .collect();
        let mut config = BuilderConfig::new(pool.clone());
        config.seed = 7;
        let a = MetaLearningBuilder::new(config.clone()).build().unwrap();
        let b = MetaLearningBuilder::new(config).build().unwrap();
        assert_valid_deck(&a, &pool);
        assert_eq!(a, b);
    }
}
