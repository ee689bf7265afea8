//! 協同圖組牌
//!
//! 將協同資料庫視為加權圖（節點 = 候選卡，邊 = 協同分數），
//! 以貪婪法挑選 8 個節點使邊權總和最大。

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::game::cards::CardCandidate;
use crate::game::constants::DECK_SIZE;
use crate::service::error::DeckError;
use crate::service::strategies::{pick_best, unused, BuilderConfig, DeckStrategy};

/// 起手卡為勝利條件時的加分
const WIN_CONDITION_START_BONUS: f64 = 0.5;
const MISSING_WIN_CONDITION_BONUS: f64 = 0.3;
const MISSING_SPELL_BONUS: f64 = 0.2;
const MISSING_AIR_BONUS: f64 = 0.2;

pub struct SynergyGraphBuilder {
    config: BuilderConfig,
    /// 卡名 → {鄰居 → 權重}，只含候選池內的卡
    graph: HashMap<String, HashMap<String, f64>>,
}

impl SynergyGraphBuilder {
    pub fn new(config: BuilderConfig) -> Result<Self, DeckError> {
        let db = config
            .synergy_db
            .as_deref()
            .ok_or(DeckError::MissingDependency("synergy database"))?;

        let pool: HashSet<&str> = config.candidates.iter().map(|c| c.name.as_str()).collect();
        let mut graph: HashMap<String, HashMap<String, f64>> = HashMap::new();
        for pair in db.pairs() {
            if !pool.contains(pair.card1.as_str()) || !pool.contains(pair.card2.as_str()) {
                continue;
            }
            graph.entry(pair.card1.clone()).or_default().insert(pair.card2.clone(), pair.score);
            graph.entry(pair.card2.clone()).or_default().insert(pair.card1.clone(), pair.score);
        }

        Ok(Self { config, graph })
    }

    fn edge(&self, a: &str, b: &str) -> f64 {
        self.graph.get(a).and_then(|n| n.get(b)).copied().unwrap_or(0.0)
    }

    /// 鄰居權重總和
    fn potential(&self, card: &str) -> f64 {
        self.graph.get(card).map(|n| n.values().sum()).unwrap_or(0.0)
    }

    fn synergy_with_deck(&self, card: &str, deck: &[&CardCandidate]) -> f64 {
        deck.iter().map(|d| self.edge(card, &d.name)).sum()
    }

    /// 補上尚未滿足的硬性條件可加分
    fn constraint_bonus(&self, card: &CardCandidate, deck: &[&CardCandidate]) -> f64 {
        let mut bonus = 0.0;
        if self.config.require_win_condition
            && card.is_win_condition()
            && !deck.iter().any(|c| c.is_win_condition())
        {
            bonus += MISSING_WIN_CONDITION_BONUS;
        }
        if self.config.require_spell && card.is_spell() && !deck.iter().any(|c| c.is_spell()) {
            bonus += MISSING_SPELL_BONUS;
        }
        if self.config.require_air_defense
            && card.is_air_defense()
            && !deck.iter().any(|c| c.is_air_defense())
        {
            bonus += MISSING_AIR_BONUS;
        }
        bonus
    }

    fn start_card(&self) -> Option<&CardCandidate> {
        let best = pick_best(&self.config.candidates, |c| {
            let bonus = if c.is_win_condition() { WIN_CONDITION_START_BONUS } else { 0.0 };
            self.potential(&c.name) + bonus
        });
        best.map(|(c, _)| c)
    }

    /// 貪婪選不出卡時，找第一張仍能讓牌組合法的卡
    fn constraint_filler<'c>(
        &'c self,
        deck: &[&'c CardCandidate],
        used: &HashSet<String>,
    ) -> Option<&'c CardCandidate> {
        unused(&self.config.candidates, used).find(|c| {
            let mut test: Vec<&CardCandidate> = deck.to_vec();
            test.push(*c);
            test.len() < DECK_SIZE || self.config.meets_constraints(&test)
        })
    }
}

impl DeckStrategy for SynergyGraphBuilder {
    fn build(&self) -> Result<Vec<String>, DeckError> {
        self.config.ensure_pool()?;

        let start = self.start_card().ok_or_else(|| DeckError::ConstraintUnsatisfiable {
            slot: "starting card".to_string(),
        })?;

        let mut deck: Vec<&CardCandidate> = vec![start];
        let mut used: HashSet<String> = HashSet::from([start.name.clone()]);

        while deck.len() < DECK_SIZE {
            let completes = deck.len() + 1 == DECK_SIZE;
            let eligible = unused(&self.config.candidates, &used).filter(|c| {
                if !completes {
                    return true;
                }
                let mut test = deck.clone();
                test.push(*c);
                self.config.meets_constraints(&test)
            });
            let best = pick_best(eligible, |c| {
                self.synergy_with_deck(&c.name, &deck) + self.constraint_bonus(c, &deck)
            })
            .map(|(c, _)| c);

            let card = match best.or_else(|| self.constraint_filler(&deck, &used)) {
                Some(card) => card,
                None => {
                    return Err(DeckError::ConstraintUnsatisfiable {
                        slot: format!("card {} of {}", deck.len() + 1, DECK_SIZE),
                    })
                }
            };
            used.insert(card.name.clone());
            deck.push(card);
        }

        debug!(start = %start.name, "synergy graph deck complete");
        Ok(deck.into_iter().map(|c| c.name.clone()).collect())
    }

    fn name(&self) -> &'static str {
        "synergy_graph"
    }
}

// ============================================================================
// 單元測試
// ============================================================================
