//! 反制覆蓋組牌
//!
//! 先選一張勝利條件，再貪婪地加入能覆蓋尚未覆蓋之反制類別的卡。

use std::collections::{HashMap, HashSet};

use crate::game::cards::CardCandidate;
use crate::game::constants::DECK_SIZE;
use crate::game::counters::{CounterCategory, CounterMatrix};
use crate::service::error::DeckError;
use crate::service::strategies::{pick_best, synergy_to_deck, unused, BuilderConfig, DeckStrategy};

/// 覆蓋優先順序（越前面分數越高）
pub const COVERAGE_PRIORITY: [CounterCategory; 5] = [
    CounterCategory::AirDefense,
    CounterCategory::TankKillers,
    CounterCategory::SplashDefense,
    CounterCategory::SwarmClear,
    CounterCategory::Buildings,
];

const WIN_CONDITION_CAPABILITY_WEIGHT: f64 = 0.1;
const PRIORITY_STEP: f64 = 0.1;
/// 防空與範圍傷害第二張的加分
const REDUNDANCY_BONUS: f64 = 0.3;
const FIRST_SPELL_BONUS: f64 = 0.5;
const LEVEL_WEIGHT: f64 = 0.2;
const SYNERGY_WEIGHT: f64 = 0.1;

pub struct CounterCentricBuilder {
    config: BuilderConfig,
}

impl CounterCentricBuilder {
    pub fn new(config: BuilderConfig) -> Result<Self, DeckError> {
        if config.counter_matrix.is_none() {
            return Err(DeckError::MissingDependency("counter matrix"));
        }
        Ok(Self { config })
    }

    fn matrix(&self) -> Result<&CounterMatrix, DeckError> {
        self.config
            .counter_matrix
            .as_deref()
            .ok_or(DeckError::MissingDependency("counter matrix"))
    }
}

/// 覆蓋分數：未覆蓋類別依優先序加分，防空與範圍傷害只有一張時再加分
pub fn coverage_gain(capabilities: &[CounterCategory], covered: &HashMap<CounterCategory, usize>) -> f64 {
    let mut score = 0.0;
    for cap in capabilities {
        let Some(priority) = COVERAGE_PRIORITY.iter().position(|p| p == cap) else {
            continue;
        };
        match covered.get(cap).copied().unwrap_or(0) {
            0 => score += 1.0 - priority as f64 * PRIORITY_STEP,
            1 if matches!(cap, CounterCategory::AirDefense | CounterCategory::SplashDefense) => {
                score += REDUNDANCY_BONUS
            }
            _ => {}
        }
    }
    score
}

/// 組牌過程中的覆蓋狀態
#[derive(Default)]
struct CoverageState {
    deck: Vec<String>,
    used: HashSet<String>,
    covered: HashMap<CounterCategory, usize>,
    has_spell: bool,
}

impl CoverageState {
    fn add(&mut self, card: &CardCandidate, matrix: &CounterMatrix) {
        for cap in matrix.card_capabilities(&card.name) {
            *self.covered.entry(cap).or_default() += 1;
        }
        self.has_spell |= card.is_spell();
        self.used.insert(card.name.clone());
        self.deck.push(card.name.clone());
    }
}

impl DeckStrategy for CounterCentricBuilder {
    fn build(&self) -> Result<Vec<String>, DeckError> {
        self.config.ensure_pool()?;
        let matrix = self.matrix()?;

        let mut cache = self.config.synergy_cache();
        let mut state = CoverageState::default();

        let win_condition = pick_best(
            self.config.candidates.iter().filter(|c| c.is_win_condition()),
            |c| c.level_ratio() + matrix.capability_count(&c.name) as f64 * WIN_CONDITION_CAPABILITY_WEIGHT,
        );
        if let Some((card, _)) = win_condition {
            state.add(card, matrix);
        }

        while state.deck.len() < DECK_SIZE {
            // 只有正分才算有貢獻
            let best = pick_best(unused(&self.config.candidates, &state.used), |c| {
                let mut score = coverage_gain(&matrix.card_capabilities(&c.name), &state.covered);
                if c.is_spell() && !state.has_spell {
                    score += FIRST_SPELL_BONUS;
                }
                score += c.level_ratio() * LEVEL_WEIGHT;
                score + synergy_to_deck(&mut cache, &c.name, &state.deck) * SYNERGY_WEIGHT
            })
            .filter(|&(_, score)| score > 0.0)
            .map(|(c, _)| c);

            let card = match best.or_else(|| unused(&self.config.candidates, &state.used).next()) {
                Some(card) => card,
                None => {
                    return Err(DeckError::ConstraintUnsatisfiable {
                        slot: format!("card {} of {}", state.deck.len() + 1, DECK_SIZE),
                    })
                }
            };
            state.add(card, matrix);
        }

        Ok(state.deck)
    }

    fn name(&self) -> &'static str {
        "counter_centric"
    }
}

// ============================================================================
// 單元測試
// ============================================================================
