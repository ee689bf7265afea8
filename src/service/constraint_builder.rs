//! 條件滿足式組牌
//!
//! 先填必填欄位（勝利條件、大法術、小法術、防空），再填選填欄位，
//! 最後以軟性分數補滿。

use std::collections::HashSet;

use crate::game::cards::{CardCandidate, Role};
use crate::game::constants::DECK_SIZE;
use crate::service::error::DeckError;
use crate::service::strategies::{pick_best, synergy_to_deck, unused, BuilderConfig, DeckStrategy};

const LEVEL_WEIGHT: f64 = 0.3;
const SYNERGY_WEIGHT: f64 = 0.4;
const ELIXIR_WEIGHT: f64 = 0.15;
const ELIXIR_SPREAD: f64 = 5.0;
const CAPABILITY_WEIGHT: f64 = 0.05;

/// 欄位條件：角色限制與額外篩選
#[derive(Clone, Copy)]
pub struct SlotConstraint {
    pub name: &'static str,
    pub required: bool,
    pub role: Option<Role>,
    pub filter: Option<fn(&CardCandidate) -> bool>,
}

impl SlotConstraint {
    const fn new(name: &'static str, required: bool, role: Option<Role>) -> Self {
        Self { name, required, role, filter: None }
    }

    pub fn accepts(&self, card: &CardCandidate) -> bool {
        if let Some(role) = self.role {
            if card.role != Some(role) {
                return false;
            }
        }
        self.filter.map_or(true, |f| f(card))
    }
}

fn hits_air(card: &CardCandidate) -> bool {
    card.is_air_defense()
}

pub static SLOT_CONSTRAINTS: [SlotConstraint; 8] = [
    SlotConstraint::new("WinCondition", true, Some(Role::WinCondition)),
    SlotConstraint::new("BigSpell", true, Some(Role::SpellBig)),
    SlotConstraint::new("SmallSpell", true, Some(Role::SpellSmall)),
    SlotConstraint { name: "AirDefense", required: true, role: None, filter: Some(hits_air) },
    SlotConstraint::new("Support1", false, Some(Role::Support)),
    SlotConstraint::new("Support2", false, Some(Role::Support)),
    SlotConstraint::new("Flex1", false, None),
    SlotConstraint::new("Flex2", false, None),
];

pub struct ConstraintSatisfactionBuilder {
    config: BuilderConfig,
}

impl ConstraintSatisfactionBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }

    /// 軟性分數：等級、協同、聖水偏好、反制能力
    fn soft_score(&self, card: &CardCandidate, synergy: f64) -> f64 {
        let mut score = card.level_ratio() * LEVEL_WEIGHT + synergy * SYNERGY_WEIGHT;
        if self.config.preferred_elixir > 0.0 {
            let diff = (card.elixir as f64 - self.config.preferred_elixir).abs();
            score += (1.0 - diff / ELIXIR_SPREAD).max(0.0) * ELIXIR_WEIGHT;
        }
        if let Some(matrix) = &self.config.counter_matrix {
            score += matrix.capability_count(&card.name) as f64 * CAPABILITY_WEIGHT;
        }
        score
    }
}

impl DeckStrategy for ConstraintSatisfactionBuilder {
    fn build(&self) -> Result<Vec<String>, DeckError> {
        self.config.ensure_pool()?;

        let mut cache = self.config.synergy_cache();
        let mut deck: Vec<String> = Vec::with_capacity(DECK_SIZE);
        let mut used: HashSet<String> = HashSet::new();

        let required = SLOT_CONSTRAINTS.iter().filter(|s| s.required);
        let optional = SLOT_CONSTRAINTS.iter().filter(|s| !s.required);

        for slot in required.chain(optional) {
            if deck.len() >= DECK_SIZE {
                break;
            }
            let best = pick_best(
                unused(&self.config.candidates, &used).filter(|c| slot.accepts(c)),
                |c| {
                    let synergy = synergy_to_deck(&mut cache, &c.name, &deck);
                    self.soft_score(c, synergy)
                },
            );
            match best {
                Some((card, _)) => {
                    used.insert(card.name.clone());
                    deck.push(card.name.clone());
                }
                None if slot.required => {
                    return Err(DeckError::ConstraintUnsatisfiable { slot: slot.name.to_string() })
                }
                None => {}
            }
        }

        while deck.len() < DECK_SIZE {
            let best = pick_best(unused(&self.config.candidates, &used), |c| {
                let synergy = synergy_to_deck(&mut cache, &c.name, &deck);
                self.soft_score(c, synergy)
            });
            let (card, _) = best.ok_or_else(|| DeckError::ConstraintUnsatisfiable {
                slot: format!("card {} of {}", deck.len() + 1, DECK_SIZE),
            })?;
            used.insert(card.name.clone());
            deck.push(card.name.clone());
        }

        Ok(deck)
    }

    fn name(&self) -> &'static str {
        "constraint_satisfaction"
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::synergy::SynergyDatabase;
    use crate::service::strategies::tests::{air, assert_valid_deck, candidate, sample_pool};
    use std::sync::Arc;

    #[test]
    fn test_required_slots_filled_first() {
        let pool = sample_pool();
        let deck = ConstraintSatisfactionBuilder::new(BuilderConfig::new(pool.clone()))
            .build()
            .unwrap();
        assert_valid_deck(&deck, &pool);

        let find = |name: &str| pool.iter().find(|c| c.name == name).unwrap();
        assert!(find(&deck[0]).is_win_condition());
        assert_eq!(find(&deck[1]).role, Some(Role::SpellBig));
        assert_eq!(find(&deck[2]).role, Some(Role::SpellSmall));
        assert!(find(&deck[3]).is_air_defense());
        // Hog Rider 等級較高
        assert_eq!(deck[0], "Hog Rider");
        // Log 等級 13，Zap 等級 10
        assert_eq!(deck[2], "Log");
    }

    #[test]
    fn test_missing_big_spell_fails() {
        let pool: Vec<CardCandidate> = sample_pool()
            .into_iter()
            .filter(|c| c.role != Some(Role::SpellBig))
            .collect();
        let err = ConstraintSatisfactionBuilder::new(BuilderConfig::new(pool)).build().unwrap_err();
        match err {
            DeckError::ConstraintUnsatisfiable { slot } => assert_eq!(slot, "BigSpell"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_air_defense_fails() {
        let pool: Vec<CardCandidate> = sample_pool()
            .into_iter()
            .filter(|c| !c.is_air_defense())
            .collect();
        let err = ConstraintSatisfactionBuilder::new(BuilderConfig::new(pool)).build().unwrap_err();
        assert!(matches!(err, DeckError::ConstraintUnsatisfiable { ref slot } if slot == "AirDefense"));
    }

    #[test]
    fn test_soft_score_components() {
        let builder = ConstraintSatisfactionBuilder::new(BuilderConfig::new(Vec::new()).with_counter_matrix(None));
        let card = candidate("Knight", 3, Role::Support, 14);
        // 等級 1.0 * 0.3 + 聖水 (1 - 0.5/5) * 0.15
        let expected = 0.3 + 0.9 * 0.15;
        assert!((builder.soft_score(&card, 0.0) - expected).abs() < 1e-9);
        assert!((builder.soft_score(&card, 1.0) - expected - 0.4).abs() < 1e-9);

        // Musketeer 具防空能力
        let with_matrix = ConstraintSatisfactionBuilder::new(BuilderConfig::new(Vec::new()));
        let musketeer = air(candidate("Musketeer", 4, Role::Support, 14));
        let base = builder.soft_score(&musketeer, 0.0);
        assert!((with_matrix.soft_score(&musketeer, 0.0) - base - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_synergy_influences_optional_slots() {
        let pool = sample_pool();
        let config = BuilderConfig::new(pool.clone()).with_synergy(Arc::new(SynergyDatabase::new()));
        let deck = ConstraintSatisfactionBuilder::new(config).build().unwrap();
        assert_valid_deck(&deck, &pool);
        assert_eq!(deck[0], "Hog Rider");
        assert_eq!(deck[1], "Fireball");
    }
}
