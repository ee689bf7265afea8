//! 角色優先組牌
//!
//! 依優先順序逐欄填牌：勝利條件 → 防空 → 法術 → 坦克剋星 → 範圍傷害 → 支援 → 彈性。
//! 填不滿的欄位直接略過，最後以等級與協同補滿。

use std::collections::HashSet;

use crate::game::cards::{CardCandidate, Role};
use crate::game::constants::{DECK_SIZE, ROLE_FIRST_TANK_KILLER_DPS};
use crate::service::error::DeckError;
use crate::service::strategies::{pick_best, synergy_to_deck, unused, BuilderConfig, DeckStrategy};

const SLOT_SYNERGY_WEIGHT: f64 = 0.5;
const FILL_SYNERGY_WEIGHT: f64 = 0.3;

/// 角色欄位；角色相符或通過篩選其一即可，兩者皆無則接受任何卡
#[derive(Clone, Copy)]
pub struct RoleSlot {
    pub name: &'static str,
    pub role: Option<Role>,
    pub filter: Option<fn(&CardCandidate) -> bool>,
}

impl RoleSlot {
    const fn role(name: &'static str, role: Role) -> Self {
        Self { name, role: Some(role), filter: None }
    }

    const fn filter(name: &'static str, filter: fn(&CardCandidate) -> bool) -> Self {
        Self { name, role: None, filter: Some(filter) }
    }

    pub fn accepts(&self, card: &CardCandidate) -> bool {
        if self.role.is_none() && self.filter.is_none() {
            return true;
        }
        let role_match = self.role.map_or(false, |r| card.role == Some(r));
        let filter_match = self.filter.map_or(false, |f| f(card));
        role_match || filter_match
    }
}

fn hits_air(card: &CardCandidate) -> bool {
    card.is_air_defense()
}

fn kills_tanks(card: &CardCandidate) -> bool {
    card.stats.map_or(false, |s| s.damage_per_second >= ROLE_FIRST_TANK_KILLER_DPS)
}

fn deals_splash(card: &CardCandidate) -> bool {
    card.stats.map_or(false, |s| s.is_splash())
}

pub static ROLE_SLOTS: [RoleSlot; 8] = [
    RoleSlot::role("WinCondition", Role::WinCondition),
    RoleSlot::filter("AirDefense", hits_air),
    RoleSlot::role("BigSpell", Role::SpellBig),
    RoleSlot::role("SmallSpell", Role::SpellSmall),
    RoleSlot::filter("TankKiller", kills_tanks),
    RoleSlot::filter("Splash", deals_splash),
    RoleSlot::role("Support1", Role::Support),
    RoleSlot { name: "Flex", role: None, filter: None },
];

pub struct RoleFirstBuilder {
    config: BuilderConfig,
}

impl RoleFirstBuilder {
    pub fn new(config: BuilderConfig) -> Self {
        Self { config }
    }
}

impl DeckStrategy for RoleFirstBuilder {
    fn build(&self) -> Result<Vec<String>, DeckError> {
        self.config.ensure_pool()?;

        let mut cache = self.config.synergy_cache();
        let mut deck: Vec<String> = Vec::with_capacity(DECK_SIZE);
        let mut used: HashSet<String> = HashSet::new();

        for slot in ROLE_SLOTS.iter() {
            if deck.len() >= DECK_SIZE {
                break;
            }
            let best = pick_best(
                unused(&self.config.candidates, &used).filter(|c| slot.accepts(c)),
                |c| c.level_ratio() + synergy_to_deck(&mut cache, &c.name, &deck) * SLOT_SYNERGY_WEIGHT,
            );
            if let Some((card, _)) = best {
                used.insert(card.name.clone());
                deck.push(card.name.clone());
            }
        }

        while deck.len() < DECK_SIZE {
            let best = pick_best(unused(&self.config.candidates, &used), |c| {
                c.level_ratio() + synergy_to_deck(&mut cache, &c.name, &deck) * FILL_SYNERGY_WEIGHT
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
        "role_first"
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::strategies::tests::{air, assert_valid_deck, candidate, sample_pool};

    #[test]
    fn test_slot_order() {
        let pool = sample_pool();
        let deck = RoleFirstBuilder::new(BuilderConfig::new(pool.clone())).build().unwrap();
        assert_valid_deck(&deck, &pool);
        assert_eq!(
            deck,
            vec![
                "Hog Rider",
                "Musketeer",
                "Fireball",
                "Log",
                // TankKiller：沒有剩餘卡達到 DPS 門檻，略過
                "Baby Dragon",
                "Valkyrie",
                "Ice Spirit",
                // 補滿：Cannon 與 Skeletons 同分，依名稱
                "Cannon",
            ]
        );
    }

    #[test]
    fn test_slot_accepts() {
        let musketeer = air(candidate("Musketeer", 4, Role::Support, 12));
        let knight = candidate("Knight", 3, Role::Support, 12);
        assert!(ROLE_SLOTS[1].accepts(&musketeer));
        assert!(!ROLE_SLOTS[1].accepts(&knight));
        assert!(ROLE_SLOTS[4].accepts(&musketeer));
        assert!(!ROLE_SLOTS[5].accepts(&musketeer));
        assert!(ROLE_SLOTS[6].accepts(&knight));
        assert!(ROLE_SLOTS[7].accepts(&knight));
    }

    #[test]
    fn test_unfillable_slots_skipped() {
        // 全部都是支援卡：只有 Support1 與 Flex 可填，其餘由補滿階段處理
        let pool: Vec<CardCandidate> = (0..9)
            .map(|i| candidate(&format!("Troop {}", i), 3, Role::Support, 5 + i))
            .collect();
        let deck = RoleFirstBuilder::new(BuilderConfig::new(pool.clone())).build().unwrap();
        assert_valid_deck(&deck, &pool);
        assert_eq!(deck[0], "Troop 8");
        assert!(!deck.contains(&"Troop 0".to_string()));
    }

    #[test]
    fn test_insufficient_pool() {
        let pool: Vec<CardCandidate> = sample_pool().into_iter().take(7).collect();
        let err = RoleFirstBuilder::new(BuilderConfig::new(pool)).build().unwrap_err();
        assert!(matches!(err, DeckError::InsufficientCandidates { need: 8, got: 7 }));
    }
}
