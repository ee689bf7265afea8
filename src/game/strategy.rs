//! 組牌策略預設
//!
//! 定義六種策略，每種都有固定的參數組合
//!
//! # 架構
//!
//! 使用聲明式 `STRATEGY_DEFS` 表定義所有策略的聖水區間、角色加成、
//! 卡牌親和度與角色配置覆寫。

use super::cards::{canonical_card_name, Role, ROLE_COUNT};
use crate::service::error::DeckError;

// ============================================================================
// 角色配置
// ============================================================================

/// 每個角色的張數配置
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoleComposition {
    pub win_conditions: usize,
    pub buildings: usize,
    pub big_spells: usize,
    pub small_spells: usize,
    pub support: usize,
    pub cycle: usize,
}

impl Default for RoleComposition {
    /// 標準配置 1/1/1/1/2/2
    fn default() -> Self {
        Self::new(1, 1, 1, 1, 2, 2)
    }
}

impl RoleComposition {
    pub const fn new(
        win_conditions: usize,
        buildings: usize,
        big_spells: usize,
        small_spells: usize,
        support: usize,
        cycle: usize,
    ) -> Self {
        Self { win_conditions, buildings, big_spells, small_spells, support, cycle }
    }

    pub fn count(&self, role: Role) -> usize {
        match role {
            Role::WinCondition => self.win_conditions,
            Role::Building => self.buildings,
            Role::SpellBig => self.big_spells,
            Role::SpellSmall => self.small_spells,
            Role::Support => self.support,
            Role::Cycle => self.cycle,
        }
    }

    pub fn total(&self) -> usize {
        Role::all().iter().map(|&r| self.count(r)).sum()
    }
}

// ============================================================================
// Strategy 定義系統
// ============================================================================

/// V2 評分使用的聖水曲線目標
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElixirProfile {
    pub target: f64,
    pub min: f64,
    pub max: f64,
}

/// Strategy 定義結構
#[derive(Clone, Copy)]
pub struct StrategyDef {
    pub name: &'static str,
    pub target_elixir_min: f64,
    pub target_elixir_max: f64,
    /// 角色加成（依 `Role::to_index` 排列，範圍 [-0.5, 0.5]）
    pub role_bonuses: [f64; ROLE_COUNT],
    pub archetype_affinity: &'static [(&'static str, f64)],
    pub composition: Option<RoleComposition>,
    pub elixir_profile: ElixirProfile,
}

const fn profile(target: f64, min: f64, max: f64) -> ElixirProfile {
    ElixirProfile { target, min, max }
}

/// Strategy 定義表（順序與 Strategy 枚舉一致）
pub static STRATEGY_DEFS: [StrategyDef; 6] = [
    // 0: Balanced - 無偏好
    StrategyDef {
        name: "balanced",
        target_elixir_min: 3.0,
        target_elixir_max: 3.5,
        role_bonuses: [0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        archetype_affinity: &[],
        composition: None,
        elixir_profile: profile(3.3, 2.8, 3.8),
    },
    // 1: Aggro - 偏好勝利條件，排斥建築
    StrategyDef {
        name: "aggro",
        target_elixir_min: 3.5,
        target_elixir_max: 4.0,
        role_bonuses: [0.25, -0.18, 0.0, 0.0, 0.05, 0.0],
        archetype_affinity: &[
            ("Golem", 0.15), ("Giant", 0.15), ("Lava Hound", 0.15), ("Royal Giant", 0.10),
            ("Balloon", 0.10), ("Night Witch", 0.10), ("Baby Dragon", 0.05),
        ],
        composition: Some(RoleComposition::new(2, 0, 1, 1, 3, 1)),
        elixir_profile: profile(3.8, 3.2, 4.3),
    },
    // 2: Control - 偏好建築與大法術
    StrategyDef {
        name: "control",
        target_elixir_min: 3.5,
        target_elixir_max: 4.2,
        role_bonuses: [-0.12, 0.25, 0.12, -0.18, 0.0, -0.12],
        archetype_affinity: &[
            ("X-Bow", 0.15), ("Mortar", 0.15), ("Tesla", 0.10), ("Inferno Tower", 0.10),
            ("Graveyard", 0.10), ("Poison", 0.05),
        ],
        composition: Some(RoleComposition::new(1, 2, 2, 0, 2, 1)),
        elixir_profile: profile(3.5, 3.0, 4.0),
    },
    // 3: Cycle - 偏好低費循環卡，排斥大法術
    StrategyDef {
        name: "cycle",
        target_elixir_min: 2.5,
        target_elixir_max: 3.0,
        role_bonuses: [0.0, 0.0, -0.18, 0.05, 0.0, 0.25],
        archetype_affinity: &[
            ("Hog Rider", 0.15), ("Miner", 0.10), ("Ice Spirit", 0.10), ("Skeletons", 0.10),
            ("Ice Golem", 0.10), ("Log", 0.05), ("Cannon", 0.05),
        ],
        composition: Some(RoleComposition::new(1, 1, 0, 1, 1, 4)),
        elixir_profile: profile(2.8, 2.4, 3.2),
    },
    // 4: Splash - 偏好範圍傷害支援
    StrategyDef {
        name: "splash",
        target_elixir_min: 3.2,
        target_elixir_max: 3.8,
        role_bonuses: [0.0, 0.0, 0.05, 0.0, 0.25, -0.12],
        archetype_affinity: &[
            ("Wizard", 0.10), ("Valkyrie", 0.10), ("Baby Dragon", 0.10), ("Executioner", 0.10),
            ("Bowler", 0.10),
        ],
        composition: Some(RoleComposition::new(1, 1, 1, 1, 3, 1)),
        elixir_profile: profile(3.5, 3.0, 4.0),
    },
    // 5: Spell - 偏好法術，排斥建築
    StrategyDef {
        name: "spell",
        target_elixir_min: 3.2,
        target_elixir_max: 3.8,
        role_bonuses: [0.0, -0.22, 0.25, 0.12, 0.0, 0.0],
        archetype_affinity: &[
            ("Rocket", 0.10), ("Fireball", 0.10), ("Poison", 0.10), ("Lightning", 0.10),
            ("Goblin Barrel", 0.10), ("Log", 0.05),
        ],
        composition: Some(RoleComposition::new(1, 0, 2, 1, 3, 1)),
        elixir_profile: profile(3.5, 3.0, 4.0),
    },
];

/// 組牌策略
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// 平衡（預設）
    #[default]
    Balanced,

    /// 快攻：雙勝利條件，無建築
    Aggro,

    /// 控制：雙建築、雙大法術
    Control,

    /// 循環：4 張循環卡，無大法術
    Cycle,

    /// 範圍：3 張範圍支援
    Splash,

    /// 法術：雙大法術
    Spell,
}

impl Strategy {
    /// 所有策略
    pub fn all() -> &'static [Strategy] {
        &[
            Strategy::Balanced,
            Strategy::Aggro,
            Strategy::Control,
            Strategy::Cycle,
            Strategy::Splash,
            Strategy::Spell,
        ]
    }

    pub fn to_index(self) -> usize {
        match self {
            Strategy::Balanced => 0,
            Strategy::Aggro => 1,
            Strategy::Control => 2,
            Strategy::Cycle => 3,
            Strategy::Splash => 4,
            Strategy::Spell => 5,
        }
    }

    #[inline]
    pub fn def(self) -> &'static StrategyDef {
        &STRATEGY_DEFS[self.to_index()]
    }

    pub fn name(self) -> &'static str {
        self.def().name
    }

    /// 解析策略名稱（去除空白、不分大小寫）
    pub fn parse(input: &str) -> Result<Strategy, DeckError> {
        let normalized = input.trim().to_ascii_lowercase();
        Strategy::all()
            .iter()
            .copied()
            .find(|s| s.name() == normalized)
            .ok_or_else(|| DeckError::InvalidStrategy(input.to_string()))
    }

    pub fn config(self) -> StrategyConfig {
        StrategyConfig::from_def(self.def())
    }
}

// ============================================================================
// Strategy 設定值物件
// ============================================================================

/// 策略參數（不可變值物件，呼叫端可自行構造以調整）
#[derive(Clone, Debug, PartialEq)]
pub struct StrategyConfig {
    pub target_elixir_min: f64,
    pub target_elixir_max: f64,
    pub role_bonuses: [f64; ROLE_COUNT],
    pub archetype_affinity: Vec<(String, f64)>,
    pub composition: Option<RoleComposition>,
    pub elixir_profile: ElixirProfile,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Strategy::Balanced.config()
    }
}

impl StrategyConfig {
    pub fn from_def(def: &StrategyDef) -> Self {
        Self {
            target_elixir_min: def.target_elixir_min,
            target_elixir_max: def.target_elixir_max,
            role_bonuses: def.role_bonuses.map(|b| b.clamp(-0.5, 0.5)),
            archetype_affinity: def
                .archetype_affinity
                .iter()
                .map(|&(name, bonus)| (name.to_string(), bonus))
                .collect(),
            composition: def.composition,
            elixir_profile: def.elixir_profile,
        }
    }

    pub fn role_bonus(&self, role: Option<Role>) -> f64 {
        role.map(|r| self.role_bonuses[r.to_index()]).unwrap_or(0.0)
    }

    pub fn affinity(&self, card_name: &str) -> f64 {
        let name = canonical_card_name(card_name);
        self.archetype_affinity
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, bonus)| bonus)
            .unwrap_or(0.0)
    }

    /// 組牌時使用的角色配置（無覆寫時為標準配置）
    pub fn composition(&self) -> RoleComposition {
        self.composition.unwrap_or_default()
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strategy() {
        assert_eq!(Strategy::parse("  CyClE ").unwrap(), Strategy::Cycle);
        assert_eq!(Strategy::parse("balanced").unwrap(), Strategy::Balanced);
        let err = Strategy::parse("turtle").unwrap_err();
        assert!(err.to_string().contains("turtle"));
        assert!(err.to_string().contains("balanced, aggro, control, cycle, splash, spell"));
    }

    #[test]
    fn test_strategy_defs_consistent() {
        for &s in Strategy::all() {
            let def = s.def();
            assert_eq!(def.name, s.name());
            assert!(def.target_elixir_min <= def.target_elixir_max);
            for b in def.role_bonuses {
                assert!((-0.5..=0.5).contains(&b));
            }
            if let Some(comp) = def.composition {
                assert_eq!(comp.total(), 8, "{} composition must fill the deck", def.name);
            }
        }
    }

    #[test]
    fn test_config_lookups() {
        let cycle = Strategy::Cycle.config();
        assert_eq!(cycle.role_bonus(Some(Role::Cycle)), 0.25);
        assert_eq!(cycle.role_bonus(None), 0.0);
        assert_eq!(cycle.affinity("Hog Rider"), 0.15);
        assert_eq!(cycle.affinity("The Log"), 0.05);
        assert_eq!(cycle.affinity("Golem"), 0.0);
        assert_eq!(cycle.composition().cycle, 4);
        assert_eq!(StrategyConfig::default().composition(), RoleComposition::default());
    }
}
