//! 角色冗餘計分
//!
//! 依牌組原型的容忍度檢查各角色張數，超出部分計為冗餘懲罰 [0, 1]。
//! 餌牌與橋頭速攻的重複是刻意的，懲罰大幅降低。

use serde::Serialize;

use super::archetypes::Archetype;
use super::cards::{count_roles, CardCandidate, Role, ROLE_COUNT};
use super::coherence::detect_archetype;

/// 刻意冗餘時的懲罰倍率
const SYNERGISTIC_REDUNDANCY_FACTOR: f64 = 0.1;

// ============================================================================
// 容忍度表
// ============================================================================

/// 各角色可接受的張數（依 `Role::to_index` 排列）
pub type RoleTolerance = [usize; ROLE_COUNT];

/// 未偵測到原型時使用
pub const DEFAULT_TOLERANCE: RoleTolerance = [2, 1, 2, 3, 4, 3];

/// 每個原型的容忍度（順序與 Archetype 枚舉一致）
pub static TOLERANCE_BY_ARCHETYPE: [RoleTolerance; 8] = [
    // WC, Building, BigSpell, SmallSpell, Support, Cycle
    [2, 1, 2, 3, 4, 2], // Beatdown
    [1, 1, 1, 4, 3, 4], // Cycle
    [1, 2, 3, 3, 3, 3], // Control
    [1, 2, 2, 3, 3, 4], // Siege
    [3, 0, 2, 2, 3, 2], // BridgeSpam
    DEFAULT_TOLERANCE,  // Midrange
    [1, 3, 2, 2, 3, 3], // Spawndeck
    [2, 1, 0, 4, 4, 3], // Bait
];

pub fn tolerance_for(archetype: Option<Archetype>) -> &'static RoleTolerance {
    match archetype {
        Some(a) => &TOLERANCE_BY_ARCHETYPE[a.to_index()],
        None => &DEFAULT_TOLERANCE,
    }
}

/// 原型對冗餘的敏感度
pub fn archetype_multiplier(archetype: Option<Archetype>) -> f64 {
    match archetype {
        Some(Archetype::Beatdown) | Some(Archetype::Siege) => 1.0,
        Some(Archetype::Control) => 0.8,
        Some(Archetype::Bait) | Some(Archetype::BridgeSpam) => 0.3,
        Some(Archetype::Cycle) => 0.5,
        _ => 0.7,
    }
}

// ============================================================================
// 報告
// ============================================================================

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RedundantRole {
    pub role: Role,
    pub count: usize,
    pub threshold: usize,
    /// (張數 - 門檻) / 門檻；門檻為 0 時以 1 計
    pub severity: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RedundancyReport {
    pub archetype: Option<Archetype>,
    pub role_counts: [usize; ROLE_COUNT],
    pub redundant_roles: Vec<RedundantRole>,
    pub synergistic: bool,
    /// 0 = 無冗餘，1 = 嚴重冗餘
    pub penalty: f64,
}

pub fn severity(count: usize, threshold: usize) -> f64 {
    if count <= threshold {
        return 0.0;
    }
    (count - threshold) as f64 / threshold.max(1) as f64
}

/// 餌牌：3 張以上原型代表卡；橋頭速攻：2~3 張 3~7 聖水的勝利條件
fn is_synergistic(cards: &[CardCandidate], archetype: Option<Archetype>) -> bool {
    match archetype {
        Some(Archetype::Bait) => cards.iter().filter(|c| Archetype::Bait.contains(&c.name)).count() >= 3,
        Some(Archetype::BridgeSpam) => {
            let pressure = cards.iter().filter(|c| c.is_win_condition() && (3..=7).contains(&c.elixir)).count();
            (2..=3).contains(&pressure)
        }
        _ => false,
    }
}

pub fn analyze_redundancy(cards: &[CardCandidate]) -> RedundancyReport {
    if cards.is_empty() {
        return RedundancyReport::default();
    }

    let names: Vec<&str> = cards.iter().map(|c| c.name.as_str()).collect();
    let (_, archetype) = detect_archetype(&names);
    let tolerance = tolerance_for(archetype);
    let role_counts = count_roles(cards);

    let redundant_roles: Vec<RedundantRole> = Role::all()
        .iter()
        .filter_map(|&role| {
            let count = role_counts[role.to_index()];
            let threshold = tolerance[role.to_index()];
            (count > threshold).then(|| RedundantRole { role, count, threshold, severity: severity(count, threshold) })
        })
        .collect();

    let synergistic = is_synergistic(cards, archetype);
    let mut multiplier = archetype_multiplier(archetype);
    if synergistic {
        multiplier *= SYNERGISTIC_REDUNDANCY_FACTOR;
    }
    let base: f64 = redundant_roles.iter().map(|r| r.severity).sum();

    RedundancyReport {
        archetype,
        role_counts,
        redundant_roles,
        synergistic,
        penalty: (base * multiplier).clamp(0.0, 1.0),
    }
}

// ============================================================================
// 單元測試
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::cards::Rarity;

    fn card(name: &str, elixir: u32, role: Role) -> CardCandidate {
        CardCandidate::new(name, 14, 14, Rarity::Common, elixir, Some(role))
    }

    #[test]
    fn test_severity() {
        assert_eq!(severity(2, 2), 0.0);
        assert_eq!(severity(3, 2), 0.5);
        assert_eq!(severity(2, 0), 2.0);
    }

    #[test]
    fn test_balanced_deck_has_no_penalty() {
        let deck = vec![
            card("Hog Rider", 4, Role::WinCondition),
            card("Musketeer", 4, Role::Support),
            card("Ice Golem", 2, Role::Cycle),
            card("Cannon", 3, Role::Building),
            card("Skeletons", 1, Role::Cycle),
            card("Ice Spirit", 1, Role::Cycle),
            card("Fireball", 4, Role::SpellBig),
            card("Log", 2, Role::SpellSmall),
        ];
        let report = analyze_redundancy(&deck);
        assert_eq!(report.archetype, Some(Archetype::Cycle));
        assert!(report.redundant_roles.is_empty());
        assert_eq!(report.penalty, 0.0);
    }

    #[test]
    fn test_stacked_win_conditions_penalized() {
        // Beatdown 容忍 2 張勝利條件
        let deck = vec![
            card("Golem", 8, Role::WinCondition),
            card("Giant", 5, Role::WinCondition),
            card("Lava Hound", 7, Role::WinCondition),
            card("Baby Dragon", 4, Role::Support),
            card("Night Witch", 4, Role::Support),
            card("Mega Minion", 3, Role::Support),
            card("Lightning", 6, Role::SpellBig),
            card("Arrows", 3, Role::SpellSmall),
        ];
        let report = analyze_redundancy(&deck);
        assert_eq!(report.archetype, Some(Archetype::Beatdown));
        assert_eq!(report.redundant_roles.len(), 1);
        assert_eq!(report.redundant_roles[0].role, Role::WinCondition);
        assert_eq!(report.redundant_roles[0].count, 3);
        assert!((report.penalty - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_bait_redundancy_is_synergistic() {
        let deck = vec![
            card("Goblin Barrel", 3, Role::WinCondition),
            card("Princess", 3, Role::Support),
            card("Goblin Gang", 3, Role::Cycle),
            card("Skeleton Army", 3, Role::Cycle),
            card("Rocket", 6, Role::SpellBig),
            card("Log", 2, Role::SpellSmall),
            card("Knight", 3, Role::Support),
            card("Inferno Tower", 5, Role::Building),
        ];
        let report = analyze_redundancy(&deck);
        assert_eq!(report.archetype, Some(Archetype::Bait));
        assert!(report.synergistic);
        // Bait 不容忍大法術：嚴重度 1.0 × 0.3 × 0.1
        assert!((report.penalty - 0.03).abs() < 1e-9);
    }

    #[test]
    fn test_empty_deck() {
        assert_eq!(analyze_redundancy(&[]), RedundancyReport::default());
    }
}
