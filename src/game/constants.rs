//! 牌組引擎常量定義

// ============================================================================
// 牌組規則常量
// ============================================================================

pub const DECK_SIZE: usize = 8;                 // 每副牌組張數
pub const MAX_DECK_PAIRS: usize = DECK_SIZE * (DECK_SIZE - 1) / 2;  // C(8,2) = 28
pub const MAX_EVOLUTION_SLOTS: usize = 2;       // 進化欄位上限
pub const MAX_GENERATION_ATTEMPTS: usize = 100; // 每副牌組的隨機重試上限
pub const DEFAULT_UNKNOWN_ELIXIR: u32 = 4;      // 未知卡牌的預設聖水
pub const MAX_AVG_ELIXIR: f64 = 10.0;           // 平均聖水的合法上限

// ============================================================================
// 聖水常量
// ============================================================================

pub const ELIXIR_OPTIMAL: f64 = 3.0;            // 聖水偏好峰值
pub const ELIXIR_MAX_DIFF: f64 = 9.0;           // 三角偏好的半寬
pub const ELIXIR_CYCLE_PENALTY_THRESHOLD: f64 = 4.0;
pub const ELIXIR_PENALTY_RATE: f64 = 0.15;      // 超出目標區間的每點懲罰
pub const ELIXIR_CYCLE_PENALTY_RATE: f64 = 0.30; // 快速循環策略遇到高費卡的懲罰
pub const HIGH_AVG_ELIXIR_NOTE: f64 = 3.8;
pub const LOW_AVG_ELIXIR_NOTE: f64 = 2.8;

// ============================================================================
// 戰鬥數據常量
// ============================================================================

pub const DPS_PER_ELIXIR_CAP: f64 = 50.0;       // DPS/聖水 正規化上限
pub const HP_PER_ELIXIR_CAP: f64 = 400.0;       // HP/聖水 正規化上限
pub const ROLE_FIRST_TANK_KILLER_DPS: f64 = 150.0;
pub const COVERAGE_TANK_KILLER_DPS: f64 = 200.0;
pub const MAX_USEFUL_RANGE: f64 = 6.0;

// ============================================================================
// 協同 / 連貫性常量
// ============================================================================

pub const TOP_SYNERGY_COUNT: usize = 5;
pub const SYNERGY_SUGGESTION_COUNT: usize = 10;
pub const BASE_COHERENCE: f64 = 0.8;
pub const ARCHETYPE_AVOIDANCE_PENALTY: f64 = 0.3;
pub const STRONG_COUNTER_THRESHOLD: f64 = 0.8;   // 缺少時會被列入建議的反制強度
