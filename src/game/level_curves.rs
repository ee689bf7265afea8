//! 等級曲線
//!
//! 以每張卡的指數曲線取代線性的 `level / max_level`。
//! 設定以 JSON 提供（`cardLevelCurves` 表，`_default` 為預設項）。

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::service::error::DeckError;

const DEFAULT_KEY: &str = "_default";

/// 單卡曲線參數（數值為百分比，100 = 1.0x）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CardLevelConfig {
    pub base_scale: f64,
    pub growth_rate: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    #[serde(rename = "type")]
    pub curve_type: String,
    pub rarity_bonus: f64,
    pub level_overrides: HashMap<String, f64>,
}

impl Default for CardLevelConfig {
    fn default() -> Self {
        Self {
            base_scale: 100.0,
            growth_rate: 0.10,
            min_scale: 0.0,
            max_scale: 400.0,
            curve_type: "standard".to_string(),
            rarity_bonus: 0.0,
            level_overrides: HashMap::new(),
        }
    }
}

impl CardLevelConfig {
    /// 補齊為 0 / 空白的欄位
    fn filled(mut self) -> Self {
        let defaults = Self::default();
        if self.base_scale == 0.0 {
            self.base_scale = defaults.base_scale;
        }
        if self.growth_rate == 0.0 {
            self.growth_rate = defaults.growth_rate;
        }
        if self.curve_type.is_empty() {
            self.curve_type = defaults.curve_type;
        }
        self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LevelCurvesFile {
    #[serde(default)]
    card_level_curves: HashMap<String, CardLevelConfig>,
}

/// 每卡等級曲線（不可變；建構後可安全跨執行緒共享）
#[derive(Clone, Debug)]
pub struct LevelCurve {
    curves: HashMap<String, CardLevelConfig>,
    fallback: CardLevelConfig,
}

impl Default for LevelCurve {
    fn default() -> Self {
        Self {
            curves: HashMap::new(),
            fallback: CardLevelConfig::default(),
        }
    }
}

impl LevelCurve {
    /// 從 JSON 文字建立
    pub fn from_json(json: &str) -> Result<Self, DeckError> {
        let file: LevelCurvesFile = serde_json::from_str(json)?;
        let mut curves: HashMap<String, CardLevelConfig> = file
            .card_level_curves
            .into_iter()
            .map(|(name, cfg)| (name, cfg.filled()))
            .collect();
        let fallback = curves.remove(DEFAULT_KEY).unwrap_or_default();
        Ok(Self { curves, fallback })
    }

    fn config(&self, card_name: &str) -> &CardLevelConfig {
        self.curves.get(card_name).unwrap_or(&self.fallback)
    }

    /// 指定等級相對於 1 級的倍率
    pub fn level_multiplier(&self, card_name: &str, level: u32) -> f64 {
        if level == 0 {
            return 0.0;
        }
        let cfg = self.config(card_name);
        if let Some(&over) = cfg.level_overrides.get(&level.to_string()) {
            return over / 100.0;
        }

        let mut scaled = cfg.base_scale
            * (1.0 + cfg.growth_rate).powi(level as i32 - 1)
            * (1.0 + cfg.rarity_bonus);
        if cfg.min_scale > 0.0 && scaled < cfg.min_scale {
            scaled = cfg.min_scale;
        }
        if cfg.max_scale > 0.0 && scaled > cfg.max_scale {
            scaled = cfg.max_scale;
        }
        scaled / 100.0
    }

    /// 非線性等級比例（取代 level / max_level）
    pub fn relative_level_ratio(&self, card_name: &str, level: u32, max_level: u32) -> f64 {
        if max_level == 0 {
            return 0.0;
        }
        let max = self.level_multiplier(card_name, max_level);
        if max <= 0.0 {
            return 0.0;
        }
        self.level_multiplier(card_name, level) / max
    }
}

// ============================================================================
// 單元測試
// ============================================================================
