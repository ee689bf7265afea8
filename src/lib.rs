//! 卡牌對戰遊戲的 8 張牌組評分與組牌引擎
//!
//! - `game`: 卡牌定義、計分、協同、反制、原型與一致性
//! - `service`: 候選池、五種組牌策略、推薦牌組與蒙地卡羅牌組生成

pub mod game;
pub mod service;
