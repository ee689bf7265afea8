//! 錯誤類型

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeckError {
    /// 候選池不足 8 張，或不足某角色的最低需求
    #[error("insufficient candidates: need at least {need}, got {got}")]
    InsufficientCandidates { need: usize, got: usize },

    #[error("missing dependency: {0} is required")]
    MissingDependency(&'static str),

    /// 必填欄位（例如勝利條件）無法從候選池填滿
    #[error("cannot satisfy slot: {slot}")]
    ConstraintUnsatisfiable { slot: String },

    #[error("failed to generate valid deck after {attempts} attempts")]
    GenerationExhausted { attempts: usize },

    #[error("invalid strategy '{0}': must be one of [balanced, aggro, control, cycle, splash, spell]")]
    InvalidStrategy(String),

    #[error("unknown builder type: {0}")]
    UnknownBuilder(String),

    #[error("unknown archetype: {0}")]
    UnknownArchetype(String),

    #[error("invalid deck: {reason}")]
    InvalidDeck { reason: String },

    #[error("level curve config error: {0}")]
    LevelCurve(#[from] serde_json::Error),
}

impl DeckError {
    /// 批次呼叫端可略過的錯誤（單一牌組失敗不影響其他牌組）
    pub fn is_recoverable(&self) -> bool {
        match self {
            DeckError::GenerationExhausted { .. } => true,
            DeckError::ConstraintUnsatisfiable { .. } => true,
            DeckError::InsufficientCandidates { .. } => true,
            DeckError::MissingDependency(_) => false,
            DeckError::InvalidStrategy(_) => false,
            DeckError::UnknownBuilder(_) => false,
            DeckError::UnknownArchetype(_) => false,
            DeckError::InvalidDeck { .. } => false,
            DeckError::LevelCurve(_) => false,
        }
    }
}
