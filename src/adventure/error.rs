//! Error taxonomy for the adventure core.

use thiserror::Error;

/// Failure to turn the raw data file into a catalog.
///
/// Any variant aborts the whole load; a partial catalog is never produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty dataset")]
    EmptyDataset,
    #[error("malformed record at line {line}: {record}")]
    MalformedRecord { line: usize, record: String },
    #[error("duplicate location name: {0}")]
    DuplicateName(String),
}

/// Start-up failure. The game shows a retry affordance instead of a catalog.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("无法加载游戏数据: {0}")]
    DataLoad(String),
    #[error("位置数据格式不正确: {0}")]
    Parse(#[from] ParseError),
}

/// Failure while resolving a location action.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("no handler registered for action `{0}`")]
    NoHandler(String),
    #[error("reward pool for `{0}` is empty")]
    EmptyRewardPool(String),
}

/// Failure to write the player record. Logged; gameplay continues.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable")]
    Unavailable,
    #[error("storage write failed: {0}")]
    Write(String),
    #[error("save serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}
