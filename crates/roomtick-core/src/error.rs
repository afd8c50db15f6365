use thiserror::Error;

use crate::{RoomName, SnapshotError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("room {0} is not known to the store")]
    UnknownRoom(RoomName),
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Faults of the engine itself. Game-rule outcomes (blocked moves, deaths,
/// ignored intents) are never reported through this type.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("tick cancelled")]
    Cancelled,
    #[error("step {later} must run after {earlier}")]
    StepOrder {
        earlier: &'static str,
        later: &'static str,
    },
    #[error("pipeline is missing required step {0}")]
    MissingStep(&'static str),
    #[error("invalid room snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("room task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
