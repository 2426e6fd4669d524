//! Error type shared by the card stores and the scheduler.

use crate::models::{ItemId, OwnerId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("card already exists for owner '{owner}' and item '{item}'")]
    DuplicateCard { owner: OwnerId, item: ItemId },

    #[error("no card for owner '{owner}' and item '{item}'")]
    CardNotFound { owner: OwnerId, item: ItemId },

    #[error("response time must be a finite, non-negative number of milliseconds, got {0}")]
    InvalidResponseTime(f64),

    #[error("invalid card: {0}")]
    InvalidCard(String),

    #[error("stored timestamp {0} is out of range")]
    InvalidTimestamp(i64),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
