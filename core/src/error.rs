use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsightError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid window: {days} days (must be at least 1)")]
    InvalidWindow { days: u32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type InsightResult<T> = Result<T, InsightError>;
