use thiserror::Error;

/// Failures of the underlying key-value store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence faults that the stats store recovers from locally.
/// These are logged and handed to the error hook, never returned to callers.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("stored stats are corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    #[error("failed to read stored stats: {0}")]
    Read(#[source] StoreError),

    #[error("failed to encode stats: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to save stats: {0}")]
    Write(#[source] StoreError),

    #[error("failed to clear stats: {0}")]
    Remove(#[source] StoreError),
}

/// Errors surfaced to the caller.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("the question bank is empty")]
    EmptyBank,

    #[error("cannot record a game with no questions answered")]
    NoQuestionsAnswered,

    #[error("failed to read question set: {0}")]
    DatasetIo(#[from] std::io::Error),

    #[error("invalid question set: {0}")]
    DatasetParse(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}
