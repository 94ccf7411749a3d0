use thiserror::Error;

pub type Result<T> = std::result::Result<T, BoardError>;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Card {card_id} is not in list {list_id}")]
    CardNotInList { card_id: String, list_id: String },

    #[error("List not found: {0}")]
    ListNotFound(String),

    #[error("Board not found: {0}")]
    BoardNotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Title must not be empty")]
    InvalidTitle,

    #[error("Invalid date filter '{0}'. Valid filters: all, overdue, due-soon")]
    InvalidDateFilter(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(#[source] anyhow::Error),

    #[error("{0}")]
    Other(String),
}

impl BoardError {
    /// Wraps an arbitrary client-side failure (HTTP, socket, decoding)
    pub fn transport(err: impl Into<anyhow::Error>) -> Self {
        Self::Transport(err.into())
    }

    /// True when the error means local state referenced an id it does not hold.
    ///
    /// Such errors are raised before any remote call is made.
    pub fn is_consistency(&self) -> bool {
        matches!(
            self,
            Self::CardNotInList { .. } | Self::CardNotFound(_) | Self::ListNotFound(_)
        )
    }
}
