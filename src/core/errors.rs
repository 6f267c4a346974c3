use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Input the caller can fix; the message is meant to be shown as-is.
    #[error("{0}")]
    Validation(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("Corrupt record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to hash password: {0}")]
    PasswordHash(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Whether the message may be surfaced to the end user.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::NotFound(_))
    }
}
