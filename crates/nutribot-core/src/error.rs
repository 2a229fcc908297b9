use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation failed: {0}")]
    Operation(String),

    /// A collaborator (search engine, repository, transcript store) could not
    /// serve the request. Fatal for the current turn.
    #[error("{collaborator} unavailable: {reason}")]
    Unavailable {
        collaborator: &'static str,
        reason: String,
    },
}

impl Error {
    pub fn unavailable(collaborator: &'static str, reason: impl std::fmt::Display) -> Self {
        Self::Unavailable { collaborator, reason: reason.to_string() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
