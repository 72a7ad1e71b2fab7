use thiserror::Error;

/// Error taxonomy returned by every engine operation. Callers are told
/// precisely why a write was rejected; nothing is silently swallowed.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unavailable(String),
    #[error(transparent)]
    Internal(anyhow::Error),
}

impl EngineError {
    pub fn not_found(what: impl Into<String>) -> Self {
        EngineError::NotFound(what.into())
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        EngineError::Forbidden(reason.into())
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        EngineError::InvalidArgument(reason.into())
    }

    /// Recovers a typed engine error that travelled through an `anyhow`
    /// boundary (e.g. raised inside a repository transaction closure).
    pub fn from_anyhow(err: anyhow::Error) -> Self {
        match err.downcast::<EngineError>() {
            Ok(engine) => engine,
            Err(other) => match other.downcast::<rusqlite::Error>() {
                Ok(sql) => Self::from(sql),
                Err(rest) => EngineError::Internal(rest),
            },
        }
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::from_anyhow(err)
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                EngineError::Conflict(err.to_string())
            }
            rusqlite::Error::SqliteFailure(code, _)
                if code.code == rusqlite::ErrorCode::DatabaseBusy
                    || code.code == rusqlite::ErrorCode::DatabaseLocked =>
            {
                EngineError::Unavailable(err.to_string())
            }
            _ => EngineError::Internal(err.into()),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
