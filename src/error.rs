use thiserror::Error;

pub type Result<T> = std::result::Result<T, DataError>;

#[derive(Error, Debug)]
pub enum DataError {
    /// The store could not be reached or the pool gave up waiting for a connection.
    #[error("store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),

    /// The store rejected the statement or its rows did not decode.
    #[error("invalid query: {0}")]
    InvalidQuery(#[source] sqlx::Error),

    #[error("no matching row")]
    NotFound,

    #[error("a user with email {0} already exists")]
    DuplicateEmail(String),

    /// Rejected before any SQL was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl DataError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        DataError::InvalidInput(message.into())
    }

    /// Only connectivity failures can succeed on a later attempt. Nothing in
    /// this crate retries; callers decide.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DataError::Unavailable(_))
    }

    pub fn is_unique_violation(&self) -> bool {
        match self {
            DataError::InvalidQuery(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

impl From<sqlx::Error> for DataError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DataError::NotFound,
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => DataError::Unavailable(err),
            other => DataError::InvalidQuery(other),
        }
    }
}
