use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Database query failed: {0}")]
    QueryFailure(#[source] libsql::Error),

    #[error("Failed to get a database connection: {0}")]
    Pool(#[from] deadpool::managed::PoolError<libsql::Error>),

    #[error("Record not found")]
    NotFound,

    #[error("A record with this URL already exists")]
    Conflict,

    #[error("Value does not fit in storage: {0}")]
    OutOfRange(&'static str),

    #[error("Stored row is invalid: {0}")]
    CorruptRow(String),
}

impl From<libsql::Error> for RegistryError {
    fn from(error: libsql::Error) -> Self {
        let message = error.to_string();
        if message.contains("UNIQUE constraint failed") {
            RegistryError::Conflict
        } else if message.contains("FOREIGN KEY constraint failed") {
            // The referenced target was deleted
            RegistryError::NotFound
        } else {
            RegistryError::QueryFailure(error)
        }
    }
}

pub type RegistryResult<T> = Result<T, RegistryError>;
