use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Unsupported rating scope '{0}': expected one of 'events', 'heats'")]
    UnsupportedScope(String),

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Storage fault: {0}")]
    Storage(String)
}
