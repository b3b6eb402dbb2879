use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The pool couldn't get or keep a connection: refused, reset, pool
    /// exhausted and timed out acquiring. The health probe treats this as
    /// "store unreachable".
    #[error("store connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// A connection was available but the query itself failed.
    #[error("store query error: {0}")]
    Query(#[source] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub(crate) fn classify(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
            StoreError::Connection(err)
        }
        _ => StoreError::Query(err),
    }
}

/// True when `err` is a UNIQUE-constraint violation raised by the driver
/// rather than swallowed by `ON CONFLICT DO NOTHING`. Some driver/server
/// combinations still raise here instead of reporting zero affected rows;
/// the Writer treats this the same as a reported-zero conflict.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}
