use error_stack::Report;
use thiserror::Error;

/// Database related errors
#[derive(Debug, Error)]
pub enum Error {
    /// An error caused by an invalid Postgres connection
    /// url for either the primary or the replica pool.
    #[error("invalid connection url")]
    InvalidUrl,
    /// A Postgres constraint rejected the write. Covers not-null,
    /// foreign key and unique violations.
    #[error("constraint violation: {0}")]
    Constraint(String),
    /// An error caused by an [`sqlx`] error.
    #[error("received a pool error: {0}")]
    Internal(sqlx::Error),
    /// Pending migrations could not be applied.
    #[error("failed to run migrations: {0}")]
    Migrate(sqlx::migrate::MigrateError),
    /// Either the primary or replica database pools do not
    /// have reliable connection to transact to the database.
    #[error("unhealthy database pool")]
    UnhealthyPool,
}

/// Postgres error codes for not-null, foreign key and unique violations.
const CONSTRAINT_CODES: [&str; 3] = ["23502", "23503", "23505"];

/// Converts from a generic [sqlx] result into a [database compatible error](Error).
pub trait ErrorExt<T> {
    fn into_db_error(self) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, sqlx::Error> {
    fn into_db_error(self) -> Result<T> {
        self.map_err(|e| match &e {
            sqlx::Error::Database(err)
                if err
                    .code()
                    .as_deref()
                    .is_some_and(|code| CONSTRAINT_CODES.contains(&code)) =>
            {
                let message = err.message().to_owned();
                Report::new(e).change_context(Error::Constraint(message))
            }
            _ => Report::new(Error::Internal(e)),
        })
    }
}

/// Lazily typed [`std::result::Result`] but the error generic
/// is filled up with [a database error](Error).
pub type Result<T> = error_stack::Result<T, Error>;

/// Checks on `Report<Error>` without downcasting at every call site.
pub trait ReportExt {
    fn is_unhealthy(&self) -> bool;
    fn is_constraint(&self) -> bool;
}

impl ReportExt for error_stack::Report<Error> {
    fn is_unhealthy(&self) -> bool {
        self.downcast_ref::<Error>()
            .map(|v| matches!(v, Error::UnhealthyPool))
            .unwrap_or_default()
    }

    fn is_constraint(&self) -> bool {
        self.downcast_ref::<Error>()
            .map(|v| matches!(v, Error::Constraint(..)))
            .unwrap_or_default()
    }
}
