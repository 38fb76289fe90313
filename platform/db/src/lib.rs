//! Data-access layer: pool wiring plus the generic table operations and
//! user-record operations everything else forwards to.

use sea_orm::{Database, DatabaseConnection, DbErr};
use thiserror::Error;

mod table;
mod users;

pub use table::{TableQuery, delete_rows, execute_raw, fetch_rows, insert_row, update_rows};
pub use users::{NewUser, UserChanges, create_user, delete_user, is_unique_violation, update_user};

/// Shared connection pool alias.
pub type DbPool = DatabaseConnection;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("database url missing")]
    MissingUrl,
    #[error("invalid identifier: {0}")]
    BadIdentifier(String),
    #[error("no columns to write")]
    NoColumns,
    #[error(transparent)]
    Db(#[from] DbErr),
}

pub type DbResult<T> = Result<T, DbError>;

/// Environment-driven connection settings.
#[derive(Clone, Debug)]
pub struct DatabaseSettings {
    pub url: String,
}

impl DatabaseSettings {
    pub fn from_env() -> DbResult<Self> {
        std::env::var("DATABASE_URL")
            .map(|url| Self { url })
            .map_err(|_| DbError::MissingUrl)
    }
}

pub async fn connect(settings: &DatabaseSettings) -> DbResult<DbPool> {
    Database::connect(&settings.url).await.map_err(Into::into)
}

/// Every failed operation is logged before the error is handed back.
pub(crate) fn log_failure<T>(op: &'static str, result: DbResult<T>) -> DbResult<T> {
    if let Err(err) = &result {
        tracing::error!(op, error = %err, "data access operation failed");
    }
    result
}

/// Table and column names come in from the request path; only plain SQL
/// identifiers may reach statement assembly.
pub(crate) fn ensure_identifier(name: &str) -> DbResult<&str> {
    let mut chars = name.chars();
    let head_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    let tail_ok = name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if head_ok && tail_ok && name.len() <= 63 {
        Ok(name)
    } else {
        Err(DbError::BadIdentifier(name.to_string()))
    }
}
