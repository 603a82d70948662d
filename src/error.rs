// Error type shared by the record layer, the listings, and the server

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// No row with the given public identifier
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    /// A field value rejected before it reached the database
    #[error("invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// UNIQUE / FOREIGN KEY / NOT NULL rejected by SQLite
    #[error("constraint violated: {0}")]
    Constraint(String),

    #[error("unknown sort option: {0}")]
    UnknownSortOption(String),

    #[error("database error: {0}")]
    Database(rusqlite::Error),

    #[cfg(feature = "server")]
    #[error("template error: {0}")]
    Template(#[from] tera::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        Error::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, Error::Constraint(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, message)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::Constraint(message.unwrap_or_else(|| code.to_string()))
            }
            other => Error::Database(other),
        }
    }
}
