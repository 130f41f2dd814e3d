use thiserror::Error as ThisError;

/// Failures surfaced by the workout and template operations.
///
/// Everything except [`KirokuError::Database`] and [`KirokuError::Config`] is
/// recoverable by the caller: the operation was refused and no state changed.
#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum KirokuError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(sqlx::Error),
}

pub type Result<T> = std::result::Result<T, KirokuError>;

impl KirokuError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        KirokuError::NotFound(format!("{entity} with id {id}"))
    }

    pub fn forbidden<D: std::fmt::Display>(d: D) -> Self {
        KirokuError::Forbidden(d.to_string())
    }

    pub fn invalid_state<D: std::fmt::Display>(d: D) -> Self {
        KirokuError::InvalidState(d.to_string())
    }

    pub fn conflict<D: std::fmt::Display>(d: D) -> Self {
        KirokuError::Conflict(d.to_string())
    }

    /// Stable machine-readable code for the outer layer.
    pub fn code(&self) -> &'static str {
        match self {
            KirokuError::NotFound(_) => "NOT_FOUND",
            KirokuError::Forbidden(_) => "FORBIDDEN",
            KirokuError::InvalidState(_) => "INVALID_STATE",
            KirokuError::Conflict(_) => "CONFLICT",
            KirokuError::Unauthorized(_) => "UNAUTHORIZED",
            KirokuError::Config(_) => "CONFIG_ERROR",
            KirokuError::Database(_) => "INTERNAL_ERROR",
        }
    }
}

/// Constraint violations raised by the store are folded into the domain
/// taxonomy: unique indexes become `Conflict`, dangling references `NotFound`.
impl From<sqlx::Error> for KirokuError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return KirokuError::Conflict(db_err.message().to_string());
            }
            if db_err.is_foreign_key_violation() {
                return KirokuError::NotFound(db_err.message().to_string());
            }
        }
        KirokuError::Database(e)
    }
}
