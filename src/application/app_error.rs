use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Duplicate key: {0}")]
    Conflict(String),

    #[error("No user available. Set NOAUTH_USER_ID or enable auth.")]
    NoIdentity,

    #[error("Not found")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        // Unique violations get their own variant so the create path can
        // retry them; everything else is an opaque database failure.
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some("23505") {
                return AppError::Conflict(db.message().to_string());
            }
        }
        AppError::Database(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
