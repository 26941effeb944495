use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Store(String),

    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Body returned to API callers. Internal detail stays in the logs.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

impl AppError {
    /// HTTP status the embedding layer should respond with.
    pub fn status(&self) -> u16 {
        match self {
            AppError::Validation(_) => 400,
            AppError::Unauthenticated => 401,
            AppError::Forbidden(_) => 403,
            AppError::NotFound(_) => 404,
            AppError::Conflict(_) => 409,
            AppError::Store(_) | AppError::Config(_) | AppError::Io(_) => 500,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            message: self.to_string(),
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        // Constraint violations carry domain meaning: a foreign key failure
        // means the referenced row is gone (404), a unique failure means a
        // duplicate key (409). Everything else is a storage fault.
        if let rusqlite::Error::SqliteFailure(e, _) = &err {
            match e.extended_code {
                rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return AppError::NotFound("referenced row");
                }
                rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return AppError::Conflict("duplicate value for a unique field".to_string());
                }
                _ => {}
            }
        }
        tracing::error!("sqlite error: {err}");
        AppError::Store(err.to_string())
    }
}

impl From<tokio_rusqlite::Error> for AppError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::Rusqlite(e) => AppError::from(e),
            // Domain errors raised inside a `call` closure travel through
            // the `Other` variant and are unwrapped here.
            tokio_rusqlite::Error::Other(e) => match e.downcast::<AppError>() {
                Ok(app) => *app,
                Err(other) => {
                    tracing::error!("store call failed: {other}");
                    AppError::Store(other.to_string())
                }
            },
            other => {
                tracing::error!("store connection failed: {other}");
                AppError::Store(other.to_string())
            }
        }
    }
}

impl From<AppError> for tokio_rusqlite::Error {
    fn from(err: AppError) -> Self {
        tokio_rusqlite::Error::Other(Box::new(err))
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Config(err.to_string())
    }
}
