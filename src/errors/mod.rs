// Application error type; `response` turns it into redirects or 500s.
use thiserror::Error;

pub mod response;

use crate::services::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    /// Bad form input; the user is sent back to `redirect_to`.
    #[error("{message}")]
    Validation { redirect_to: String, message: String },

    #[error("Authentication required")]
    Unauthenticated,

    #[error("{message}")]
    Forbidden { redirect_to: String, message: String },

    #[error("{message}")]
    NotFound { redirect_to: String, message: String },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Template error: {0}")]
    Template(#[from] std::io::Error),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

impl AppError {
    pub fn validation(redirect_to: impl Into<String>, message: impl ToString) -> Self {
        AppError::Validation {
            redirect_to: redirect_to.into(),
            message: message.to_string(),
        }
    }

    pub fn forbidden(redirect_to: impl Into<String>, message: impl ToString) -> Self {
        AppError::Forbidden {
            redirect_to: redirect_to.into(),
            message: message.to_string(),
        }
    }

    pub fn not_found(redirect_to: impl Into<String>, message: impl ToString) -> Self {
        AppError::NotFound {
            redirect_to: redirect_to.into(),
            message: message.to_string(),
        }
    }
}

// Custom result type
pub type AppResult<T> = Result<T, AppError>;
