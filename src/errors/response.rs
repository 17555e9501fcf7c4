use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::errors::AppError;
use crate::notice::Notice;

pub const LOGIN_REQUIRED: &str = "Vous devez être connecté pour accéder à cette page.";

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation { redirect_to, message } => {
                tracing::debug!("Validation failed: {}", message);
                Notice::danger(message).redirect(redirect_to).into_response()
            }

            // Anonymous visitors are sent to the login form
            AppError::Unauthenticated => {
                Notice::warning(LOGIN_REQUIRED).redirect("/login").into_response()
            }

            AppError::Forbidden { redirect_to, message } => {
                tracing::info!("Forbidden: {}", message);
                Notice::danger(message).redirect(redirect_to).into_response()
            }

            AppError::NotFound { redirect_to, message } => {
                Notice::danger(message).redirect(redirect_to).into_response()
            }

            AppError::Store(_) | AppError::Session(_) | AppError::Template(_) | AppError::Hash(_) => {
                tracing::error!("Request failed: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Erreur interne du serveur",
                )
                    .into_response()
            }
        }
    }
}
