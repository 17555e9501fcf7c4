use std::convert::Infallible;

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;

use crate::errors::{AppError, AppResult};
use crate::models::{user, User};
use crate::AppState;

pub const USER_ID_KEY: &str = "user_id";
pub const ROLE_KEY: &str = "role";
pub const USERNAME_KEY: &str = "username";

pub const ADMIN_ONLY: &str = "Accès réservé aux administrateurs.";

/// The user behind the request, if any. Resolved once per request by
/// [`load_current_user`] and handed to handlers as an extractor.
#[derive(Clone, Debug, Default)]
pub struct CurrentUser(pub Option<User>);

impl CurrentUser {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

pub async fn load_current_user(
    State(state): State<AppState>,
    session: Session,
    mut req: Request<Body>,
    next: Next,
) -> AppResult<Response> {
    let user = match session.get::<user::Id>(USER_ID_KEY).await? {
        Some(id) => {
            let user = state.store.get_user(id).await?;
            if user.is_none() {
                tracing::warn!("Session references unknown user {}", id);
            }
            user
        }
        None => None,
    };

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

pub fn require_login(current: &CurrentUser) -> AppResult<&User> {
    current.user().ok_or(AppError::Unauthenticated)
}

pub fn require_admin(current: &CurrentUser) -> AppResult<&User> {
    match current.user() {
        Some(user) if user.is_admin() => Ok(user),
        _ => Err(AppError::forbidden("/", ADMIN_ONLY)),
    }
}

/// Binds a freshly authenticated user to the session, dropping whatever it held.
pub async fn start_session(session: &Session, user: &User) -> AppResult<()> {
    session.clear().await;
    session.cycle_id().await?;
    session.insert(USER_ID_KEY, user.id).await?;
    session.insert(ROLE_KEY, user.role).await?;
    session.insert(USERNAME_KEY, &user.username).await?;
    Ok(())
}

pub async fn end_session(session: &Session) -> AppResult<()> {
    session.flush().await?;
    Ok(())
}

fn current_user(parts: &Parts) -> CurrentUser {
    parts.extensions.get::<CurrentUser>().cloned().unwrap_or_default()
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        Ok(current_user(parts))
    }
}

/// Extractor for handlers that need a signed-in user.
pub struct RequireLogin(pub User);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequireLogin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        require_login(&current_user(parts)).cloned().map(RequireLogin)
    }
}

/// Extractor for administrator-only handlers.
pub struct RequireAdmin(pub User);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        require_admin(&current_user(parts)).cloned().map(RequireAdmin)
    }
}
