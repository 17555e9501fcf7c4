use axum::{
    extract::{Form, Query, State},
    response::Html,
};
use chrono::Utc;
use tower_sessions::Session;

use crate::errors::{AppError, AppResult};
use crate::middleware::{end_session, start_session, CurrentUser};
use crate::models::{LoginForm, NewUser, RegisterForm, Role};
use crate::notice::{Notice, NoticeParams, Outcome};
use crate::services::accounts::{hash_password, verify_password, verify_unknown_user};
use crate::services::StoreError;
use crate::validation::{check_email, check_username, ValidationError};
use crate::views::PageContext;
use crate::AppState;

pub const INVALID_CREDENTIALS: &str = "Identifiants invalides.";

pub async fn serve_register_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(notice): Query<NoticeParams>,
) -> AppResult<Html<String>> {
    let ctx = PageContext {
        current: &current,
        notice: notice.into_notice(),
    };
    state.views.register(&ctx).await
}

pub async fn handle_register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> AppResult<Outcome> {
    let rejected = |e: ValidationError| AppError::validation("/register", e);

    let username = form.username.trim().to_string();
    let email = form.email.trim().to_lowercase();
    if username.is_empty() || email.is_empty() || form.password.is_empty() {
        return Err(rejected(ValidationError::MissingFields));
    }

    check_email(&email).map_err(rejected)?;
    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(rejected(ValidationError::EmailTaken));
    }

    check_username(&username).map_err(rejected)?;
    if state.store.find_user_by_username(&username).await?.is_some() {
        return Err(rejected(ValidationError::UsernameTaken));
    }

    let new_user = NewUser {
        username,
        email,
        password_hash: hash_password(&form.password, state.security.bcrypt_cost)?,
        role: Role::User,
        created_at: Utc::now(),
    };

    // The store has the last word on uniqueness
    let user = match state.store.create_user(new_user).await {
        Ok(user) => user,
        Err(StoreError::EmailTaken) => return Err(rejected(ValidationError::EmailTaken)),
        Err(StoreError::UsernameTaken) => return Err(rejected(ValidationError::UsernameTaken)),
        Err(e) => return Err(e.into()),
    };

    tracing::info!("Registered user {} ({})", user.username, user.id);
    start_session(&session, &user).await?;

    Ok(Notice::success("Compte créé avec succès.").redirect("/"))
}

pub async fn serve_login_page(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(notice): Query<NoticeParams>,
) -> AppResult<Html<String>> {
    let ctx = PageContext {
        current: &current,
        notice: notice.into_notice(),
    };
    state.views.login(&ctx).await
}

pub async fn handle_login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> AppResult<Outcome> {
    let email = form.email.trim().to_lowercase();

    // Unknown email and wrong password look the same from outside, timing included
    let user = match state.store.find_user_by_email(&email).await? {
        Some(user) => verify_password(&form.password, &user)?.then_some(user),
        None => {
            verify_unknown_user(&form.password, state.security.bcrypt_cost)?;
            None
        }
    };
    let Some(user) = user else {
        tracing::info!("Failed login attempt for {}", email);
        return Err(AppError::validation("/login", INVALID_CREDENTIALS));
    };

    start_session(&session, &user).await?;
    tracing::info!("User {} logged in", user.username);

    Ok(Notice::success("Connexion réussie.").redirect("/"))
}

pub async fn handle_logout(session: Session) -> AppResult<Outcome> {
    end_session(&session).await?;
    Ok(Notice::info("Vous êtes déconnecté.").redirect("/"))
}
