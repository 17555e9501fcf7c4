use axum::{
    extract::{Form, Path, Query, State},
    response::Html,
};
use chrono::Utc;

use crate::errors::{AppError, AppResult};
use crate::middleware::{CurrentUser, RequireLogin};
use crate::models::{user, PasswordForm, User};
use crate::notice::{Notice, NoticeParams, Outcome};
use crate::query::ListedTicket;
use crate::services::accounts::{hash_password, verify_password};
use crate::views::PageContext;
use crate::AppState;

pub const USER_NOT_FOUND: &str = "Utilisateur introuvable.";
pub const OWN_PASSWORD_ONLY: &str = "Vous ne pouvez modifier le mot de passe que sur votre propre profil.";
pub const PASSWORDS_REQUIRED: &str = "Veuillez renseigner l'ancien et le nouveau mot de passe.";
pub const WRONG_PASSWORD: &str = "Mot de passe actuel invalide.";

pub async fn redirect_to_own_profile(RequireLogin(user): RequireLogin) -> Outcome {
    Outcome::to(format!("/users/{}", user.id))
}

async fn find_user(state: &AppState, id: user::Id) -> AppResult<User> {
    state
        .store
        .get_user(id)
        .await?
        .ok_or_else(|| AppError::not_found("/", USER_NOT_FOUND))
}

pub async fn serve_profile(
    State(state): State<AppState>,
    RequireLogin(viewer): RequireLogin,
    Path(id): Path<i64>,
    Query(notice): Query<NoticeParams>,
) -> AppResult<Html<String>> {
    let profile_user = find_user(&state, user::Id(id)).await?;

    let tickets: Vec<ListedTicket> = state
        .store
        .list_tickets_by_author(profile_user.id)
        .await?
        .into_iter()
        .map(|ticket| ListedTicket {
            ticket,
            author: profile_user.clone(),
        })
        .collect();

    let is_own_profile = viewer.id == profile_user.id;
    let current = CurrentUser(Some(viewer));
    let ctx = PageContext {
        current: &current,
        notice: notice.into_notice(),
    };
    state
        .views
        .profile(&ctx, &profile_user, &tickets, is_own_profile, Utc::now())
        .await
}

pub async fn update_password(
    State(state): State<AppState>,
    RequireLogin(viewer): RequireLogin,
    Path(id): Path<i64>,
    Form(form): Form<PasswordForm>,
) -> AppResult<Outcome> {
    let mut account = find_user(&state, user::Id(id)).await?;
    let profile_path = format!("/users/{}", account.id);

    if account.id != viewer.id {
        tracing::warn!("User {} tried to change the password of user {}", viewer.id, account.id);
        return Err(AppError::forbidden(profile_path, OWN_PASSWORD_ONLY));
    }

    if form.current_password.is_empty() || form.new_password.is_empty() {
        return Err(AppError::validation(profile_path, PASSWORDS_REQUIRED));
    }

    if !verify_password(&form.current_password, &account)? {
        return Err(AppError::validation(profile_path, WRONG_PASSWORD));
    }

    account.password_hash = hash_password(&form.new_password, state.security.bcrypt_cost)?;
    state.store.save_user(&account).await?;
    tracing::info!("User {} changed their password", account.username);

    Ok(Notice::success("Mot de passe mis à jour.").redirect(profile_path))
}
