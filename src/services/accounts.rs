use bcrypt::{hash, verify, BcryptError};
use chrono::Utc;
use std::sync::OnceLock;

use super::store::{Store, StoreError};
use crate::config::AdminConfig;
use crate::errors::AppResult;
use crate::models::{NewUser, Role, User};

static UNKNOWN_USER_HASH: OnceLock<String> = OnceLock::new();

pub fn hash_password(password: &str, cost: u32) -> Result<String, BcryptError> {
    hash(password.as_bytes(), cost)
}

pub fn verify_password(password: &str, user: &User) -> Result<bool, BcryptError> {
    verify(password, &user.password_hash)
}

/// Runs one bcrypt verification against a throwaway hash when no account
/// matches, so a failed login costs the same whether the email exists or not.
/// Always `false`.
pub fn verify_unknown_user(password: &str, cost: u32) -> Result<bool, BcryptError> {
    let dummy = match UNKNOWN_USER_HASH.get() {
        Some(dummy) => dummy,
        None => {
            let dummy = hash_password("no such account", cost)?;
            UNKNOWN_USER_HASH.get_or_init(|| dummy)
        }
    };
    verify(password, dummy)?;
    Ok(false)
}

/// Creates the configured administrator unless a user already holds its email.
pub async fn ensure_admin(store: &dyn Store, admin: &AdminConfig, cost: u32) -> AppResult<User> {
    let email = admin.email.trim().to_lowercase();

    if let Some(existing) = store.find_user_by_email(&email).await? {
        if !existing.is_admin() {
            tracing::warn!("Configured admin email {} belongs to an ordinary user", email);
        }
        return Ok(existing);
    }

    let user = NewUser {
        username: admin.username.trim().to_string(),
        email,
        password_hash: hash_password(&admin.password, cost)?,
        role: Role::Admin,
        created_at: Utc::now(),
    };

    match store.create_user(user).await {
        Ok(user) => {
            tracing::info!("Created administrator account {}", user.username);
            Ok(user)
        }
        Err(StoreError::UsernameTaken) => {
            tracing::warn!("Cannot create administrator: username {} is taken", admin.username);
            Err(StoreError::UsernameTaken.into())
        }
        Err(e) => Err(e.into()),
    }
}
