pub mod config;
pub mod deadline;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod notice;
pub mod query;
pub mod services;
pub mod validation;
pub mod views;

use std::{path::Path, sync::Arc};

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir};
use tower_sessions::{
    cookie::{time::Duration, SameSite},
    Expiry, MemoryStore, SessionManagerLayer,
};

use crate::config::{HttpConfig, SecurityConfig, SessionConfig};
use crate::services::Store;
use crate::views::Views;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub views: Views,
    pub security: SecurityConfig,
}

pub fn app(state: AppState, session: &SessionConfig, http: &HttpConfig) -> Router {
    let mut session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(session.secure)
        .with_same_site(SameSite::Lax)
        .with_name(session.cookie_name.clone());
    if let Some(minutes) = session.inactivity_minutes {
        session_layer = session_layer.with_expiry(Expiry::OnInactivity(Duration::minutes(minutes)));
    }

    Router::new()
        // Tickets
        .route("/", get(handlers::serve_index))
        .route("/api/tickets", get(handlers::list_tickets))
        .route("/tickets/new", get(handlers::serve_new_ticket).post(handlers::create_ticket))
        .route("/tickets/:id/edit", get(handlers::serve_edit_ticket).post(handlers::update_ticket))
        .route("/tickets/:id/admin", post(handlers::admin_update_ticket))

        // Accounts
        .route("/register", get(handlers::serve_register_page).post(handlers::handle_register))
        .route("/login", get(handlers::serve_login_page).post(handlers::handle_login))
        .route("/logout", get(handlers::handle_logout))
        .route("/profile", get(handlers::redirect_to_own_profile))
        .route("/users/:id", get(handlers::serve_profile).post(handlers::update_password))

        // Planning
        .route("/tasks/", get(handlers::serve_planning))
        .route("/tasks/addTask", post(handlers::create_root_task))
        .route("/tasks/:parent_id/addTask", post(handlers::create_sub_task))
        .route("/tasks/:id/status", post(handlers::update_task_status))

        .nest_service("/static", ServeDir::new(Path::new(&http.static_dir)))

        .layer(from_fn_with_state(state.clone(), middleware::load_current_user))
        .layer(session_layer)
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(http.max_body_size))
        .with_state(state)
}
