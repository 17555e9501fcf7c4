use axum::{
    extract::{Form, Path, Query, State},
    response::Html,
};
use chrono::Utc;

use crate::deadline::parse_deadline;
use crate::errors::{AppError, AppResult};
use crate::middleware::{CurrentUser, RequireAdmin, RequireLogin};
use crate::models::{ticket, AdminTicketForm, ListingParams, NewTicket, Status, Ticket, TicketForm, User};
use crate::notice::{Notice, NoticeParams, Outcome};
use crate::query::TicketQuery;
use crate::views::PageContext;
use crate::AppState;

pub const TITLE_AND_CONTENT_REQUIRED: &str = "Le titre et le contenu sont obligatoires.";
pub const INVALID_DEADLINE: &str = "Format de date limite invalide.";
pub const TICKET_NOT_FOUND: &str = "Ticket introuvable.";
pub const OWN_TICKETS_ONLY: &str = "Vous ne pouvez modifier que vos propres tickets.";
pub const INVALID_STATUS: &str = "Statut invalide.";

pub async fn serve_index(
    State(state): State<AppState>,
    current: CurrentUser,
    Query(params): Query<ListingParams>,
    Query(notice): Query<NoticeParams>,
) -> AppResult<Html<String>> {
    let now = Utc::now();
    let query = TicketQuery::from_params(&params);
    let rows = query.run(state.store.as_ref(), now).await?;
    tracing::debug!("Listing {} ticket(s) for {:?}", rows.len(), query);

    let ctx = PageContext {
        current: &current,
        notice: notice.into_notice(),
    };
    state.views.index(&ctx, "/", &query, &rows, now).await
}

pub async fn serve_new_ticket(
    State(state): State<AppState>,
    RequireLogin(user): RequireLogin,
    Query(notice): Query<NoticeParams>,
) -> AppResult<Html<String>> {
    let current = CurrentUser(Some(user));
    let ctx = PageContext {
        current: &current,
        notice: notice.into_notice(),
    };
    state.views.new_ticket(&ctx).await
}

/// Trimmed title and content, or an error sending the user back to `form_path`.
fn required_text(form: &TicketForm, form_path: &str) -> AppResult<(String, String)> {
    let title = form.title.trim();
    let content = form.content.trim();
    if title.is_empty() || content.is_empty() {
        return Err(AppError::validation(form_path, TITLE_AND_CONTENT_REQUIRED));
    }
    Ok((title.to_string(), content.to_string()))
}

pub async fn create_ticket(
    State(state): State<AppState>,
    RequireLogin(user): RequireLogin,
    Form(form): Form<TicketForm>,
) -> AppResult<Outcome> {
    let (title, content) = required_text(&form, "/tickets/new")?;
    let deadline = parse_deadline(&form.deadline).map_err(|e| {
        tracing::debug!("Rejected deadline {:?}: {}", form.deadline, e);
        AppError::validation("/tickets/new", INVALID_DEADLINE)
    })?;

    let ticket = state
        .store
        .create_ticket(NewTicket {
            title,
            content,
            deadline,
            author: user.id,
            created_at: Utc::now(),
        })
        .await?;
    tracing::info!("User {} created ticket {}", user.username, ticket.id);

    Ok(Notice::success("Ticket créé avec succès.").redirect("/"))
}

/// Loads a ticket the user is allowed to edit.
async fn owned_ticket(state: &AppState, user: &User, id: ticket::Id) -> AppResult<Ticket> {
    let ticket = state
        .store
        .get_ticket(id)
        .await?
        .ok_or_else(|| AppError::not_found("/", TICKET_NOT_FOUND))?;

    if ticket.author != user.id {
        tracing::warn!("User {} tried to edit ticket {} of user {}", user.id, id, ticket.author);
        return Err(AppError::forbidden("/", OWN_TICKETS_ONLY));
    }
    Ok(ticket)
}

pub async fn serve_edit_ticket(
    State(state): State<AppState>,
    RequireLogin(user): RequireLogin,
    Path(id): Path<i64>,
    Query(notice): Query<NoticeParams>,
) -> AppResult<Html<String>> {
    let ticket = owned_ticket(&state, &user, ticket::Id(id)).await?;

    let current = CurrentUser(Some(user));
    let ctx = PageContext {
        current: &current,
        notice: notice.into_notice(),
    };
    state.views.edit_ticket(&ctx, &ticket).await
}

pub async fn update_ticket(
    State(state): State<AppState>,
    RequireLogin(user): RequireLogin,
    Path(id): Path<i64>,
    Form(form): Form<TicketForm>,
) -> AppResult<Outcome> {
    let mut ticket = owned_ticket(&state, &user, ticket::Id(id)).await?;
    let (title, content) = required_text(&form, &format!("/tickets/{}/edit", id))?;

    ticket.edit(title, content, Utc::now());
    state.store.save_ticket(&ticket).await?;

    Ok(Notice::success("Ticket modifié avec succès.").redirect("/"))
}

pub async fn admin_update_ticket(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<i64>,
    Form(form): Form<AdminTicketForm>,
) -> AppResult<Outcome> {
    let mut ticket = state
        .store
        .get_ticket(ticket::Id(id))
        .await?
        .ok_or_else(|| AppError::not_found("/", TICKET_NOT_FOUND))?;

    let status = match form.status.as_deref() {
        None => ticket.status,
        Some(code) => code.parse::<Status>().map_err(|e| {
            tracing::debug!("Rejected status {:?} for ticket {}", e.0, id);
            AppError::validation("/", INVALID_STATUS)
        })?,
    };
    let response = Some(form.admin_response).filter(|text| !text.trim().is_empty());

    ticket.triage(status, response, Utc::now());
    state.store.save_ticket(&ticket).await?;
    tracing::info!("Admin {} set ticket {} to {}", admin.username, ticket.id, ticket.status);

    Ok(Notice::success("Ticket mis à jour.").redirect("/"))
}
