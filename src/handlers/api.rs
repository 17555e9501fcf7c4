use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::AppResult;
use crate::models::{ticket, user, ListingParams, Status};
use crate::query::{ListedTicket, TicketQuery};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AuthorJson {
    pub id: user::Id,
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct TicketJson {
    pub id: ticket::Id,
    pub title: String,
    pub content: String,
    pub status: Status,
    /// Tickets carry no priority; kept in the payload for existing clients.
    pub priority: Option<String>,
    pub created_at: DateTime<Utc>,
    pub deadline: Option<DateTime<Utc>>,
    pub author: AuthorJson,
}

impl From<ListedTicket> for TicketJson {
    fn from(row: ListedTicket) -> Self {
        let ListedTicket { ticket, author } = row;
        Self {
            id: ticket.id,
            title: ticket.title,
            content: ticket.content,
            status: ticket.status,
            priority: None,
            created_at: ticket.created_at,
            deadline: ticket.deadline,
            author: AuthorJson {
                id: author.id,
                username: author.username,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketListing {
    pub tickets: Vec<TicketJson>,
    pub count: usize,
}

pub async fn list_tickets(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> AppResult<Json<TicketListing>> {
    let query = TicketQuery::from_params(&params);
    let rows = query.run(state.store.as_ref(), Utc::now()).await?;

    let tickets: Vec<TicketJson> = rows.into_iter().map(TicketJson::from).collect();
    Ok(Json(TicketListing {
        count: tickets.len(),
        tickets,
    }))
}
