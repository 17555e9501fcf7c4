//! Filtering and ordering of the ticket listings.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use futures::future::try_join_all;

use crate::models::{ticket, user, ListingParams, Status, Ticket, User};
use crate::services::{Store, StoreResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusFilter {
    All,
    Only(Status),
    /// A status code nobody uses; matches nothing.
    Unrecognized(String),
}

impl StatusFilter {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "" | "all" => StatusFilter::All,
            code => code
                .parse()
                .map(StatusFilter::Only)
                .unwrap_or_else(|_| StatusFilter::Unrecognized(code.to_string())),
        }
    }

    pub fn as_param(&self) -> &str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Only(status) => status.code(),
            StatusFilter::Unrecognized(code) => code,
        }
    }

    fn accepts(&self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
            StatusFilter::Unrecognized(_) => false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Recent,
    Oldest,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Self {
        if raw == "oldest" {
            SortOrder::Oldest
        } else {
            SortOrder::Recent
        }
    }

    pub fn as_param(&self) -> &'static str {
        match self {
            SortOrder::Recent => "recent",
            SortOrder::Oldest => "oldest",
        }
    }
}

/// A ticket joined with its author.
#[derive(Debug, Clone)]
pub struct ListedTicket {
    pub ticket: Ticket,
    pub author: User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketQuery {
    pub status: StatusFilter,
    pub text: String,
    pub author: String,
    pub overdue_only: bool,
    pub sort: SortOrder,
}

impl Default for TicketQuery {
    fn default() -> Self {
        Self {
            status: StatusFilter::All,
            text: String::new(),
            author: String::new(),
            overdue_only: false,
            sort: SortOrder::Recent,
        }
    }
}

impl TicketQuery {
    pub fn from_params(params: &ListingParams) -> Self {
        Self {
            status: StatusFilter::parse(params.status.as_deref().unwrap_or("all")),
            text: params.q.as_deref().unwrap_or_default().trim().to_string(),
            author: params.author.as_deref().unwrap_or_default().trim().to_string(),
            overdue_only: params.overdue.as_deref() == Some("1"),
            sort: SortOrder::parse(params.sort.as_deref().unwrap_or("recent")),
        }
    }

    pub fn matches(&self, ticket: &Ticket, author: &User, now: DateTime<Utc>) -> bool {
        if !self.status.accepts(ticket.status) {
            return false;
        }

        if !self.text.is_empty()
            && !contains_ignore_case(&ticket.title, &self.text)
            && !contains_ignore_case(&ticket.content, &self.text)
        {
            return false;
        }

        if !self.author.is_empty() && !contains_ignore_case(&author.username, &self.author) {
            return false;
        }

        if self.overdue_only && !is_overdue(ticket, now) {
            return false;
        }

        true
    }

    /// Keeps the matching rows and orders them by creation time.
    pub fn apply(&self, rows: Vec<ListedTicket>, now: DateTime<Utc>) -> Vec<ListedTicket> {
        let mut rows: Vec<_> = rows
            .into_iter()
            .filter(|row| self.matches(&row.ticket, &row.author, now))
            .collect();

        match self.sort {
            SortOrder::Recent => rows.sort_by(|a, b| b.ticket.created_at.cmp(&a.ticket.created_at)),
            SortOrder::Oldest => rows.sort_by(|a, b| a.ticket.created_at.cmp(&b.ticket.created_at)),
        }
        rows
    }

    /// Loads every ticket with its author and applies the query.
    pub async fn run(&self, store: &dyn Store, now: DateTime<Utc>) -> StoreResult<Vec<ListedTicket>> {
        let tickets = store.list_tickets().await?;
        let rows = join_authors(store, tickets).await?;
        Ok(self.apply(rows, now))
    }
}

/// Deadline passed and not resolved yet.
pub fn is_overdue(ticket: &Ticket, now: DateTime<Utc>) -> bool {
    ticket.status != Status::Resolved
        && ticket
            .deadline
            .map_or(false, |deadline| crate::deadline::is_late(deadline, now))
}

/// Inner join of tickets on their authors; tickets whose author vanished are dropped.
pub async fn join_authors(store: &dyn Store, tickets: Vec<Ticket>) -> StoreResult<Vec<ListedTicket>> {
    let author_ids: BTreeSet<user::Id> = tickets.iter().map(|t| t.author).collect();
    let authors: HashMap<user::Id, User> =
        try_join_all(author_ids.into_iter().map(|id| store.get_user(id)))
            .await?
            .into_iter()
            .flatten()
            .map(|user| (user.id, user))
            .collect();

    Ok(tickets
        .into_iter()
        .filter_map(|ticket| match authors.get(&ticket.author) {
            Some(author) => Some(ListedTicket {
                author: author.clone(),
                ticket,
            }),
            None => {
                tracing::warn!("Ticket {} references missing user {}", ticket.id, ticket.author);
                None
            }
        })
        .collect())
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Looks a single ticket up together with its author.
pub async fn find_listed(store: &dyn Store, id: ticket::Id) -> StoreResult<Option<ListedTicket>> {
    let Some(ticket) = store.get_ticket(id).await? else {
        return Ok(None);
    };
    Ok(store
        .get_user(ticket.author)
        .await?
        .map(|author| ListedTicket { ticket, author }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, 15, 12, 0, 0).unwrap()
    }

    fn user(id: i64, username: &str) -> User {
        User {
            id: user::Id(id),
            username: username.into(),
            email: format!("{username}@example.com"),
            password_hash: String::new(),
            role: Default::default(),
            created_at: now(),
        }
    }

    fn row(id: i64, author: &User, title: &str, content: &str, status: Status, age_hours: i64) -> ListedTicket {
        let created_at = now() - Duration::hours(age_hours);
        ListedTicket {
            ticket: Ticket {
                id: ticket::Id(id),
                title: title.into(),
                content: content.into(),
                status,
                admin_response: None,
                deadline: None,
                created_at,
                updated_at: created_at,
                author: author.id,
            },
            author: author.clone(),
        }
    }

    fn with_deadline(mut row: ListedTicket, deadline: DateTime<Utc>) -> ListedTicket {
        row.ticket.deadline = Some(deadline);
        row
    }

    fn ids(rows: &[ListedTicket]) -> Vec<i64> {
        rows.iter().map(|r| r.ticket.id.0).collect()
    }

    fn sample() -> Vec<ListedTicket> {
        let alice = user(1, "alice");
        let bob = user(2, "bobby");
        vec![
            row(1, &alice, "Bug API", "Erreur 500", Status::Pending, 5),
            row(2, &bob, "Login page", "The API rejects my password", Status::InProgress, 3),
            row(3, &alice, "Typo", "Footer text", Status::Resolved, 1),
            row(4, &bob, "Slow search", "Takes ages", Status::Pending, 10),
        ]
    }

    fn params(pairs: &[(&str, &str)]) -> ListingParams {
        let get = |key: &str| pairs.iter().find(|(k, _)| *k == key).map(|(_, v)| v.to_string());
        ListingParams {
            status: get("status"),
            sort: get("sort"),
            q: get("q"),
            author: get("author"),
            overdue: get("overdue"),
        }
    }

    fn run(pairs: &[(&str, &str)], rows: Vec<ListedTicket>) -> Vec<i64> {
        ids(&TicketQuery::from_params(&params(pairs)).apply(rows, now()))
    }

    #[test]
    fn defaults_to_everything_newest_first() {
        assert_eq!(run(&[], sample()), vec![3, 2, 1, 4]);
    }

    #[test]
    fn oldest_sort_reverses_order() {
        assert_eq!(run(&[("sort", "oldest")], sample()), vec![4, 1, 2, 3]);
        assert_eq!(run(&[("sort", "whatever")], sample()), vec![3, 2, 1, 4]);
    }

    #[test]
    fn filters_on_exact_status() {
        assert_eq!(run(&[("status", "en_attente")], sample()), vec![1, 4]);
        assert_eq!(run(&[("status", "resolu")], sample()), vec![3]);
        assert_eq!(run(&[("status", "all")], sample()).len(), 4);
        assert!(run(&[("status", "closed")], sample()).is_empty());
    }

    #[test]
    fn text_search_spans_title_and_content_case_insensitively() {
        assert_eq!(run(&[("q", "api")], sample()), vec![2, 1]);
        assert_eq!(run(&[("q", "  FOOTER ")], sample()), vec![3]);
        assert_eq!(run(&[("q", "")], sample()).len(), 4);
    }

    #[test]
    fn author_filter_is_a_substring_match() {
        assert_eq!(run(&[("author", "BOB")], sample()), vec![2, 4]);
        assert_eq!(run(&[("author", "lic")], sample()), vec![3, 1]);
        assert!(run(&[("author", "carol")], sample()).is_empty());
    }

    #[test]
    fn filters_combine() {
        assert_eq!(
            run(&[("status", "en_attente"), ("author", "alice"), ("q", "erreur")], sample()),
            vec![1]
        );
    }

    #[test]
    fn overdue_only_keeps_unresolved_past_deadlines() {
        let alice = user(1, "alice");
        let rows = vec![
            // no deadline
            row(1, &alice, "A", "a", Status::Pending, 1),
            // past deadline, pending
            with_deadline(row(2, &alice, "B", "b", Status::Pending, 2), now() - Duration::days(1)),
            // past deadline, resolved
            with_deadline(row(3, &alice, "C", "c", Status::Resolved, 3), now() - Duration::days(1)),
            // future deadline
            with_deadline(row(4, &alice, "D", "d", Status::InProgress, 4), now() + Duration::days(1)),
            // deadline exactly now is not late yet
            with_deadline(row(5, &alice, "E", "e", Status::Pending, 5), now()),
            // past deadline, in progress
            with_deadline(row(6, &alice, "F", "f", Status::InProgress, 6), now() - Duration::seconds(1)),
        ];

        assert_eq!(run(&[("overdue", "1")], rows.clone()), vec![2, 6]);
        assert_eq!(run(&[("overdue", "0")], rows).len(), 6);
    }

    #[test]
    fn status_filter_round_trips_its_parameter() {
        assert_eq!(StatusFilter::parse("en_cours").as_param(), "en_cours");
        assert_eq!(StatusFilter::parse("").as_param(), "all");
        assert_eq!(StatusFilter::parse("nope").as_param(), "nope");
    }
}
