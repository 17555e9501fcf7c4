use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Id(pub i64);

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Status {
    /// Waiting for an administrator.
    #[default]
    #[serde(rename = "en_attente")]
    Pending,

    /// An administrator is working on it.
    #[serde(rename = "en_cours")]
    InProgress,

    /// Closed by an administrator.
    #[serde(rename = "resolu")]
    Resolved,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Pending, Status::InProgress, Status::Resolved];

    pub fn code(&self) -> &'static str {
        match self {
            Status::Pending => "en_attente",
            Status::InProgress => "en_cours",
            Status::Resolved => "resolu",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Status::Pending => "En attente",
            Status::InProgress => "En cours",
            Status::Resolved => "Résolu",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl FromStr for Status {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.code() == s)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Ticket {
    pub id: Id,
    pub title: String,
    pub content: String,
    pub status: Status,
    pub admin_response: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: user::Id,
}

impl Ticket {
    /// Author-side edit: only title and content move.
    pub fn edit(&mut self, title: String, content: String, now: DateTime<Utc>) {
        self.title = title;
        self.content = content;
        self.updated_at = now;
    }

    /// Administrator triage: only status and response move.
    pub fn triage(&mut self, status: Status, admin_response: Option<String>, now: DateTime<Utc>) {
        self.status = status;
        self.admin_response = admin_response;
        self.updated_at = now;
    }
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub title: String,
    pub content: String,
    pub deadline: Option<DateTime<Utc>>,
    pub author: user::Id,
    pub created_at: DateTime<Utc>,
}

impl NewTicket {
    pub fn with_id(self, id: Id) -> Ticket {
        Ticket {
            id,
            title: self.title,
            content: self.content,
            status: Status::Pending,
            admin_response: None,
            deadline: self.deadline,
            created_at: self.created_at,
            updated_at: self.created_at,
            author: self.author,
        }
    }
}
