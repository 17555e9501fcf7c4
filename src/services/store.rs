use async_trait::async_trait;
use thiserror::Error;

use crate::models::{task, ticket, user, NewTask, NewTicket, NewUser, Task, Ticket, User};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Username already taken")]
    UsernameTaken,

    #[error("Email already taken")]
    EmailTaken,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence for users, tickets and tasks.
///
/// Ids are assigned by the store. Username and email uniqueness is enforced
/// by `create_user` itself, so concurrent registrations cannot both win.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn get_user(&self, id: user::Id) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Overwrites an existing user. Username and email are not re-indexed.
    async fn save_user(&self, user: &User) -> StoreResult<()>;

    async fn create_ticket(&self, ticket: NewTicket) -> StoreResult<Ticket>;

    async fn get_ticket(&self, id: ticket::Id) -> StoreResult<Option<Ticket>>;

    async fn save_ticket(&self, ticket: &Ticket) -> StoreResult<()>;

    async fn list_tickets(&self) -> StoreResult<Vec<Ticket>>;

    /// Tickets written by `author`, newest first.
    async fn list_tickets_by_author(&self, author: user::Id) -> StoreResult<Vec<Ticket>> {
        let mut tickets: Vec<_> = self
            .list_tickets()
            .await?
            .into_iter()
            .filter(|t| t.author == author)
            .collect();
        tickets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(tickets)
    }

    async fn create_task(&self, task: NewTask) -> StoreResult<Task>;

    async fn get_task(&self, id: task::Id) -> StoreResult<Option<Task>>;

    async fn save_task(&self, task: &Task) -> StoreResult<()>;

    async fn list_tasks(&self) -> StoreResult<Vec<Task>>;
}
