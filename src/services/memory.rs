use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::store::{Store, StoreError, StoreResult};
use crate::models::{task, ticket, user, NewTask, NewTicket, NewUser, Task, Ticket, User};

/// Process-local store used for development and tests.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<user::Id, User>,
    tickets: BTreeMap<ticket::Id, Ticket>,
    tasks: BTreeMap<task::Id, Task>,
    last_user: i64,
    last_ticket: i64,
    last_task: i64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;

        if tables.users.values().any(|u| u.username == new_user.username) {
            return Err(StoreError::UsernameTaken);
        }
        if tables.users.values().any(|u| u.email == new_user.email) {
            return Err(StoreError::EmailTaken);
        }

        tables.last_user += 1;
        let user = new_user.with_id(user::Id(tables.last_user));
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: user::Id) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        self.tables.write().await.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn create_ticket(&self, new_ticket: NewTicket) -> StoreResult<Ticket> {
        let mut tables = self.tables.write().await;
        tables.last_ticket += 1;
        let ticket = new_ticket.with_id(ticket::Id(tables.last_ticket));
        tables.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn get_ticket(&self, id: ticket::Id) -> StoreResult<Option<Ticket>> {
        Ok(self.tables.read().await.tickets.get(&id).cloned())
    }

    async fn save_ticket(&self, ticket: &Ticket) -> StoreResult<()> {
        self.tables.write().await.tickets.insert(ticket.id, ticket.clone());
        Ok(())
    }

    async fn list_tickets(&self) -> StoreResult<Vec<Ticket>> {
        Ok(self.tables.read().await.tickets.values().cloned().collect())
    }

    async fn create_task(&self, new_task: NewTask) -> StoreResult<Task> {
        let mut tables = self.tables.write().await;
        tables.last_task += 1;
        let task = new_task.with_id(task::Id(tables.last_task));
        tables.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn get_task(&self, id: task::Id) -> StoreResult<Option<Task>> {
        Ok(self.tables.read().await.tasks.get(&id).cloned())
    }

    async fn save_task(&self, task: &Task) -> StoreResult<()> {
        self.tables.write().await.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        Ok(self.tables.read().await.tasks.values().cloned().collect())
    }
}
