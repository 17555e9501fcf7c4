use async_trait::async_trait;
use redis::{aio::ConnectionLike, AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Display;
use std::sync::Arc;

use super::store::{Store, StoreError, StoreResult};
use crate::models::{task, ticket, user, NewTask, NewTicket, NewUser, Task, Ticket, User};

const USER: &str = "user";
const TICKET: &str = "ticket";
const TASK: &str = "task";

/// Key layout, all under an optional prefix.
///
/// Records are JSON documents under `user:{id}`, `ticket:{id}` and
/// `task:{id}`. Each kind keeps a set of its ids (`users`, `tickets`,
/// `tasks`) and an `INCR` counter (`next:{kind}`). Usernames and emails are
/// reserved with `SET NX` index keys holding the user id.
#[derive(Clone, Debug, Default)]
struct Keys {
    prefix: String,
}

impl Keys {
    fn record(&self, kind: &str, id: impl Display) -> String {
        format!("{}{}:{}", self.prefix, kind, id)
    }

    fn ids(&self, kind: &str) -> String {
        format!("{}{}s", self.prefix, kind)
    }

    fn counter(&self, kind: &str) -> String {
        format!("{}next:{}", self.prefix, kind)
    }

    fn username(&self, username: &str) -> String {
        format!("{}user:by_username:{}", self.prefix, username)
    }

    fn email(&self, email: &str) -> String {
        format!("{}user:by_email:{}", self.prefix, email)
    }
}

pub struct RedisStore {
    client: Arc<Client>,
    keys: Keys,
}

impl RedisStore {
    pub fn new(client: Arc<Client>) -> Self {
        Self::with_prefix(client, "")
    }

    /// Namespaces every key, so several deployments can share one database.
    pub fn with_prefix(client: Arc<Client>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            keys: Keys {
                prefix: prefix.into(),
            },
        }
    }

    async fn connection(&self) -> StoreResult<redis::aio::Connection> {
        Ok(self.client.get_async_connection().await?)
    }

    async fn next_id<C>(&self, conn: &mut C, kind: &str) -> StoreResult<i64>
    where
        C: ConnectionLike + Send,
    {
        Ok(conn.incr(self.keys.counter(kind), 1).await?)
    }

    /// Writes a new record and lists its id in one transaction.
    async fn insert<T, C>(&self, conn: &mut C, kind: &str, id: i64, value: &T) -> StoreResult<()>
    where
        T: Serialize,
        C: ConnectionLike + Send,
    {
        redis::pipe()
            .atomic()
            .set(self.keys.record(kind, id), encode(value)?)
            .ignore()
            .sadd(self.keys.ids(kind), id)
            .ignore()
            .query_async::<_, ()>(conn)
            .await?;
        Ok(())
    }

    async fn read_user_by_index<C>(&self, conn: &mut C, index_key: &str) -> StoreResult<Option<User>>
    where
        C: ConnectionLike + Send,
    {
        let id: Option<i64> = conn.get(index_key).await?;
        match id {
            Some(id) => read(conn, &self.keys.record(USER, id)).await,
            None => Ok(None),
        }
    }

    /// Loads every record listed in the `kind` id set, in id order.
    async fn read_all<T, C>(&self, conn: &mut C, kind: &str) -> StoreResult<Vec<T>>
    where
        T: DeserializeOwned,
        C: ConnectionLike + Send,
    {
        let mut members: Vec<i64> = conn.smembers(self.keys.ids(kind)).await?;
        if members.is_empty() {
            return Ok(Vec::new());
        }
        members.sort_unstable();

        let keys: Vec<String> = members.iter().map(|id| self.keys.record(kind, id)).collect();
        let documents: Vec<Option<String>> = redis::cmd("MGET").arg(&keys).query_async(conn).await?;

        documents
            .into_iter()
            .flatten()
            .map(|data| decode(&data))
            .collect()
    }
}

impl Clone for RedisStore {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            keys: self.keys.clone(),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> StoreResult<String> {
    Ok(serde_json::to_string(value)?)
}

fn decode<T: DeserializeOwned>(data: &str) -> StoreResult<T> {
    Ok(serde_json::from_str(data)?)
}

async fn read<T, C>(conn: &mut C, key: &str) -> StoreResult<Option<T>>
where
    T: DeserializeOwned,
    C: ConnectionLike + Send,
{
    let data: Option<String> = conn.get(key).await?;
    data.map(|data| decode(&data)).transpose()
}

async fn write<T, C>(conn: &mut C, key: &str, value: &T) -> StoreResult<()>
where
    T: Serialize,
    C: ConnectionLike + Send,
{
    conn.set::<_, _, ()>(key, encode(value)?).await?;
    Ok(())
}

#[async_trait]
impl Store for RedisStore {
    async fn create_user(&self, new_user: NewUser) -> StoreResult<User> {
        let mut conn = self.connection().await?;

        let id = self.next_id(&mut conn, USER).await?;
        let user = new_user.with_id(user::Id(id));
        let username_key = self.keys.username(&user.username);
        let email_key = self.keys.email(&user.email);

        let username_free: bool = conn.set_nx(&username_key, id).await?;
        if !username_free {
            return Err(StoreError::UsernameTaken);
        }
        let email_free: bool = conn.set_nx(&email_key, id).await?;
        if !email_free {
            conn.del::<_, ()>(&username_key).await?;
            return Err(StoreError::EmailTaken);
        }

        // Release the reservations if the record never lands
        if let Err(e) = self.insert(&mut conn, USER, id, &user).await {
            let reserved = vec![username_key, email_key, self.keys.record(USER, id)];
            if let Err(cleanup) = conn.del::<_, ()>(reserved).await {
                tracing::warn!("Failed to release reservations of user {}: {}", id, cleanup);
            }
            return Err(e);
        }

        tracing::debug!("Stored user {} as {}", user.username, user.id);
        Ok(user)
    }

    async fn get_user(&self, id: user::Id) -> StoreResult<Option<User>> {
        let mut conn = self.connection().await?;
        read(&mut conn, &self.keys.record(USER, id)).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let mut conn = self.connection().await?;
        self.read_user_by_index(&mut conn, &self.keys.email(email)).await
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let mut conn = self.connection().await?;
        self.read_user_by_index(&mut conn, &self.keys.username(username)).await
    }

    async fn save_user(&self, user: &User) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        write(&mut conn, &self.keys.record(USER, user.id), user).await
    }

    async fn create_ticket(&self, new_ticket: NewTicket) -> StoreResult<Ticket> {
        let mut conn = self.connection().await?;

        let id = self.next_id(&mut conn, TICKET).await?;
        let ticket = new_ticket.with_id(ticket::Id(id));
        self.insert(&mut conn, TICKET, id, &ticket).await?;

        Ok(ticket)
    }

    async fn get_ticket(&self, id: ticket::Id) -> StoreResult<Option<Ticket>> {
        let mut conn = self.connection().await?;
        read(&mut conn, &self.keys.record(TICKET, id)).await
    }

    async fn save_ticket(&self, ticket: &Ticket) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        write(&mut conn, &self.keys.record(TICKET, ticket.id), ticket).await
    }

    async fn list_tickets(&self) -> StoreResult<Vec<Ticket>> {
        let mut conn = self.connection().await?;
        self.read_all(&mut conn, TICKET).await
    }

    async fn create_task(&self, new_task: NewTask) -> StoreResult<Task> {
        let mut conn = self.connection().await?;

        let id = self.next_id(&mut conn, TASK).await?;
        let task = new_task.with_id(task::Id(id));
        self.insert(&mut conn, TASK, id, &task).await?;

        Ok(task)
    }

    async fn get_task(&self, id: task::Id) -> StoreResult<Option<Task>> {
        let mut conn = self.connection().await?;
        read(&mut conn, &self.keys.record(TASK, id)).await
    }

    async fn save_task(&self, task: &Task) -> StoreResult<()> {
        let mut conn = self.connection().await?;
        write(&mut conn, &self.keys.record(TASK, task.id), task).await
    }

    async fn list_tasks(&self) -> StoreResult<Vec<Task>> {
        let mut conn = self.connection().await?;
        self.read_all(&mut conn, TASK).await
    }
}
