pub mod accounts;
mod memory;
mod redis_service;
mod store;

pub use memory::InMemoryStore;
pub use redis_service::RedisStore;
pub use store::{Store, StoreError, StoreResult};
