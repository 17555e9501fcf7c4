use std::sync::Arc;

use anyhow::Context;

use ticket_desk::{
    app,
    config::{Config, StorageBackend},
    services::{accounts, InMemoryStore, RedisStore, Store},
    views::Views,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::load().context("Failed to load configuration")?;

    let store: Arc<dyn Store> = match config.storage.backend {
        StorageBackend::Redis => {
            let client = redis::Client::open(config.storage.redis_url.as_str())
                .context("Invalid Redis URL")?;
            tracing::info!("Using Redis store at {}", config.storage.redis_url);
            Arc::new(RedisStore::with_prefix(
                Arc::new(client),
                config.storage.redis_prefix.as_str(),
            ))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Arc::new(InMemoryStore::new())
        }
    };

    if let Some(admin) = &config.admin {
        accounts::ensure_admin(store.as_ref(), admin, config.security.bcrypt_cost)
            .await
            .context("Failed to create the administrator account")?;
    }

    let state = AppState {
        store,
        views: Views::new(&config.templates.dir),
        security: config.security,
    };
    let router = app(state, &config.session, &config.http);

    let address = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("Server running on {}", address);

    axum::serve(listener, router.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
