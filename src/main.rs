use anyhow::{Context, Result};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

use impact_rewards::{
    config::sanitize_for_logging, create_users_router, ActionStore, DatabasePool, ImpactConfig,
    ImpactEngine, MemoryStore, NotificationStore, SocialService, UserStore, UsersApiState,
};

/// The three repository seams, backed by one storage technology
struct Stores {
    users: Arc<dyn UserStore>,
    actions: Arc<dyn ActionStore>,
    notifications: Arc<dyn NotificationStore>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = ImpactConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        eprintln!("Please check IMPACT_* environment variables.");
        e
    })?;

    init_logging(&config)?;

    info!("Starting impact rewards server");

    let stores = open_stores(&config).await?;

    let mut engine = ImpactEngine::new(
        stores.users.clone(),
        stores.actions.clone(),
        stores.notifications.clone(),
    );
    if config.engine.serialize_updates {
        engine = engine.with_serialized_updates();
    }
    info!(
        serialize_updates = engine.serializes_updates(),
        "Impact engine initialized"
    );

    let service = Arc::new(SocialService::new(
        stores.users,
        stores.actions,
        stores.notifications,
        Arc::new(engine),
    ));

    let app = Router::new()
        .nest("/users", create_users_router(UsersApiState { service }))
        .route("/health", get(|| async { "OK" }))
        .layer(TraceLayer::new_for_http());

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    info!("Impact rewards server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &ImpactConfig) -> Result<()> {
    let log_level = match config.logging.level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(if config.logging.log_requests {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}

async fn open_stores(config: &ImpactConfig) -> Result<Stores> {
    if !config.database.postgres_enabled {
        info!("PostgreSQL disabled, using in-memory store");
        let store = Arc::new(MemoryStore::new());
        return Ok(Stores {
            users: store.clone(),
            actions: store.clone(),
            notifications: store,
        });
    }

    let url = &config.database.postgres_url;
    let shown = if config.logging.sanitize_logs {
        sanitize_for_logging(url)
    } else {
        url.clone()
    };
    info!("Connecting to PostgreSQL at {}", shown);

    let db = DatabasePool::new(url, config.database.max_connections)
        .await
        .context("Failed to open PostgreSQL pool")?;
    db.init_schema()
        .await
        .context("Failed to initialize database schema")?;

    Ok(Stores {
        users: db.users(),
        actions: db.actions(),
        notifications: db.notifications(),
    })
}
