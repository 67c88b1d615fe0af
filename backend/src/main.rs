use std::sync::Arc;

use axum::http::Method;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use signcast_backend::{
    config::Config,
    db::connection::create_pool,
    repositories::{
        MemoryLoginAttemptStore, MemorySessionStore, MemoryUserStore, PgLoginAttemptStore,
        PgSessionStore, PgUserStore,
    },
    routes,
    state::AppState,
};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "signcast_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        listen_addr = %config.listen_addr,
        database_url = %config.database_url,
        jwt_secret = %mask_secret(&config.jwt_secret),
        device_stale_seconds = config.device_stale_seconds,
        session_stale_hours = config.session_stale_hours,
        login_arbitration_enabled = config.login_arbitration_enabled,
        "Loaded configuration from environment/.env"
    );

    // Wire the stores and long-lived services
    let state = if config.uses_memory_store() {
        tracing::warn!("running on in-memory stores; sessions will not survive a restart");
        AppState::new(
            config.clone(),
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemorySessionStore::new()),
            Arc::new(MemoryLoginAttemptStore::new()),
        )
    } else {
        let pool = create_pool(&config.database_url).await?;
        sqlx::migrate!("./migrations").run(&*pool).await?;
        AppState::new(
            config.clone(),
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgSessionStore::new(pool.clone())),
            Arc::new(PgLoginAttemptStore::new(pool)),
        )
    };

    // Compose app with shared layers (CORS/Trace)
    let app = routes::api_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods([
                        Method::GET,
                        Method::POST,
                        Method::PUT,
                        Method::DELETE,
                        Method::OPTIONS,
                    ])
                    .allow_headers(Any)
                    .max_age(std::time::Duration::from_secs(24 * 60 * 60)),
            ),
    );

    // Start server
    tracing::info!("Server listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
