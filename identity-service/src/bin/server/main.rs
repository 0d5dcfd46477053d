use std::path::PathBuf;
use std::sync::Arc;

use auth::TokenIssuer;
use identity_service::config::Config;
use identity_service::domain::account::service::IdentityService;
use identity_service::inbound::http::router::create_router;
use identity_service::outbound::media::LocalMediaStore;
use identity_service::outbound::repositories::PostgresAccountRepository;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "identity_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        service = "identity-service",
        version = env!("CARGO_PKG_VERSION"),
        "Service starting"
    );

    let config = Config::load()?;

    tracing::info!(
        http_port = config.server.http_port,
        media_root = %config.media.root_dir,
        access_expiry_minutes = config.jwt.access_expiry_minutes,
        refresh_expiry_days = config.jwt.refresh_expiry_days,
        "Configuration loaded"
    );

    let pg_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await?;
    tracing::info!(
        max_connections = 5,
        database = "postgresql",
        "Database connection pool created"
    );

    sqlx::migrate!("./migrations").run(&pg_pool).await?;
    tracing::info!(database = "postgresql", "Database migrations completed");

    let token_issuer = Arc::new(TokenIssuer::new(config.jwt.token_config()));
    let repository = Arc::new(PostgresAccountRepository::new(pg_pool));
    let media_store = Arc::new(LocalMediaStore::new(
        &config.media.root_dir,
        &config.media.base_url,
    ));

    let identity_service = Arc::new(IdentityService::new(
        repository,
        media_store,
        Arc::clone(&token_issuer),
    ));

    let http_address = format!("0.0.0.0:{}", config.server.http_port);
    let http_listener = tokio::net::TcpListener::bind(&http_address).await?;
    tracing::info!(
        address = %http_address,
        port = config.server.http_port,
        protocol = "http",
        "Http server listening"
    );

    let application = create_router(
        identity_service,
        token_issuer,
        PathBuf::from(&config.media.temp_dir),
    );

    axum::serve(http_listener, application).await?;

    Ok(())
}
