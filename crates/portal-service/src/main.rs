use portal_service::config::Config;
use portal_service::handlers::auth_handler::AppState;
use portal_service::observability;
use portal_service::routes;
use portal_service::services::mailer::Mailer;
use portal_service::store::{PostgresStore, Store};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "portal_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Portal API");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");

    // Initialize database connection pool
    info!("Connecting to store...");
    let db_pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .map_err(|e| {
            error!("Failed to connect to store: {}", e);
            e
        })?;

    sqlx::migrate!("./migrations").run(&db_pool).await?;

    info!("Store connection established");

    // Initialize metrics recorder
    let metrics_handle = observability::init_metrics_recorder()?;

    let store: Arc<dyn Store> = Arc::new(PostgresStore::new(db_pool));
    let mailer = Mailer::new(&config);

    if config.sendgrid_api_key.is_none() {
        info!("No SENDGRID_API_KEY configured; verification emails are disabled");
    }

    // Parse bind address before moving config
    let bind_address = config.bind_address.clone();

    // Create application state
    let state = Arc::new(AppState {
        store,
        config,
        mailer,
    });

    // Build application routes
    let app = routes::build_routes(state, metrics_handle);

    // Parse bind address
    let addr: SocketAddr = bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    info!("Portal API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
