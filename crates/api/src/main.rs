use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use mimaropa_api::config::ServerConfig;
use mimaropa_api::router::build_app_router;
use mimaropa_api::state::AppState;
use mimaropa_db::DbPool;
use mimaropa_events::{EventBus, NotificationWriter};

const DEFAULT_LOG_FILTER: &str = "mimaropa_api=debug,mimaropa_events=debug,tower_http=debug";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Connect, verify, and migrate. Any failure aborts startup.
async fn prepare_database() -> DbPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = mimaropa_db::create_pool(&url)
        .await
        .expect("could not connect to the database");
    mimaropa_db::health_check(&pool)
        .await
        .expect("database did not answer a health query");
    mimaropa_db::run_migrations(&pool)
        .await
        .expect("database migrations failed");
    tracing::info!("Database ready");
    pool
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    tracing::info!(
        host = %config.host,
        port = config.port,
        uploads_dir = %config.uploads_dir,
        max_upload_bytes = config.max_upload_bytes,
        "Configuration loaded",
    );

    let pool = prepare_database().await;

    tokio::fs::create_dir_all(&config.uploads_dir)
        .await
        .expect("could not create the uploads directory");

    // Notifications: handlers publish, one background task persists.
    let event_bus = Arc::new(EventBus::default());
    let writer = tokio::spawn(NotificationWriter::run(pool.clone(), event_bus.subscribe()));

    let drain_timeout = Duration::from_secs(config.shutdown_timeout_secs);
    let state = AppState::new(pool, config.clone(), Arc::clone(&event_bus));
    let app = build_app_router(state, &config);

    let addr = SocketAddr::new(
        config.host.parse().expect("HOST must be an IP address"),
        config.port,
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("could not bind the listen address");
    tracing::info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // The router and its state are gone; dropping the last bus handle closes
    // the channel, so the writer finishes its backlog and returns.
    drop(event_bus);
    match tokio::time::timeout(drain_timeout, writer).await {
        Ok(_) => tracing::info!("Notification writer drained"),
        Err(_) => tracing::warn!(
            timeout_secs = drain_timeout.as_secs(),
            "Notification writer still busy at shutdown; pending notifications dropped",
        ),
    }
}

/// Resolves on SIGINT or, on unix, SIGTERM.
async fn shutdown_signal() {
    let interrupt = async {
        tokio::signal::ctrl_c()
            .await
            .expect("could not listen for Ctrl-C");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        signal(SignalKind::terminate())
            .expect("could not listen for SIGTERM")
            .recv()
            .await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        () = interrupt => "SIGINT",
        () = terminate => "SIGTERM",
    };
    tracing::info!(signal, "Shutting down");
}
