//! osumod server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware};
use osumod_api::{
    endpoints::{api_router, auth_router},
    middleware::{AppState, auth_middleware},
};
use osumod_common::Config;
use osumod_core::{
    BeatmapProvider, MaintenanceService, OsuApiClient, OsuAuthService, QueueService,
    RequestService, UserService,
};
use osumod_db::repositories::{QueueRepository, RequestRepository, UserRepository};
use osumod_scheduler::{MaintenanceExecutor, SchedulerConfig, run_scheduler};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "osumod=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting osumod server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = osumod_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    osumod_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);

    // Repositories
    let user_repo = UserRepository::new(db.clone());
    let queue_repo = QueueRepository::new(db.clone());
    let request_repo = RequestRepository::new(db);

    // osu! API client, shared by every service that resolves beatmaps
    // or user profiles.
    let provider: Arc<dyn BeatmapProvider> = Arc::new(OsuApiClient::new(
        config.osu.api_base.clone(),
        config.osu.api_key.clone(),
    ));

    // Services
    let user_service = UserService::new(user_repo.clone(), provider.clone());
    let queue_service = QueueService::new(queue_repo.clone(), user_repo.clone());
    let request_service = RequestService::new(
        request_repo.clone(),
        queue_repo.clone(),
        user_repo,
        provider,
    );
    let auth_service = OsuAuthService::new(&config.osu, &config.server.url);
    let maintenance_service =
        MaintenanceService::new(queue_repo, request_repo, config.maintenance.clone());

    let state = AppState {
        user_service,
        queue_service,
        request_service,
        auth_service,
    };

    // Background maintenance sweep
    run_scheduler(
        SchedulerConfig {
            sweep_interval: Duration::from_secs(config.maintenance.sweep_interval_secs),
        },
        Arc::new(MaintenanceExecutor::new(maintenance_service)),
    )
    .await;

    let app = Router::new()
        .nest("/api", api_router())
        .nest("/auth", auth_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
