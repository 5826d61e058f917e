use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trackday_backend::{
    build_app,
    config::Config,
    db::connection::{create_pool, run_migrations, DbPool},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trackday_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load()?;
    tracing::info!(
        bind_addr = %config.bind_addr,
        database_max_connections = config.database_max_connections,
        lap_radius_m = config.lap_detection.radius_m,
        lap_min_points = config.lap_detection.min_points,
        lap_window_points = config.lap_detection.window_points,
        lap_scan_points = config.lap_detection.scan_points,
        "Loaded configuration from environment/.env"
    );

    // Initialize database
    let pool: DbPool = create_pool(&config).await?;
    run_migrations(&pool).await?;

    let addr = config.bind_addr;
    let app = build_app(AppState::from_pool(pool, config));

    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
