use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::info;
use workdesk::logging::init_tracing;
use workdesk::metrics::{init_metrics, metrics_app};
use workdesk::router::init_router;
use workdesk::state::AppState;
use workdesk_db::{PgPermissionSource, init_db_pool, run_migrations};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let pool = init_db_pool().await?;
    run_migrations(&pool).await?;

    let state = AppState::from_env(Arc::new(PgPermissionSource::new(pool)));
    state.spawn_session_sweeper();
    let mut app = init_router(state);

    if let Some(handle) = init_metrics() {
        app = app.merge(metrics_app(handle));
        info!("Prometheus metrics available at /metrics");
    }

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(3000);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    info!(port, "Server running on http://localhost:{port}");
    info!("Swagger UI available at http://localhost:{port}/swagger-ui");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
