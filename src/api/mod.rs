//! HTTP surface for the task API.

mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::model::OwnerId;
use crate::store::TaskStore;

/// Shared state for API handlers. Every task route is scoped to the
/// configured owner identity.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<TaskStore>,
    pub owner: OwnerId,
}

/// Build the application router.
///
/// The filter routes are registered as static paths so they never collide
/// with the `{id}` capture.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route("/api/tasks/filters/today", get(handlers::filter_today))
        .route("/api/tasks/filters/overdue", get(handlers::filter_overdue))
        .route("/api/tasks/filters/upcoming", get(handlers::filter_upcoming))
        .route(
            "/api/tasks/{id}",
            get(handlers::get_task)
                .put(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .with_state(state)
}

/// Bind the configured address and serve until the process exits.
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;
    tracing::info!("task API listening on http://{local_addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
