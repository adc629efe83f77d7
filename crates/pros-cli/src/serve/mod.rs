//! Read-only HTTP server over the model catalogue.
//!
//! One route family per readable model, keyed by the model's lower-cased
//! name:
//!
//! - `GET /api/models` - catalogue summary
//! - `GET /api/{model}/schema` - response schema as JSON Schema
//! - `GET /api/{model}/{uid}` - one node read by identifier
//!
//! # Module Structure
//!
//! - `handlers` - HTTP route handlers
//! - `models` - API response types (DTOs)
//! - `error` - error to response mapping

mod error;
mod handlers;
mod models;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use pros_core::{Config, GraphDriver, ModelManager, QueryError, QueryTemplate};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state for the server.
pub struct AppState {
    pub project: String,
    pub manager: Arc<ModelManager>,
    /// Read template per route segment.
    pub templates: HashMap<String, QueryTemplate>,
}

impl AppState {
    /// Build one template per readable model, all sharing `driver`.
    pub fn new(
        project: String,
        manager: Arc<ModelManager>,
        driver: Arc<dyn GraphDriver>,
    ) -> Result<Self, QueryError> {
        let mut templates = HashMap::new();
        for (path, model) in manager.routes() {
            templates.insert(path, QueryTemplate::build(&manager, model.id, driver.clone())?);
        }
        Ok(Self {
            project,
            manager,
            templates,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/models", get(handlers::api_models))
        .route("/api/{model}/schema", get(handlers::api_schema))
        .route("/api/{model}/{uid}", get(handlers::api_read))
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}

// =============================================================================
// Server Entry Point
// =============================================================================

/// Start the read server on the configured address.
pub async fn start_server(
    config: &Config,
    manager: ModelManager,
    driver: Arc<dyn GraphDriver>,
) -> color_eyre::Result<()> {
    let state = AppState::new(config.project.name.clone(), Arc::new(manager), driver)?;
    let routes = state.templates.len();
    let app = router(Arc::new(state));

    let address = config.server.address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!(address = %address, routes, "serving read endpoints");

    println!("Serving {} models at http://{}/api/models", routes, address);
    println!("Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;
    Ok(())
}
