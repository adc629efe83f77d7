//! HTTP route handlers for the read server.
//!
//! Handlers are kept thin: lookups go through the catalogue and reads
//! through the prebuilt query templates.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::debug;

use super::error::{ApiError, ApiResult};
use super::models::{ModelList, ModelSummary};
use super::AppState;

// =============================================================================
// Catalogue Handlers
// =============================================================================

/// GET `/api/models` - Every model that can be read by identifier.
pub async fn api_models(State(state): State<Arc<AppState>>) -> Json<ModelList> {
    let models = state
        .manager
        .routes()
        .map(|(path, model)| ModelSummary::new(path, model))
        .collect();

    Json(ModelList {
        project: state.project.clone(),
        models,
    })
}

/// GET `/api/{model}/schema` - JSON Schema of a model's read document.
pub async fn api_schema(
    State(state): State<Arc<AppState>>,
    Path(model): Path<String>,
) -> ApiResult<Json<Value>> {
    if !state.templates.contains_key(&model) {
        return Err(ApiError::UnknownModel(model));
    }
    Ok(Json(state.manager.response_schema(model.as_str())?))
}

// =============================================================================
// Read Handlers
// =============================================================================

/// GET `/api/{model}/{uid}` - One node with its relations collapsed in.
pub async fn api_read(
    State(state): State<Arc<AppState>>,
    Path((model, uid)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let template = state
        .templates
        .get(&model)
        .ok_or_else(|| ApiError::UnknownModel(model.clone()))?;

    debug!(model = %model, uid = %uid, "reading node");
    match template.fetch(&uid).await? {
        Some(document) => Ok(Json(document)),
        None => Err(ApiError::RecordNotFound { model, uid }),
    }
}
