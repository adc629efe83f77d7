//! API response models for the read server.

use serde::Serialize;

use pros_core::AppModel;

/// One readable model in `/api/models`.
#[derive(Debug, Serialize)]
pub struct ModelSummary {
    /// URL path segment, the lower-cased type name.
    pub path: String,
    pub app_name: String,
    pub model_name: String,
    /// Plural display name from model metadata, if declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name_plural: Option<String>,
    /// Name of the derived response schema.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<String>,
    pub subclasses: Vec<String>,
}

impl ModelSummary {
    pub fn new(path: String, model: &AppModel) -> Self {
        Self {
            path,
            app_name: model.app_name.clone(),
            model_name: model.model_name.clone(),
            display_name_plural: model
                .meta
                .get("display_name_plural")
                .and_then(|v| v.as_str())
                .map(str::to_string),
            response_schema: model.response_schema.clone(),
            subclasses: model.subclasses.iter().cloned().collect(),
        }
    }
}

/// Response for `/api/models`.
#[derive(Debug, Serialize)]
pub struct ModelList {
    pub project: String,
    pub models: Vec<ModelSummary>,
}
