use axum::Json;

use neonflow_types::api::{GenerateRequest, GenerateResponse};

use crate::error::ApiError;

pub async fn generate_text(
    Json(req): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Some(topic) = req.topic.as_deref().filter(|topic| !topic.is_empty()) else {
        return Err(ApiError::InvalidInput("Topic is required".into()));
    };

    Ok(Json(GenerateResponse {
        generated_text: draft_text(topic, req.language.as_deref(), req.content_type.as_deref()),
    }))
}

/// Placeholder draft template. A real model call can replace this without
/// touching the route contract.
fn draft_text(topic: &str, language: Option<&str>, content_type: Option<&str>) -> String {
    let topic = match topic.trim() {
        "" => "your topic",
        trimmed => trimmed,
    };
    let language = language.unwrap_or("English");
    let content_type = content_type.unwrap_or("Informational");

    format!(
        "{content_type} ({language}): {topic}\n\n\
         1) Lead with a strong hook.\n\
         2) Share one clear insight.\n\
         3) End with a short call-to-action."
    )
}
