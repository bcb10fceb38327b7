//! Axum route handlers for profile extraction.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::profile::{Candidate, Vacancy};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    Cv,
    Vacancy,
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub text: String,
    pub kind: ProfileKind,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", content = "profile", rename_all = "snake_case")]
pub enum ParseResponse {
    Cv(Candidate),
    Vacancy(Vacancy),
}

/// POST /parse
///
/// Extracts a structured candidate or vacancy profile from free text.
pub async fn handle_parse(
    State(state): State<AppState>,
    Json(request): Json<ParseRequest>,
) -> Result<Json<ParseResponse>, AppError> {
    let response = match request.kind {
        ProfileKind::Cv => ParseResponse::Cv(state.extractor.extract_candidate(&request.text).await?),
        ProfileKind::Vacancy => {
            ParseResponse::Vacancy(state.extractor.extract_vacancy(&request.text).await?)
        }
    };
    Ok(Json(response))
}
