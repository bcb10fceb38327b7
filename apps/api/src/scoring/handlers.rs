//! Axum route handlers for the Scoring API.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::profile::{Candidate, Vacancy};
use crate::scoring::ScoringResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub candidate: Candidate,
    pub vacancy: Vacancy,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub cv_text: String,
    pub vacancy_text: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub candidate: Candidate,
    pub vacancy: Vacancy,
    pub scoring: ScoringResult,
}

/// POST /score
///
/// Scores an already structured candidate against a structured vacancy.
pub async fn handle_score(
    State(state): State<AppState>,
    Json(request): Json<ScoreRequest>,
) -> Result<Json<ScoringResult>, AppError> {
    request.candidate.validate()?;
    request.vacancy.validate()?;

    let result = state
        .scorer
        .score(&request.candidate, &request.vacancy)
        .await;

    Ok(Json(result))
}

/// POST /analyze
///
/// Extracts both profiles from free text, then scores them.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    if request.cv_text.trim().is_empty() || request.vacancy_text.trim().is_empty() {
        return Err(AppError::Validation(
            "cv_text and vacancy_text cannot be empty".to_string(),
        ));
    }

    let (candidate, vacancy) = tokio::try_join!(
        state.extractor.extract_candidate(&request.cv_text),
        state.extractor.extract_vacancy(&request.vacancy_text),
    )?;

    let scoring = state.scorer.score(&candidate, &vacancy).await;

    Ok(Json(AnalyzeResponse {
        candidate,
        vacancy,
        scoring,
    }))
}
