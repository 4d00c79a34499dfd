//! Axum route handlers for the analysis API.
//!
//! Provider outages never surface here: the gateway always yields a result,
//! so the only error these handlers return is input validation.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::analysis::models::{AnalysisResult, CandidateInput};
use crate::errors::AppError;
use crate::state::AppState;

const MAX_CANDIDATES: usize = 50;

#[derive(Debug, Deserialize)]
pub struct AnalyzeCvRequest {
    pub cv_text: String,
    #[serde(default)]
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeJdRequest {
    pub job_description: String,
}

#[derive(Debug, Deserialize)]
pub struct RankRequest {
    pub job_description: String,
    pub candidates: Vec<CandidateInput>,
}

/// POST /api/v1/cv-intelligence/analyze
pub async fn handle_analyze_cv(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeCvRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    require_text("cv_text", &request.cv_text)?;

    let analysis = state
        .gateway
        .analyze_cv(&request.cv_text, &request.job_description)
        .await;
    Ok(Json(analysis.result))
}

/// POST /api/v1/cv-intelligence/jd/analyze
pub async fn handle_analyze_jd(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeJdRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    require_text("job_description", &request.job_description)?;

    let analysis = state.gateway.analyze_jd(&request.job_description).await;
    Ok(Json(analysis.result))
}

/// POST /api/v1/cv-intelligence/rank
pub async fn handle_rank_candidates(
    State(state): State<AppState>,
    Json(request): Json<RankRequest>,
) -> Result<Json<AnalysisResult>, AppError> {
    require_text("job_description", &request.job_description)?;
    if request.candidates.is_empty() {
        return Err(AppError::Validation("candidates cannot be empty".to_string()));
    }
    if request.candidates.len() > MAX_CANDIDATES {
        return Err(AppError::Validation(format!(
            "at most {MAX_CANDIDATES} candidates can be ranked at once"
        )));
    }
    for candidate in &request.candidates {
        require_text("candidates[].cv_text", &candidate.cv_text)?;
    }

    let analysis = state
        .gateway
        .rank_candidates(&request.job_description, request.candidates)
        .await;
    Ok(Json(analysis.result))
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}
