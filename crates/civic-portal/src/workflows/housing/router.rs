use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use super::config::EligibilityConfig;
use super::fees::{compute_fee, FeeBreakdown, HousingProgramType};
use super::scoring::{score, HouseholdProfile, ScoreBreakdown};

#[derive(Debug, Deserialize)]
pub(crate) struct ScoreRequest {
    pub(crate) profile: HouseholdProfile,
    pub(crate) program_type: HousingProgramType,
    pub(crate) requested_units: u32,
}

/// Score and fee in one response so reviewers see the whole assessment.
#[derive(Debug, Serialize)]
pub(crate) struct ScoreResponse {
    pub(crate) program_type: HousingProgramType,
    pub(crate) score: ScoreBreakdown,
    pub(crate) fee: FeeBreakdown,
}

/// Read-only helper consumed by reviewers during the approval decision. It
/// never drives a state transition.
pub fn housing_router(config: Arc<EligibilityConfig>) -> Router {
    Router::new()
        .route("/api/v1/housing/score", post(score_handler))
        .with_state(config)
}

pub(crate) async fn score_handler(
    State(config): State<Arc<EligibilityConfig>>,
    Json(request): Json<ScoreRequest>,
) -> impl IntoResponse {
    let breakdown = score(&request.profile, &config);
    let fee = compute_fee(request.program_type, request.requested_units, &config);
    (
        StatusCode::OK,
        Json(ScoreResponse {
            program_type: request.program_type,
            score: breakdown,
            fee,
        }),
    )
}
