use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::api::{error::ApiError, AppState};
use crate::optimizer::{self, CbcSolver, OptimizationOutcome, SolverStatus};
use crate::payload::OptimizationRequest;

/// Successful optimization envelope.
#[derive(Debug, Serialize)]
pub struct OptimizationResponse {
    pub status: SolverStatus,
    pub result: OptimizationOutcome,
}

/// POST /optimize - run one scheduling optimization
///
/// The whole normalize/build/solve/extract pipeline is CPU-bound, so it
/// runs on the blocking pool; the time budget is enforced inside the
/// solver itself.
pub async fn optimize(
    State(state): State<AppState>,
    payload: Result<Json<OptimizationRequest>, JsonRejection>,
) -> Result<Json<OptimizationResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::BadPayload(rejection.body_text()))?;

    let run_id = Uuid::new_v4();
    let time_limit = state.config.solver.time_limit();
    let started = Instant::now();

    let (status, result) = tokio::task::spawn_blocking(move || {
        let solver = CbcSolver::new(time_limit);
        optimizer::run(&request, &solver)
    })
    .await
    .map_err(|join_error| ApiError::Optimization(format!("optimization task failed: {join_error}")))??;

    info!(
        %run_id,
        %status,
        duration_ms = started.elapsed().as_millis() as u64,
        activations = result.activated_measures.len(),
        "optimization finished"
    );

    Ok(Json(OptimizationResponse { status, result }))
}
