use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::polish::orchestrator::{PolishState, PolishTarget};
use crate::polish::transform::PolishMode;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StartPolishRequest {
    pub mode: PolishMode,
    pub target: PolishTarget,
}

#[derive(Serialize)]
pub struct PolishStatus {
    pub available: bool,
    #[serde(flatten)]
    pub state: PolishState,
}

#[derive(Serialize)]
pub struct AcceptResponse {
    pub target: PolishTarget,
    pub state: PolishState,
}

fn status(state: &AppState) -> PolishStatus {
    PolishStatus {
        available: state.polish.is_available(),
        state: state.polish.state(),
    }
}

/// GET /api/v1/polish
/// Polled by the compare view while a result streams in.
pub async fn handle_polish_state(State(state): State<AppState>) -> Json<PolishStatus> {
    Json(status(&state))
}

/// POST /api/v1/polish
pub async fn handle_start_polish(
    State(state): State<AppState>,
    Json(req): Json<StartPolishRequest>,
) -> Result<Json<PolishStatus>, AppError> {
    state.polish.start(req.mode, req.target)?;
    Ok(Json(status(&state)))
}

/// POST /api/v1/polish/accept
pub async fn handle_accept_polish(
    State(state): State<AppState>,
) -> Result<Json<AcceptResponse>, AppError> {
    let target = state.polish.accept()?;
    Ok(Json(AcceptResponse {
        target,
        state: state.polish.state(),
    }))
}

/// POST /api/v1/polish/reject
/// Also used to close the compare view mid-stream.
pub async fn handle_reject_polish(State(state): State<AppState>) -> Json<PolishStatus> {
    state.polish.reject();
    Json(status(&state))
}
