use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::resume::ResumeDocument;
use crate::models::version::{VersionSnapshot, VersionSummary};
use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct CaptureRequest {
    pub description: Option<String>,
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub cleared: bool,
}

#[derive(Deserialize)]
pub struct ClearRequest {
    #[serde(default)]
    pub confirmed: bool,
}

/// GET /api/v1/versions
pub async fn handle_list_versions(State(state): State<AppState>) -> Json<Vec<VersionSummary>> {
    Json(state.history.summaries())
}

/// GET /api/v1/versions/:id
pub async fn handle_get_version(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
) -> Result<Json<VersionSnapshot>, AppError> {
    state
        .history
        .get(&version_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Version {version_id}")))
}

/// POST /api/v1/versions
pub async fn handle_capture_version(
    State(state): State<AppState>,
    body: Option<Json<CaptureRequest>>,
) -> Json<VersionSummary> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let snapshot = state
        .history
        .capture(&state.store, req.description.as_deref())
        .await;
    Json(VersionSummary::from(&snapshot))
}

/// POST /api/v1/versions/:id/restore
/// Unknown ids leave the document as it is.
pub async fn handle_restore_version(
    State(state): State<AppState>,
    Path(version_id): Path<String>,
) -> Json<ResumeDocument> {
    state.history.restore(&state.store, &version_id);
    Json(state.store.get())
}

/// POST /api/v1/versions/clear
pub async fn handle_clear_versions(
    State(state): State<AppState>,
    Json(req): Json<ClearRequest>,
) -> Json<ClearResponse> {
    if req.confirmed {
        state.history.clear().await;
    }
    Json(ClearResponse {
        cleared: req.confirmed,
    })
}
