use std::path::PathBuf;

use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::resume::ResumeDocument;
use crate::persistence::transfer::{
    default_filename, export_json, export_to_file, import_from_file, import_json,
};
use crate::state::AppState;

#[derive(Serialize)]
pub struct AutosaveStatus {
    pub has_autosave: bool,
    #[serde(with = "chrono::serde::ts_milliseconds_option")]
    pub last_save_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct ClearAutosaveRequest {
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Deserialize, Default)]
pub struct ExportFileRequest {
    pub dir: Option<PathBuf>,
    pub filename: Option<String>,
}

#[derive(Serialize)]
pub struct ExportFileResponse {
    pub path: PathBuf,
}

#[derive(Deserialize)]
pub struct ImportFileRequest {
    pub path: PathBuf,
}

async fn autosave_status(state: &AppState) -> AutosaveStatus {
    AutosaveStatus {
        has_autosave: state.saver.has_autosave().await,
        last_save_time: state.saver.last_save_time(),
    }
}

/// GET /api/v1/autosave
pub async fn handle_autosave_status(State(state): State<AppState>) -> Json<AutosaveStatus> {
    Json(autosave_status(&state).await)
}

/// POST /api/v1/autosave/flush
pub async fn handle_flush(State(state): State<AppState>) -> Json<AutosaveStatus> {
    state.saver.flush().await;
    Json(autosave_status(&state).await)
}

/// POST /api/v1/autosave/clear
pub async fn handle_clear_autosave(
    State(state): State<AppState>,
    Json(req): Json<ClearAutosaveRequest>,
) -> Result<Json<AutosaveStatus>, AppError> {
    if req.confirmed {
        state.saver.clear().await?;
    }
    Ok(Json(autosave_status(&state).await))
}

/// GET /api/v1/export
/// Downloads the document as a pretty-printed JSON attachment.
pub async fn handle_export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let doc = state.store.get();
    let body = export_json(&doc)?;
    let filename: String = default_filename(&doc)
        .chars()
        .map(|c| if c.is_ascii() && c != '"' { c } else { '_' })
        .collect();
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}

/// POST /api/v1/export/file
pub async fn handle_export_file(
    State(state): State<AppState>,
    body: Option<Json<ExportFileRequest>>,
) -> Result<Json<ExportFileResponse>, AppError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let dir = req.dir.unwrap_or_else(|| state.config.export_dir());
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;
    let path = export_to_file(&state.store.get(), &dir, req.filename.as_deref()).await?;
    Ok(Json(ExportFileResponse { path }))
}

/// POST /api/v1/import
/// The body is the raw exported JSON. On failure the document is untouched.
pub async fn handle_import(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ResumeDocument>, AppError> {
    let doc = import_json(&body)?;
    state.store.replace(doc);
    Ok(Json(state.store.get()))
}

/// POST /api/v1/import/file
pub async fn handle_import_file(
    State(state): State<AppState>,
    Json(req): Json<ImportFileRequest>,
) -> Result<Json<ResumeDocument>, AppError> {
    let doc = import_from_file(&req.path).await?;
    state.store.replace(doc);
    Ok(Json(state.store.get()))
}
