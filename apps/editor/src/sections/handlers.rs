use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::items::Item;
use crate::models::resume::{Section, SectionType};
use crate::sections::editor::{CommitOutcome, DeleteOutcome};
use crate::sections::staging::StagedItem;
use crate::sections::validation::{validate_item, ValidationWarning};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ReorderRequest {
    pub from: usize,
    pub to: usize,
}

/// Initial field values for a newly staged item.
#[derive(Deserialize, Default)]
pub struct AddItemRequest {
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Deserialize)]
pub struct UpdateFieldRequest {
    pub field: String,
    pub value: Value,
}

#[derive(Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Serialize)]
pub struct StagedResponse {
    pub staged: StagedItem,
    pub warnings: Vec<ValidationWarning>,
}

impl From<StagedItem> for StagedResponse {
    fn from(staged: StagedItem) -> Self {
        let warnings = validate_item(&staged.item);
        Self { staged, warnings }
    }
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub outcome: DeleteOutcome,
}

/// GET /api/v1/sections
pub async fn handle_list_sections(State(state): State<AppState>) -> Json<Vec<Section>> {
    Json(state.store.sections())
}

/// POST /api/v1/sections/reorder
pub async fn handle_reorder_sections(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> Json<Vec<Section>> {
    state.editor.reorder_sections(req.from, req.to);
    Json(state.store.sections())
}

/// POST /api/v1/sections/:section_type/visibility
pub async fn handle_toggle_visibility(
    State(state): State<AppState>,
    Path(kind): Path<SectionType>,
) -> Json<Vec<Section>> {
    state.editor.toggle_section_visibility(kind);
    Json(state.store.sections())
}

/// POST /api/v1/sections/:section_type/items
/// Stages a new item; nothing reaches the document until commit.
pub async fn handle_add_item(
    State(state): State<AppState>,
    Path(kind): Path<SectionType>,
    body: Option<Json<AddItemRequest>>,
) -> Result<Json<StagedResponse>, AppError> {
    let req = body.map(|Json(req)| req).unwrap_or_default();
    let mut item = Item::blank(kind);
    for (field, value) in req.fields {
        item.set_field(&field, value)?;
    }
    let staged = state.editor.add_item(kind, move || item)?;
    Ok(Json(staged.into()))
}

/// POST /api/v1/sections/:section_type/items/:item_id/edit
pub async fn handle_edit_item(
    State(state): State<AppState>,
    Path((kind, item_id)): Path<(SectionType, String)>,
) -> Result<Json<StagedResponse>, AppError> {
    let staged = state.editor.edit_item(kind, &item_id)?;
    Ok(Json(staged.into()))
}

/// DELETE /api/v1/sections/:section_type/items/:item_id?confirmed=true
pub async fn handle_delete_item(
    State(state): State<AppState>,
    Path((kind, item_id)): Path<(SectionType, String)>,
    Query(query): Query<ConfirmQuery>,
) -> Json<DeleteResponse> {
    Json(DeleteResponse {
        outcome: state.editor.delete_item(kind, &item_id, query.confirmed),
    })
}

/// GET /api/v1/staging
pub async fn handle_list_staged(State(state): State<AppState>) -> Json<Vec<StagedItem>> {
    Json(state.editor.staged())
}

/// PATCH /api/v1/staging/:staged_id
pub async fn handle_update_field(
    State(state): State<AppState>,
    Path(staged_id): Path<String>,
    Json(req): Json<UpdateFieldRequest>,
) -> Result<Json<StagedResponse>, AppError> {
    let staged = state
        .editor
        .update_field(&staged_id, &req.field, req.value)?;
    Ok(Json(staged.into()))
}

/// POST /api/v1/staging/:staged_id/commit
pub async fn handle_commit_item(
    State(state): State<AppState>,
    Path(staged_id): Path<String>,
) -> Result<Json<CommitOutcome>, AppError> {
    Ok(Json(state.editor.commit_item(&staged_id)?))
}

/// DELETE /api/v1/staging/:staged_id
pub async fn handle_cancel_item(
    State(state): State<AppState>,
    Path(staged_id): Path<String>,
) -> Result<Json<Vec<StagedItem>>, AppError> {
    if !state.editor.cancel_item(&staged_id) {
        return Err(AppError::NotFound(format!("No staged item with id '{staged_id}'")));
    }
    Ok(Json(state.editor.staged()))
}
