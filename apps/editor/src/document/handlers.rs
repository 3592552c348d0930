use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::completeness::{compute_completeness, CompletenessReport};
use crate::document::heal::decode_document;
use crate::errors::AppError;
use crate::models::resume::{Metadata, PersonalInfo, ResumeDocument, Settings, SocialLink};
use crate::sections::validation::{validate_personal_info, ValidationWarning};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct NewDocumentRequest {
    pub title: Option<String>,
}

#[derive(Deserialize)]
pub struct ConfirmRequest {
    #[serde(default)]
    pub confirmed: bool,
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub reset: bool,
    pub document: ResumeDocument,
}

#[derive(Deserialize)]
pub struct TitleRequest {
    pub title: String,
}

#[derive(Deserialize)]
pub struct SocialLinkRequest {
    pub platform: String,
    pub url: String,
}

#[derive(Serialize)]
pub struct PersonalInfoResponse {
    pub personal_info: PersonalInfo,
    pub warnings: Vec<ValidationWarning>,
}

impl PersonalInfoResponse {
    fn from_info(personal_info: PersonalInfo) -> Self {
        let warnings = validate_personal_info(&personal_info);
        Self {
            personal_info,
            warnings,
        }
    }
}

/// GET /api/v1/document
pub async fn handle_get_document(State(state): State<AppState>) -> Json<ResumeDocument> {
    Json(state.store.get())
}

/// PUT /api/v1/document
/// Replaces the content; malformed parts are healed, identity is kept.
pub async fn handle_put_document(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<ResumeDocument>, AppError> {
    if !body.is_object() {
        return Err(AppError::Validation(
            "Document must be a JSON object".to_string(),
        ));
    }
    state.store.set(decode_document(body));
    Ok(Json(state.store.get()))
}

/// POST /api/v1/document/new
pub async fn handle_new_document(
    State(state): State<AppState>,
    Json(req): Json<NewDocumentRequest>,
) -> Json<ResumeDocument> {
    state.store.new_document(req.title.as_deref());
    Json(state.store.get())
}

/// POST /api/v1/document/reset
pub async fn handle_reset_document(
    State(state): State<AppState>,
    Json(req): Json<ConfirmRequest>,
) -> Json<ResetResponse> {
    let reset = state.store.reset(req.confirmed);
    Json(ResetResponse {
        reset,
        document: state.store.get(),
    })
}

/// GET /api/v1/document/metadata
pub async fn handle_get_metadata(State(state): State<AppState>) -> Json<Metadata> {
    Json(state.store.metadata())
}

/// PUT /api/v1/document/title
pub async fn handle_set_title(
    State(state): State<AppState>,
    Json(req): Json<TitleRequest>,
) -> Json<Metadata> {
    state.store.set_title(&req.title);
    Json(state.store.metadata())
}

/// GET /api/v1/document/personal-info
pub async fn handle_get_personal_info(
    State(state): State<AppState>,
) -> Json<PersonalInfoResponse> {
    Json(PersonalInfoResponse::from_info(state.store.personal_info()))
}

/// PUT /api/v1/document/personal-info
pub async fn handle_put_personal_info(
    State(state): State<AppState>,
    Json(info): Json<PersonalInfo>,
) -> Json<PersonalInfoResponse> {
    state.store.set_personal_info(info);
    Json(PersonalInfoResponse::from_info(state.store.personal_info()))
}

/// POST /api/v1/document/personal-info/social-links
pub async fn handle_add_social_link(
    State(state): State<AppState>,
    Json(req): Json<SocialLinkRequest>,
) -> Result<Json<SocialLink>, AppError> {
    if req.platform.trim().is_empty() {
        return Err(AppError::Validation("platform is required".to_string()));
    }
    Ok(Json(state.store.add_social_link(&req.platform, &req.url)))
}

/// DELETE /api/v1/document/personal-info/social-links/:id
pub async fn handle_remove_social_link(
    State(state): State<AppState>,
    Path(link_id): Path<String>,
) -> Result<Json<PersonalInfo>, AppError> {
    if !state.store.remove_social_link(&link_id) {
        return Err(AppError::NotFound(format!("Social link {link_id}")));
    }
    Ok(Json(state.store.personal_info()))
}

/// GET /api/v1/document/settings
pub async fn handle_get_settings(State(state): State<AppState>) -> Json<Settings> {
    Json(state.store.settings())
}

/// PUT /api/v1/document/settings
pub async fn handle_put_settings(
    State(state): State<AppState>,
    Json(settings): Json<Settings>,
) -> Json<Settings> {
    state.store.set_settings(settings);
    Json(state.store.settings())
}

/// GET /api/v1/document/completeness
pub async fn handle_completeness(State(state): State<AppState>) -> Json<CompletenessReport> {
    Json(compute_completeness(&state.store.get()))
}
