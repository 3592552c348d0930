use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status along with the open document and polish availability.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let metadata = state.store.metadata();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "resume-editor",
        "document_id": metadata.id,
        "polish_available": state.polish.is_available()
    }))
}
