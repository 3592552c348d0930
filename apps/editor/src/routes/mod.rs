pub mod health;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::document::handlers as document;
use crate::history::handlers as history;
use crate::persistence::handlers as persistence;
use crate::polish::handlers as polish;
use crate::sections::handlers as sections;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Document
        .route(
            "/api/v1/document",
            get(document::handle_get_document).put(document::handle_put_document),
        )
        .route("/api/v1/document/new", post(document::handle_new_document))
        .route(
            "/api/v1/document/reset",
            post(document::handle_reset_document),
        )
        .route(
            "/api/v1/document/metadata",
            get(document::handle_get_metadata),
        )
        .route("/api/v1/document/title", put(document::handle_set_title))
        .route(
            "/api/v1/document/personal-info",
            get(document::handle_get_personal_info).put(document::handle_put_personal_info),
        )
        .route(
            "/api/v1/document/personal-info/social-links",
            post(document::handle_add_social_link),
        )
        .route(
            "/api/v1/document/personal-info/social-links/:id",
            delete(document::handle_remove_social_link),
        )
        .route(
            "/api/v1/document/settings",
            get(document::handle_get_settings).put(document::handle_put_settings),
        )
        .route(
            "/api/v1/document/completeness",
            get(document::handle_completeness),
        )
        // Sections and staged items
        .route("/api/v1/sections", get(sections::handle_list_sections))
        .route(
            "/api/v1/sections/reorder",
            post(sections::handle_reorder_sections),
        )
        .route(
            "/api/v1/sections/:section_type/visibility",
            post(sections::handle_toggle_visibility),
        )
        .route(
            "/api/v1/sections/:section_type/items",
            post(sections::handle_add_item),
        )
        .route(
            "/api/v1/sections/:section_type/items/:item_id",
            delete(sections::handle_delete_item),
        )
        .route(
            "/api/v1/sections/:section_type/items/:item_id/edit",
            post(sections::handle_edit_item),
        )
        .route("/api/v1/staging", get(sections::handle_list_staged))
        .route(
            "/api/v1/staging/:staged_id",
            patch(sections::handle_update_field).delete(sections::handle_cancel_item),
        )
        .route(
            "/api/v1/staging/:staged_id/commit",
            post(sections::handle_commit_item),
        )
        // Version history
        .route(
            "/api/v1/versions",
            get(history::handle_list_versions).post(history::handle_capture_version),
        )
        .route(
            "/api/v1/versions/clear",
            post(history::handle_clear_versions),
        )
        .route("/api/v1/versions/:id", get(history::handle_get_version))
        .route(
            "/api/v1/versions/:id/restore",
            post(history::handle_restore_version),
        )
        // Persistence
        .route(
            "/api/v1/autosave",
            get(persistence::handle_autosave_status),
        )
        .route("/api/v1/autosave/flush", post(persistence::handle_flush))
        .route(
            "/api/v1/autosave/clear",
            post(persistence::handle_clear_autosave),
        )
        .route("/api/v1/export", get(persistence::handle_export))
        .route(
            "/api/v1/export/file",
            post(persistence::handle_export_file),
        )
        .route("/api/v1/import", post(persistence::handle_import))
        .route(
            "/api/v1/import/file",
            post(persistence::handle_import_file),
        )
        // Polish
        .route(
            "/api/v1/polish",
            get(polish::handle_polish_state).post(polish::handle_start_polish),
        )
        .route(
            "/api/v1/polish/accept",
            post(polish::handle_accept_polish),
        )
        .route(
            "/api/v1/polish/reject",
            post(polish::handle_reject_polish),
        )
        .with_state(state)
}
