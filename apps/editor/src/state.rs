use crate::config::Config;
use crate::document::store::DocumentStore;
use crate::history::versions::VersionHistory;
use crate::persistence::autosave::AutoSaver;
use crate::polish::service::PolishService;
use crate::sections::editor::SectionEditor;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
    pub editor: SectionEditor,
    pub history: VersionHistory,
    /// Debounced writer fed by the store subscription; handlers use it for
    /// autosave queries and explicit flushes.
    pub saver: AutoSaver,
    pub polish: PolishService,
    pub config: Config,
}
