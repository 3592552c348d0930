mod config;
mod document;
mod errors;
mod history;
mod ids;
mod llm_client;
mod models;
mod persistence;
mod polish;
mod routes;
mod sections;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::document::store::DocumentStore;
use crate::history::versions::VersionHistory;
use crate::llm_client::LlmClient;
use crate::models::resume::ResumeDocument;
use crate::persistence::autosave::{spawn_store_autosave, AutoSaver};
use crate::persistence::kv::{FileKvStore, KvStore};
use crate::polish::service::PolishService;
use crate::polish::transform::TextTransform;
use crate::routes::build_router;
use crate::sections::editor::SectionEditor;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume editor v{}", env!("CARGO_PKG_VERSION"));

    // Durable local storage
    let kv: Arc<dyn KvStore> = Arc::new(FileKvStore::open(&config.data_dir).await?);
    info!("Data directory: {}", config.data_dir.display());

    // Restore the last autosaved document, or start fresh
    let saver = AutoSaver::spawn(kv.clone(), config.autosave_debounce);
    let doc = match saver.load().await {
        Some(doc) => {
            info!("Restored autosaved document '{}'", doc.metadata.title);
            doc
        }
        None => ResumeDocument::default(),
    };
    let store = DocumentStore::new(doc);
    let autosave_bridge = spawn_store_autosave(&store, saver.clone());

    let history = VersionHistory::load(kv.clone()).await;
    let editor = SectionEditor::new(store.clone());

    // Text provider for polishing (optional)
    let transform: Option<Arc<dyn TextTransform>> = match &config.anthropic_api_key {
        Some(key) => {
            let llm = LlmClient::new(key.clone())?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Some(Arc::new(llm) as Arc<dyn TextTransform>)
        }
        None => {
            warn!("ANTHROPIC_API_KEY is not set, polishing is disabled");
            None
        }
    };
    let polish = PolishService::new(store.clone(), editor.clone(), transform);

    let state = AppState {
        store: store.clone(),
        editor,
        history,
        saver: saver.clone(),
        polish,
        config: config.clone(),
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // local web UI only
    );

    let addr: SocketAddr = format!("127.0.0.1:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Push the last edit out before exiting
    autosave_bridge.abort();
    saver.save(store.get());
    saver.flush().await;
    info!("Shut down cleanly");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
