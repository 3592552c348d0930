//! Debounced autosave of the document.
//!
//! A single worker task owns every write, so writes never interleave. Saves
//! requested within the debounce window replace the pending value and restart
//! the timer; saves that arrive while a write is in flight wait in the queue
//! and go out in the next cycle. The value written is always the latest one.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::document::heal::decode_document;
use crate::document::store::DocumentStore;
use crate::models::now_millis;
use crate::models::resume::ResumeDocument;
use crate::persistence::kv::{KvStore, StorageError};

pub const DOCUMENT_KEY: &str = "resume-data";

enum Command {
    Save(Box<ResumeDocument>),
    Flush(oneshot::Sender<()>),
}

#[derive(Clone)]
pub struct AutoSaver {
    tx: mpsc::UnboundedSender<Command>,
    kv: Arc<dyn KvStore>,
    last_save: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl AutoSaver {
    /// Starts the autosave worker on the current runtime.
    pub fn spawn(kv: Arc<dyn KvStore>, debounce: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let last_save = Arc::new(Mutex::new(None));
        tokio::spawn(run_worker(rx, kv.clone(), debounce, last_save.clone()));
        Self { tx, kv, last_save }
    }

    /// Requests a debounced save of `doc`.
    pub fn save(&self, doc: ResumeDocument) {
        if self.tx.send(Command::Save(Box::new(doc))).is_err() {
            warn!("Autosave worker has stopped, dropping save request");
        }
    }

    /// Writes any pending save immediately and waits for it.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    pub fn last_save_time(&self) -> Option<DateTime<Utc>> {
        *self.last_save.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reads the stored document. Missing or malformed data yields `None`.
    pub async fn load(&self) -> Option<ResumeDocument> {
        load_document(self.kv.as_ref()).await
    }

    pub async fn has_autosave(&self) -> bool {
        matches!(self.kv.get(DOCUMENT_KEY).await, Ok(Some(_)))
    }

    /// Removes the stored document.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.kv.remove(DOCUMENT_KEY).await?;
        info!("Cleared autosaved document");
        Ok(())
    }
}

async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<Command>,
    kv: Arc<dyn KvStore>,
    debounce: Duration,
    last_save: Arc<Mutex<Option<DateTime<Utc>>>>,
) {
    let mut pending: Option<ResumeDocument> = None;

    loop {
        let command = if pending.is_some() {
            match tokio::time::timeout(debounce, rx.recv()).await {
                Ok(command) => command,
                Err(_) => {
                    if let Some(doc) = pending.take() {
                        write_document(kv.as_ref(), doc, &last_save).await;
                    }
                    continue;
                }
            }
        } else {
            rx.recv().await
        };

        match command {
            Some(Command::Save(doc)) => pending = Some(*doc),
            Some(Command::Flush(ack)) => {
                if let Some(doc) = pending.take() {
                    write_document(kv.as_ref(), doc, &last_save).await;
                }
                let _ = ack.send(());
            }
            None => {
                if let Some(doc) = pending.take() {
                    write_document(kv.as_ref(), doc, &last_save).await;
                }
                debug!("Autosave worker stopping");
                break;
            }
        }
    }
}

async fn write_document(
    kv: &dyn KvStore,
    mut doc: ResumeDocument,
    last_save: &Mutex<Option<DateTime<Utc>>>,
) {
    doc.metadata.last_modified = now_millis();
    let result = match serde_json::to_string(&doc) {
        Ok(json) => kv.put(DOCUMENT_KEY, &json).await,
        Err(e) => Err(e.into()),
    };
    match result {
        Ok(()) => {
            *last_save.lock().unwrap_or_else(|e| e.into_inner()) = Some(doc.metadata.last_modified);
            info!("Autosaved document {}", doc.metadata.id);
        }
        Err(e) => error!("Autosave failed: {e}"),
    }
}

/// Reads and heals the stored document. Never fails: a missing key or
/// unparseable content is logged and reported as `None`.
pub async fn load_document(kv: &dyn KvStore) -> Option<ResumeDocument> {
    let text = match kv.get(DOCUMENT_KEY).await {
        Ok(Some(text)) => text,
        Ok(None) => {
            info!("No saved document found");
            return None;
        }
        Err(e) => {
            error!("Failed to read saved document: {e}");
            return None;
        }
    };
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => Some(decode_document(value)),
        Err(e) => {
            warn!("Saved document is not valid JSON: {e}");
            None
        }
    }
}

/// Feeds every document change into the autosaver.
pub fn spawn_store_autosave(store: &DocumentStore, saver: AutoSaver) -> JoinHandle<()> {
    let mut rx = store.subscribe();
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let doc = rx.borrow_and_update().clone();
            saver.save(doc);
        }
    })
}
