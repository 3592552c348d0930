//! Runs polish requests against the live document.
//!
//! The service reads the target field, starts the orchestrator, and drives
//! the text provider on a background task. Accept writes through the same
//! mutation paths as a manual edit: the store for committed fields, the
//! editing buffer for staged ones.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::document::store::DocumentStore;
use crate::models::items::{editable_fields, FieldError};
use crate::models::resume::{PersonalInfo, SectionType};
use crate::polish::orchestrator::{PolishError, PolishOrchestrator, PolishState, PolishTarget};
use crate::polish::transform::{PolishMode, PolishRequest, TextTransform, TransformError};
use crate::sections::editor::SectionEditor;
use crate::sections::mutator::set_item_field;

const CHUNK_BUFFER: usize = 32;

/// Editable fields whose values are numbers, flags or fixed choices.
const NON_TEXT_FIELDS: &[&str] = &["level", "current", "proficiency"];

type SharedOrchestrator = Arc<Mutex<PolishOrchestrator>>;

fn lock(orchestrator: &SharedOrchestrator) -> MutexGuard<'_, PolishOrchestrator> {
    orchestrator.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Clone)]
pub struct PolishService {
    orchestrator: SharedOrchestrator,
    store: DocumentStore,
    editor: SectionEditor,
    transform: Option<Arc<dyn TextTransform>>,
}

impl PolishService {
    pub fn new(
        store: DocumentStore,
        editor: SectionEditor,
        transform: Option<Arc<dyn TextTransform>>,
    ) -> Self {
        Self {
            orchestrator: Arc::new(Mutex::new(PolishOrchestrator::new())),
            store,
            editor,
            transform,
        }
    }

    pub fn is_available(&self) -> bool {
        self.transform.is_some()
    }

    pub fn state(&self) -> PolishState {
        lock(&self.orchestrator).state().clone()
    }

    /// Starts polishing `target` and returns the request generation.
    pub fn start(&self, mode: PolishMode, target: PolishTarget) -> Result<u64, PolishError> {
        let transform = self.transform.clone().ok_or(PolishError::Unavailable)?;
        let content = self.read_target(&target)?;
        let request = PolishRequest {
            mode,
            content: content.clone(),
            context: Some(target.label()),
        };

        let generation = lock(&self.orchestrator).start(mode, target, content)?;
        info!(
            "Polish request {generation} started ({}, {})",
            mode.as_str(),
            request.context.as_deref().unwrap_or_default()
        );
        drive_polish(self.orchestrator.clone(), transform, request, generation);
        Ok(generation)
    }

    /// Writes the polished text into the originating field and returns to idle.
    /// If the write fails the compare view stays open.
    pub fn accept(&self) -> Result<PolishTarget, PolishError> {
        let mut orchestrator = lock(&self.orchestrator);
        let (target, text) = orchestrator.candidate()?;
        self.write_target(&target, &text)?;
        orchestrator.close();
        info!("Accepted polish result for {}", target.label());
        Ok(target)
    }

    pub fn reject(&self) -> bool {
        let rejected = lock(&self.orchestrator).reject();
        if rejected {
            info!("Rejected polish result");
        }
        rejected
    }

    fn read_target(&self, target: &PolishTarget) -> Result<String, PolishError> {
        match target {
            PolishTarget::Summary => Ok(self.store.personal_info().summary.unwrap_or_default()),
            PolishTarget::Item {
                section_type,
                item_id,
                field,
            } => {
                let doc = self.store.get();
                let item = doc
                    .find_item(*section_type, item_id)
                    .ok_or_else(|| PolishError::TargetMissing(target.label()))?;
                ensure_text_field(item.section_type(), field)?;
                field_text(item.field(field), field)
            }
            PolishTarget::Staged { staged_id, field } => {
                let staged = self
                    .editor
                    .staged_item(staged_id)
                    .ok_or_else(|| PolishError::TargetMissing(target.label()))?;
                ensure_text_field(staged.section_type, field)?;
                field_text(staged.item.field(field), field)
            }
        }
    }

    fn write_target(&self, target: &PolishTarget, text: &str) -> Result<(), PolishError> {
        match target {
            PolishTarget::Summary => {
                let summary = text.to_string();
                self.store.update_personal_info(|prev| PersonalInfo {
                    summary: Some(summary),
                    ..prev.clone()
                });
                Ok(())
            }
            PolishTarget::Item {
                section_type,
                item_id,
                field,
            } => {
                let current = self
                    .store
                    .get()
                    .find_item(*section_type, item_id)
                    .ok_or_else(|| PolishError::TargetMissing(target.label()))?
                    .field(field);
                let value = text_value(current.as_ref(), text);
                self.store.try_update(|prev| {
                    let mut next = prev.clone();
                    next.sections =
                        set_item_field(&prev.sections, *section_type, item_id, field, value)?;
                    Ok::<_, PolishError>(next)
                })
            }
            PolishTarget::Staged { staged_id, field } => {
                let current = self.editor.staged_field(staged_id, field);
                self.editor
                    .set_staged_field(staged_id, field, text_value(current.as_ref(), text))?;
                Ok(())
            }
        }
    }
}

/// Feeds the provider's chunks into the orchestrator under `generation`.
pub fn drive_polish(
    orchestrator: Arc<Mutex<PolishOrchestrator>>,
    transform: Arc<dyn TextTransform>,
    request: PolishRequest,
    generation: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (tx, mut rx) = mpsc::channel(CHUNK_BUFFER);
        let producer = tokio::spawn(async move { transform.transform(request, tx).await });

        while let Some(chunk) = rx.recv().await {
            if !lock(&orchestrator).append_chunk(generation, &chunk) {
                debug!("Dropping stale polish chunk for request {generation}");
            }
        }

        let outcome = match producer.await {
            Ok(outcome) => outcome,
            Err(e) => Err(TransformError::Provider(e.to_string())),
        };
        let mut orchestrator = lock(&orchestrator);
        match outcome {
            Ok(()) => {
                if orchestrator.finish(generation) {
                    info!("Polish request {generation} finished");
                }
            }
            Err(e) => {
                warn!("Polish request {generation} failed: {e}");
                orchestrator.fail(generation, &e.to_string());
            }
        }
    })
}

/// Only free-text fields the editor lets the user change can be polished.
fn ensure_text_field(kind: SectionType, field: &str) -> Result<(), PolishError> {
    if field == "id" {
        return Err(FieldError::ImmutableId.into());
    }
    if !editable_fields(kind).contains(&field) {
        return Err(FieldError::UnknownField {
            kind: kind.as_str(),
            field: field.to_string(),
        }
        .into());
    }
    if NON_TEXT_FIELDS.contains(&field) {
        return Err(PolishError::NotText(field.to_string()));
    }
    Ok(())
}

/// Text view of a field: strings as-is, string lists one per line, unset as empty.
fn field_text(value: Option<Value>, field: &str) -> Result<String, PolishError> {
    match value {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Array(values)) => values
            .into_iter()
            .map(|v| match v {
                Value::String(s) => Ok(s),
                _ => Err(PolishError::NotText(field.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(|lines| lines.join("\n")),
        Some(_) => Err(PolishError::NotText(field.to_string())),
    }
}

/// Inverse of [`field_text`]: list fields get one entry per non-empty line.
fn text_value(current: Option<&Value>, text: &str) -> Value {
    match current {
        Some(Value::Array(_)) => Value::Array(
            text.lines()
                .map(|line| line.trim().trim_start_matches("- ").trim())
                .filter(|line| !line.is_empty())
                .map(|line| Value::String(line.to_string()))
                .collect(),
        ),
        _ => Value::String(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    use crate::models::resume::ResumeDocument;

    /// Emits fixed chunks, optionally failing at the end.
    struct Scripted {
        chunks: Vec<&'static str>,
        error: Option<&'static str>,
        delay: Duration,
    }

    impl Scripted {
        fn ok(chunks: Vec<&'static str>) -> Arc<dyn TextTransform> {
            Arc::new(Self {
                chunks,
                error: None,
                delay: Duration::ZERO,
            })
        }
    }

    #[async_trait]
    impl TextTransform for Scripted {
        async fn transform(
            &self,
            _request: PolishRequest,
            chunks: mpsc::Sender<String>,
        ) -> Result<(), TransformError> {
            for chunk in &self.chunks {
                tokio::time::sleep(self.delay).await;
                if chunks.send(chunk.to_string()).await.is_err() {
                    break;
                }
            }
            match self.error {
                Some(message) => Err(TransformError::Provider(message.to_string())),
                None => Ok(()),
            }
        }
    }

    fn service(transform: Arc<dyn TextTransform>) -> (DocumentStore, SectionEditor, PolishService) {
        let store = DocumentStore::new(ResumeDocument::default());
        store.update_personal_info(|p| PersonalInfo {
            summary: Some("I write code.".to_string()),
            ..p.clone()
        });
        let editor = SectionEditor::new(store.clone());
        let polish = PolishService::new(store.clone(), editor.clone(), Some(transform));
        (store, editor, polish)
    }

    async fn wait_until_finished(polish: &PolishService) {
        for _ in 0..100 {
            if !polish.state().is_polishing {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("polish never finished");
    }

    #[tokio::test]
    async fn test_accept_writes_concatenated_chunks() {
        let (store, _editor, polish) =
            service(Scripted::ok(vec!["I build ", "reliable ", "systems."]));
        polish.start(PolishMode::Polish, PolishTarget::Summary).unwrap();
        wait_until_finished(&polish).await;

        assert_eq!(polish.state().original_content, "I write code.");
        polish.accept().unwrap();
        assert_eq!(
            store.personal_info().summary.as_deref(),
            Some("I build reliable systems.")
        );
        assert!(!polish.state().show_compare);
    }

    #[tokio::test]
    async fn test_reject_leaves_field_untouched() {
        let (store, _editor, polish) = service(Scripted::ok(vec!["something else"]));
        let before = store.get();
        polish.start(PolishMode::Expand, PolishTarget::Summary).unwrap();
        wait_until_finished(&polish).await;
        assert!(polish.reject());
        assert_eq!(store.get(), before);
    }

    #[tokio::test]
    async fn test_failure_is_reported_inline() {
        let (store, _editor, polish) = service(Arc::new(Scripted {
            chunks: vec!["half"],
            error: Some("rate limited"),
            delay: Duration::ZERO,
        }));
        polish.start(PolishMode::Polish, PolishTarget::Summary).unwrap();
        wait_until_finished(&polish).await;

        let state = polish.state();
        assert_eq!(state.polished_content, "half\n\n❌ Error: Text provider failed: rate limited");
        assert_eq!(state.original_content, "I write code.");
        assert_eq!(store.personal_info().summary.as_deref(), Some("I write code."));
    }

    #[tokio::test]
    async fn test_abandoned_stream_cannot_touch_new_request() {
        let slow: Arc<dyn TextTransform> = Arc::new(Scripted {
            chunks: vec!["stale ", "stale "],
            error: None,
            delay: Duration::from_millis(20),
        });
        let (_store, _editor, polish) = service(slow);
        let first = polish.start(PolishMode::Polish, PolishTarget::Summary).unwrap();
        assert!(polish.reject());

        let second = polish.start(PolishMode::Simplify, PolishTarget::Summary).unwrap();
        assert!(second > first);
        wait_until_finished(&polish).await;
        assert_eq!(polish.state().polished_content, "stale stale ");
        assert_eq!(polish.state().generation, second);
    }

    #[tokio::test]
    async fn test_item_and_staged_targets() {
        let (store, editor, polish) = service(Scripted::ok(vec!["- Led the team\n- Shipped v2"]));
        let staged = editor.add_blank(SectionType::Experience).unwrap();
        let item_id = staged.id().to_string();
        editor
            .update_field(&item_id, "achievements", json!(["did things"]))
            .unwrap();

        let staged_target = PolishTarget::Staged {
            staged_id: item_id.clone(),
            field: "achievements".to_string(),
        };
        polish.start(PolishMode::Format, staged_target).unwrap();
        wait_until_finished(&polish).await;
        assert_eq!(polish.state().original_content, "did things");
        polish.accept().unwrap();
        assert_eq!(
            editor.staged_item(&item_id).unwrap().item.field("achievements"),
            Some(json!(["Led the team", "Shipped v2"]))
        );
        assert!(store.get().find_item(SectionType::Experience, &item_id).is_none());

        editor.commit_item(&item_id).unwrap();
        let item_target = PolishTarget::Item {
            section_type: SectionType::Experience,
            item_id: item_id.clone(),
            field: "description".to_string(),
        };
        polish.start(PolishMode::Polish, item_target).unwrap();
        wait_until_finished(&polish).await;
        polish.accept().unwrap();
        assert_eq!(
            store
                .get()
                .find_item(SectionType::Experience, &item_id)
                .unwrap()
                .field("description"),
            Some(json!("- Led the team\n- Shipped v2"))
        );
    }

    #[tokio::test]
    async fn test_missing_target_and_unavailable_provider() {
        let (_store, _editor, polish) = service(Scripted::ok(vec![]));
        let missing = PolishTarget::Item {
            section_type: SectionType::Skills,
            item_id: "nope".to_string(),
            field: "name".to_string(),
        };
        assert!(matches!(
            polish.start(PolishMode::Polish, missing),
            Err(PolishError::TargetMissing(_))
        ));
        assert!(!polish.state().show_compare);

        let store = DocumentStore::new(ResumeDocument::default());
        let offline = PolishService::new(store.clone(), SectionEditor::new(store), None);
        assert!(!offline.is_available());
        assert!(matches!(
            offline.start(PolishMode::Polish, PolishTarget::Summary),
            Err(PolishError::Unavailable)
        ));
    }

    #[tokio::test]
    async fn test_start_refuses_fields_that_are_not_editable_text() {
        let (_store, editor, polish) = service(Scripted::ok(vec!["rewritten"]));
        let staged = editor.add_blank(SectionType::Skills).unwrap();
        editor.commit_item(staged.id()).unwrap();

        let target = |field: &str| PolishTarget::Item {
            section_type: SectionType::Skills,
            item_id: staged.id().to_string(),
            field: field.to_string(),
        };
        assert!(matches!(
            polish.start(PolishMode::Polish, target("foo")),
            Err(PolishError::Field(FieldError::UnknownField { .. }))
        ));
        assert!(matches!(
            polish.start(PolishMode::Polish, target("id")),
            Err(PolishError::Field(FieldError::ImmutableId))
        ));
        assert!(matches!(
            polish.start(PolishMode::Polish, target("level")),
            Err(PolishError::NotText(_))
        ));

        let staged_target = PolishTarget::Staged {
            staged_id: editor.add_blank(SectionType::Languages).unwrap().id().to_string(),
            field: "proficiency".to_string(),
        };
        assert!(matches!(
            polish.start(PolishMode::Polish, staged_target),
            Err(PolishError::NotText(_))
        ));

        let state = polish.state();
        assert!(!state.is_polishing);
        assert!(!state.show_compare);
    }
}
