//! Section/item mutation commands. Combines the editing buffer with the
//! document store: staged changes only reach the document on commit.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::document::store::DocumentStore;
use crate::models::items::Item;
use crate::models::resume::SectionType;
use crate::sections::mutator::{
    remove_item, reorder_sections, toggle_section_visibility, upsert_item, CommitMode,
};
use crate::sections::staging::{StagedItem, StagingArea, StagingError};
use crate::sections::validation::{validate_item, ValidationWarning};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitOutcome {
    pub item: Item,
    pub mode: CommitMode,
    pub warnings: Vec<ValidationWarning>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    Declined,
}

#[derive(Clone)]
pub struct SectionEditor {
    store: DocumentStore,
    staging: Arc<Mutex<StagingArea>>,
}

impl SectionEditor {
    pub fn new(store: DocumentStore) -> Self {
        Self {
            store,
            staging: Arc::new(Mutex::new(StagingArea::new())),
        }
    }

    fn staging(&self) -> MutexGuard<'_, StagingArea> {
        self.staging.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn reorder_sections(&self, from: usize, to: usize) {
        if from == to || from >= self.store.get().sections.len() {
            return;
        }
        self.store
            .update_sections(|sections| reorder_sections(sections, from, to));
    }

    pub fn toggle_section_visibility(&self, kind: SectionType) {
        if self.store.get().section(kind).is_none() {
            return;
        }
        self.store
            .update_sections(|sections| toggle_section_visibility(sections, kind));
    }

    pub fn staged(&self) -> Vec<StagedItem> {
        self.staging().list().to_vec()
    }

    pub fn staged_item(&self, staged_id: &str) -> Option<StagedItem> {
        self.staging().get(staged_id).cloned()
    }

    pub fn add_item<F>(&self, kind: SectionType, factory: F) -> Result<StagedItem, StagingError>
    where
        F: FnOnce() -> Item,
    {
        self.staging().add_item(kind, factory).cloned()
    }

    /// Stages a blank item of `kind`.
    pub fn add_blank(&self, kind: SectionType) -> Result<StagedItem, StagingError> {
        self.add_item(kind, || Item::blank(kind))
    }

    pub fn edit_item(&self, kind: SectionType, item_id: &str) -> Result<StagedItem, StagingError> {
        let doc = self.store.get();
        self.staging().edit_item(&doc, kind, item_id).cloned()
    }

    pub fn update_field(
        &self,
        staged_id: &str,
        field: &str,
        value: Value,
    ) -> Result<StagedItem, StagingError> {
        self.staging()
            .update_field(staged_id, field, value)
            .cloned()
    }

    /// Writes the staged item into the document and drops it from the buffer.
    pub fn commit_item(&self, staged_id: &str) -> Result<CommitOutcome, StagingError> {
        let staged = self.staging().take(staged_id)?;
        let warnings = validate_item(&staged.item);
        for w in &warnings {
            warn!(
                "{} item {}: {} ({})",
                staged.section_type.as_str(),
                staged.id(),
                w.message,
                w.field
            );
        }

        let item = staged.item.clone();
        let mode = staged.mode;
        self.store
            .update_sections(move |sections| upsert_item(sections, staged.item, mode));
        info!(
            "Committed {} item '{}' ({}, {:?})",
            item.section_type().as_str(),
            item.display_title(),
            item.id(),
            mode
        );

        Ok(CommitOutcome {
            item,
            mode,
            warnings,
        })
    }

    pub fn cancel_item(&self, staged_id: &str) -> bool {
        self.staging().cancel(staged_id)
    }

    /// Deletes a committed item. Destructive: nothing happens unless `confirmed`.
    pub fn delete_item(&self, kind: SectionType, item_id: &str, confirmed: bool) -> DeleteOutcome {
        if !confirmed {
            return DeleteOutcome::Declined;
        }
        let title = match self.store.get().find_item(kind, item_id) {
            Some(item) => item.display_title(),
            None => return DeleteOutcome::NotFound,
        };
        self.store
            .update_sections(|sections| remove_item(sections, kind, item_id));
        info!("Deleted {} item '{title}' ({item_id})", kind.as_str());
        DeleteOutcome::Deleted
    }

    /// Writes one field of a staged item; used by polish accept.
    pub(crate) fn set_staged_field(
        &self,
        staged_id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StagingError> {
        self.update_field(staged_id, field, value).map(|_| ())
    }

    pub(crate) fn staged_field(&self, staged_id: &str, field: &str) -> Option<Value> {
        self.staging().get(staged_id)?.item.field(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::ResumeDocument;
    use crate::persistence::transfer::{export_json, import_json};
    use serde_json::json;
    use std::collections::HashSet;

    fn editor() -> (DocumentStore, SectionEditor) {
        let store = DocumentStore::new(ResumeDocument::default());
        let editor = SectionEditor::new(store.clone());
        (store, editor)
    }

    #[test]
    fn test_staged_item_does_not_touch_document_until_commit() {
        let (store, editor) = editor();
        let before = store.get();
        let staged = editor.add_blank(SectionType::Skills).unwrap();
        editor
            .update_field(staged.id(), "name", json!("Rust"))
            .unwrap();
        assert_eq!(store.get(), before);

        let outcome = editor.commit_item(staged.id()).unwrap();
        assert_eq!(outcome.mode, CommitMode::Create);
        let doc = store.get();
        let skills = doc.section(SectionType::Skills).unwrap();
        assert_eq!(skills.data.len(), 1);
        assert_eq!(skills.data[0].field("name"), Some(json!("Rust")));
        assert!(editor.staged().is_empty());
    }

    #[test]
    fn test_commit_creates_missing_section() {
        let (store, editor) = editor();
        store.set_sections(Vec::new());
        let staged = editor.add_blank(SectionType::Languages).unwrap();
        editor.commit_item(staged.id()).unwrap();

        let sections = store.sections();
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].section_type, SectionType::Languages);
        assert_eq!(sections[0].order, 0);
        assert!(sections[0].visible);
    }

    #[test]
    fn test_edit_commit_keeps_id_and_count() {
        let (store, editor) = editor();
        let first = editor.add_blank(SectionType::Experience).unwrap();
        editor.commit_item(first.id()).unwrap();
        let second = editor.add_blank(SectionType::Experience).unwrap();
        editor.commit_item(second.id()).unwrap();

        let staged = editor
            .edit_item(SectionType::Experience, first.id())
            .unwrap();
        editor
            .update_field(staged.id(), "company", json!("Acme"))
            .unwrap();
        let outcome = editor.commit_item(staged.id()).unwrap();
        assert_eq!(outcome.mode, CommitMode::Edit);

        let doc = store.get();
        let data = &doc.section(SectionType::Experience).unwrap().data;
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].id(), first.id());
        assert_eq!(data[0].field("company"), Some(json!("Acme")));
        assert_eq!(data[1].id(), second.id());
    }

    #[test]
    fn test_commit_returns_advisory_warnings() {
        let (_store, editor) = editor();
        let staged = editor.add_blank(SectionType::Education).unwrap();
        let outcome = editor.commit_item(staged.id()).unwrap();
        assert!(!outcome.warnings.is_empty());
    }

    #[test]
    fn test_commit_unknown_staged_id_fails() {
        let (_store, editor) = editor();
        assert!(matches!(
            editor.commit_item("ghost"),
            Err(StagingError::NotStaged(_))
        ));
    }

    #[test]
    fn test_cancel_leaves_document() {
        let (store, editor) = editor();
        let before = store.get();
        let staged = editor.add_blank(SectionType::Projects).unwrap();
        assert!(editor.cancel_item(staged.id()));
        assert_eq!(store.get(), before);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let (store, editor) = editor();
        let staged = editor.add_blank(SectionType::Skills).unwrap();
        editor.commit_item(staged.id()).unwrap();

        assert_eq!(
            editor.delete_item(SectionType::Skills, staged.id(), false),
            DeleteOutcome::Declined
        );
        assert_eq!(store.get().section(SectionType::Skills).unwrap().data.len(), 1);

        assert_eq!(
            editor.delete_item(SectionType::Skills, staged.id(), true),
            DeleteOutcome::Deleted
        );
        assert!(store.get().section(SectionType::Skills).unwrap().data.is_empty());

        assert_eq!(
            editor.delete_item(SectionType::Skills, staged.id(), true),
            DeleteOutcome::NotFound
        );
    }

    #[test]
    fn test_section_types_stay_unique_across_commits() {
        let (store, editor) = editor();
        store.set_sections(Vec::new());
        for kind in SectionType::ALL.iter().chain(SectionType::ALL.iter()) {
            let staged = editor.add_blank(*kind).unwrap();
            editor.commit_item(staged.id()).unwrap();
        }
        let sections = store.sections();
        let kinds: HashSet<_> = sections.iter().map(|s| s.section_type).collect();
        assert_eq!(kinds.len(), sections.len());
        assert_eq!(sections.len(), 6);
        assert!(sections.iter().all(|s| s.data.len() == 2));
    }

    #[test]
    fn test_out_of_range_skill_level_survives_export_import() {
        let (store, editor) = editor();
        let staged = editor.add_blank(SectionType::Skills).unwrap();
        editor
            .update_field(staged.id(), "name", json!("Rust"))
            .unwrap();
        editor
            .update_field(staged.id(), "level", json!(9))
            .unwrap();
        editor.commit_item(staged.id()).unwrap();

        let doc = store.get();
        let skills = doc.section(SectionType::Skills).unwrap();
        assert_eq!(skills.data[0].field("level"), Some(json!(5)));

        let exported = export_json(&doc).unwrap();
        assert_eq!(import_json(&exported).unwrap(), doc);
    }

    #[test]
    fn test_reorder_out_of_range_leaves_document_untouched() {
        let (store, editor) = editor();
        let before = store.get();
        editor.reorder_sections(42, 0);
        assert_eq!(store.get(), before);
        assert_eq!(store.metadata().version, before.metadata.version);
    }

    #[test]
    fn test_reorder_and_toggle_through_store() {
        let (store, editor) = editor();
        editor.reorder_sections(5, 0);
        editor.toggle_section_visibility(SectionType::Languages);
        let sections = store.sections();
        assert_eq!(sections[0].section_type, SectionType::Languages);
        assert!(!sections[0].visible);
        assert_eq!(
            sections.iter().map(|s| s.order).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4, 5]
        );
    }
}
