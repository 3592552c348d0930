//! Editing buffer for items that are being created or edited but not yet
//! committed. Each entry is tracked by its item id, so several open forms
//! never interfere with one another.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::models::items::{FieldError, Item};
use crate::models::resume::{ResumeDocument, SectionType};
use crate::sections::mutator::CommitMode;

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("No staged item with id '{0}'")]
    NotStaged(String),

    #[error("No {kind} item with id '{id}'")]
    ItemNotFound { kind: &'static str, id: String },

    #[error("Factory produced a {produced} item for the {expected} section")]
    TypeMismatch {
        expected: &'static str,
        produced: &'static str,
    },

    #[error(transparent)]
    Field(#[from] FieldError),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StagedItem {
    pub section_type: SectionType,
    pub mode: CommitMode,
    pub item: Item,
}

impl StagedItem {
    pub fn id(&self) -> &str {
        self.item.id()
    }
}

#[derive(Debug, Default)]
pub struct StagingArea {
    entries: Vec<StagedItem>,
}

impl StagingArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self) -> &[StagedItem] {
        &self.entries
    }

    pub fn get(&self, staged_id: &str) -> Option<&StagedItem> {
        self.entries.iter().find(|e| e.id() == staged_id)
    }

    fn get_mut(&mut self, staged_id: &str) -> Result<&mut StagedItem, StagingError> {
        self.entries
            .iter_mut()
            .find(|e| e.id() == staged_id)
            .ok_or_else(|| StagingError::NotStaged(staged_id.to_string()))
    }

    /// Stages a new item built by `factory`, which must allocate a fresh id.
    pub fn add_item<F>(&mut self, kind: SectionType, factory: F) -> Result<&StagedItem, StagingError>
    where
        F: FnOnce() -> Item,
    {
        let item = factory();
        if item.section_type() != kind {
            return Err(StagingError::TypeMismatch {
                expected: kind.as_str(),
                produced: item.section_type().as_str(),
            });
        }
        self.entries.push(StagedItem {
            section_type: kind,
            mode: CommitMode::Create,
            item,
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Stages a copy of a committed item for editing. Opening an item that is
    /// already staged returns the existing entry unchanged.
    pub fn edit_item(
        &mut self,
        doc: &ResumeDocument,
        kind: SectionType,
        item_id: &str,
    ) -> Result<&StagedItem, StagingError> {
        if let Some(pos) = self.entries.iter().position(|e| e.id() == item_id) {
            return Ok(&self.entries[pos]);
        }
        let item = doc
            .find_item(kind, item_id)
            .cloned()
            .ok_or_else(|| StagingError::ItemNotFound {
                kind: kind.as_str(),
                id: item_id.to_string(),
            })?;
        self.entries.push(StagedItem {
            section_type: kind,
            mode: CommitMode::Edit,
            item,
        });
        Ok(&self.entries[self.entries.len() - 1])
    }

    pub fn update_field(
        &mut self,
        staged_id: &str,
        field: &str,
        value: Value,
    ) -> Result<&StagedItem, StagingError> {
        let entry = self.get_mut(staged_id)?;
        entry.item.set_field(field, value)?;
        Ok(entry)
    }

    /// Removes and returns the staged entry.
    pub fn take(&mut self, staged_id: &str) -> Result<StagedItem, StagingError> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.id() == staged_id)
            .ok_or_else(|| StagingError::NotStaged(staged_id.to_string()))?;
        Ok(self.entries.remove(pos))
    }

    /// Discards a staged entry. Returns `false` if nothing was staged under that id.
    pub fn cancel(&mut self, staged_id: &str) -> bool {
        self.take(staged_id).is_ok()
    }
}
