//! Pure transformations of the section list. Each takes the current list and
//! returns the next one; the caller commits it through the document store.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::models::items::{FieldError, Item};
use crate::models::resume::{Section, SectionType};

/// Whether a staged item is new (appended on commit) or a copy of an existing
/// item (replaced in place on commit).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CommitMode {
    Create,
    Edit,
}

/// Re-stamps `order` to list position (0-based, contiguous).
pub fn restamp_order(sections: &mut [Section]) {
    for (i, section) in sections.iter_mut().enumerate() {
        section.order = i;
    }
}

/// Moves the section at `from` to `to`, shifting the others, then re-indexes.
/// An out-of-range `from` is a no-op; `to` is clamped to the last position.
pub fn reorder_sections(sections: &[Section], from: usize, to: usize) -> Vec<Section> {
    let mut next = sections.to_vec();
    if from == to {
        return next;
    }
    if from >= next.len() {
        warn!(
            "Ignoring reorder from index {from}: only {} sections",
            next.len()
        );
        return next;
    }
    let to = to.min(next.len() - 1);
    let moved = next.remove(from);
    next.insert(to, moved);
    restamp_order(&mut next);
    next
}

/// Flips visibility of the section of `kind`; other sections are untouched.
pub fn toggle_section_visibility(sections: &[Section], kind: SectionType) -> Vec<Section> {
    sections
        .iter()
        .map(|s| {
            let mut s = s.clone();
            if s.section_type == kind {
                s.visible = !s.visible;
            }
            s
        })
        .collect()
}

/// Writes a staged item into its section, creating the section if needed.
///
/// Create mode appends. Edit mode replaces the item with the same id in place
/// and never changes the item count; if that item no longer exists the list
/// is returned unchanged.
pub fn upsert_item(sections: &[Section], item: Item, mode: CommitMode) -> Vec<Section> {
    let kind = item.section_type();
    let mut next = sections.to_vec();

    let Some(section) = next.iter_mut().find(|s| s.section_type == kind) else {
        let order = next.len();
        let mut section = Section::empty(kind, order);
        section.data.push(item);
        next.push(section);
        return next;
    };

    match mode {
        CommitMode::Create => section.data.push(item),
        CommitMode::Edit => match section.data.iter_mut().find(|i| i.id() == item.id()) {
            Some(existing) => *existing = item,
            None => warn!(
                "Edited {} item {} no longer exists, discarding edit",
                kind.as_str(),
                item.id()
            ),
        },
    }
    next
}

/// Removes the item with `item_id` from the section of `kind`. Missing
/// section or item leaves the list unchanged.
pub fn remove_item(sections: &[Section], kind: SectionType, item_id: &str) -> Vec<Section> {
    sections
        .iter()
        .map(|s| {
            let mut s = s.clone();
            if s.section_type == kind {
                s.data.retain(|i| i.id() != item_id);
            }
            s
        })
        .collect()
}

/// Sets one field of a committed item. A missing item leaves the list unchanged.
pub fn set_item_field(
    sections: &[Section],
    kind: SectionType,
    item_id: &str,
    field: &str,
    value: Value,
) -> Result<Vec<Section>, FieldError> {
    let mut next = sections.to_vec();
    if let Some(item) = next
        .iter_mut()
        .filter(|s| s.section_type == kind)
        .flat_map(|s| s.data.iter_mut())
        .find(|i| i.id() == item_id)
    {
        item.set_field(field, value)?;
    }
    Ok(next)
}
