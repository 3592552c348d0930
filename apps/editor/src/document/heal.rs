//! Lenient decoding of stored or imported documents.
//!
//! The document is user-authored JSON that may come from an older build or a
//! hand edit. Each sub-field is decoded on its own; whatever cannot be decoded
//! is replaced by its default and logged, so the editor always has a
//! renderable document. Strict rejection only happens for input that is not
//! JSON at all (see `persistence::transfer`).

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use crate::ids::new_id;
use crate::models::items::{editable_fields, Item, MAX_SKILL_LEVEL, MIN_SKILL_LEVEL};
use crate::models::resume::{
    default_sections, Metadata, PersonalInfo, RawSection, ResumeDocument, Section, SectionType,
    Settings,
};

/// Decodes a document value, healing every malformed sub-field.
pub fn decode_document(value: Value) -> ResumeDocument {
    let mut object = match value {
        Value::Object(map) => map,
        other => {
            warn!(
                "Stored document is {} rather than an object, using defaults",
                json_kind(&other)
            );
            return ResumeDocument::default();
        }
    };

    let metadata = decode_field(&mut object, "metadata", || Metadata::fresh(None));
    let personal_info = decode_field(&mut object, "personalInfo", PersonalInfo::default);
    let settings = decode_field(&mut object, "settings", Settings::default).normalized();
    let sections = decode_sections(object.remove("sections"));

    let mut doc = ResumeDocument {
        metadata,
        personal_info,
        sections,
        settings,
    };
    reissue_duplicate_ids(&mut doc);
    doc
}

fn decode_field<T: DeserializeOwned>(
    object: &mut Map<String, Value>,
    key: &str,
    fallback: impl FnOnce() -> T,
) -> T {
    match object.remove(key) {
        None => {
            warn!("Document has no '{key}', using defaults");
            fallback()
        }
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("Document field '{key}' is malformed ({e}), using defaults");
            fallback()
        }),
    }
}

/// Decodes the section list. A non-list becomes the canonical skeleton;
/// sections without a known `type`, repeated section kinds and non-object
/// items are dropped. `order` is re-stamped to list position.
pub fn decode_sections(value: Option<Value>) -> Vec<Section> {
    let entries = match value {
        Some(Value::Array(entries)) => entries,
        other => {
            warn!(
                "Document sections are {} rather than a list, using the default skeleton",
                other.as_ref().map(json_kind).unwrap_or("missing")
            );
            return default_sections();
        }
    };

    let mut seen = HashSet::new();
    let mut sections = Vec::with_capacity(entries.len());

    for entry in entries {
        let raw: RawSection = match serde_json::from_value(entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Dropping unreadable section: {e}");
                continue;
            }
        };
        if !seen.insert(raw.section_type) {
            warn!(
                "Dropping duplicate '{}' section",
                raw.section_type.as_str()
            );
            continue;
        }

        let kind = raw.section_type;
        let data = raw
            .data
            .into_iter()
            .filter_map(|v| decode_item(kind, v))
            .collect();

        let title = if raw.title.trim().is_empty() {
            kind.default_title().to_string()
        } else {
            raw.title
        };

        sections.push(Section {
            section_type: kind,
            title,
            visible: raw.visible,
            order: sections.len(),
            data,
        });
    }

    sections
}

/// Decodes one item record. When the record as a whole does not fit the
/// item shape, each known field is applied on its own and the ones that
/// still do not fit keep their defaults. Only non-objects are dropped.
fn decode_item(kind: SectionType, value: Value) -> Option<Item> {
    let object = match value {
        Value::Object(object) => object,
        other => {
            warn!(
                "Dropping {} item that is {} rather than an object",
                kind.as_str(),
                json_kind(&other)
            );
            return None;
        }
    };

    if let Ok(mut item) = Item::from_value(kind, Value::Object(object.clone())) {
        item.normalize();
        return Some(item);
    }

    let mut item = Item::blank(kind);
    match object.get("id") {
        Some(Value::String(id)) => item.reissue_id(id.clone()),
        _ => item.reissue_id(String::new()),
    }
    for (field, value) in object {
        if field == "id" || !editable_fields(kind).contains(&field.as_str()) {
            continue;
        }
        let value = if field == "level" {
            clamp_level(value)
        } else {
            value
        };
        if let Err(e) = item.set_field(&field, value) {
            warn!("Defaulting {} item {}: {e}", kind.as_str(), item.id());
        }
    }
    Some(item)
}

/// Pulls any numeric level into range before it meets the narrow level type.
fn clamp_level(value: Value) -> Value {
    let level = value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.round() as i64));
    match level {
        Some(level) => Value::from(level.clamp(
            i64::from(MIN_SKILL_LEVEL),
            i64::from(MAX_SKILL_LEVEL),
        )),
        None => value,
    }
}

/// Gives a fresh id to every social link or item whose id is empty or already
/// taken by an earlier entity in the document.
fn reissue_duplicate_ids(doc: &mut ResumeDocument) {
    let mut seen: HashSet<String> = HashSet::new();

    for link in &mut doc.personal_info.social_links {
        if link.id.is_empty() || !seen.insert(link.id.clone()) {
            let id = new_id();
            warn!("Re-issuing social link id '{}' as '{id}'", link.id);
            link.id = id.clone();
            seen.insert(id);
        }
    }

    for section in &mut doc.sections {
        for item in &mut section.data {
            if item.id().is_empty() || !seen.insert(item.id().to_string()) {
                let id = new_id();
                warn!(
                    "Re-issuing {} item id '{}' as '{id}'",
                    section.section_type.as_str(),
                    item.id()
                );
                item.reissue_id(id.clone());
                seen.insert(id);
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::DEFAULT_TITLE;
    use serde_json::json;

    #[test]
    fn test_non_object_becomes_default_document() {
        let doc = decode_document(json!([1, 2, 3]));
        assert_eq!(doc.sections.len(), 6);
        assert_eq!(doc.metadata.title, DEFAULT_TITLE);
    }

    #[test]
    fn test_sections_not_a_list_fall_back_to_skeleton() {
        let doc = decode_document(json!({"sections": "oops"}));
        let kinds: Vec<_> = doc.sections.iter().map(|s| s.section_type).collect();
        assert_eq!(kinds, SectionType::ALL.to_vec());
    }

    #[test]
    fn test_valid_fields_survive_sibling_corruption() {
        let doc = decode_document(json!({
            "personalInfo": {"name": "Ada", "email": "ada@example.com"},
            "settings": 42,
            "sections": []
        }));
        assert_eq!(doc.personal_info.name, "Ada");
        assert_eq!(doc.settings, Settings::default());
        assert!(doc.sections.is_empty());
    }

    #[test]
    fn test_duplicate_and_unknown_sections_dropped_and_reindexed() {
        let doc = decode_document(json!({"sections": [
            {"type": "skills", "title": "Skills", "order": 7, "data": []},
            {"type": "hobbies", "title": "Hobbies", "data": []},
            {"type": "skills", "title": "More skills", "data": []},
            {"type": "education", "order": 3, "data": []}
        ]}));
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].section_type, SectionType::Skills);
        assert_eq!(doc.sections[0].order, 0);
        assert_eq!(doc.sections[1].section_type, SectionType::Education);
        assert_eq!(doc.sections[1].order, 1);
        assert_eq!(doc.sections[1].title, "Education");
    }

    #[test]
    fn test_non_object_items_dropped_and_levels_clamped() {
        let doc = decode_document(json!({"sections": [
            {"type": "skills", "title": "Skills", "data": [
                {"id": "a", "name": "Rust", "level": 12},
                {"id": "b", "name": "Go", "level": "high"},
                "not an item"
            ]}
        ]}));
        let data = &doc.sections[0].data;
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].field("level"), Some(json!(5)));
        assert_eq!(data[1].id(), "b");
        assert_eq!(data[1].field("name"), Some(json!("Go")));
        assert_eq!(data[1].field("level"), Some(json!(3)));
    }

    #[test]
    fn test_level_too_large_for_storage_is_clamped() {
        let doc = decode_document(json!({"sections": [
            {"type": "skills", "data": [
                {"id": "a", "name": "Rust", "level": 300},
                {"id": "b", "name": "Go", "level": -4}
            ]}
        ]}));
        let data = &doc.sections[0].data;
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].field("level"), Some(json!(5)));
        assert_eq!(data[1].field("level"), Some(json!(1)));
    }

    #[test]
    fn test_negative_order_keeps_section() {
        let doc = decode_document(json!({"sections": [
            {"type": "skills", "title": "Skills", "order": -1, "data": [{"id": "a", "name": "Rust"}]}
        ]}));
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].order, 0);
        assert_eq!(doc.sections[0].data.len(), 1);
    }

    #[test]
    fn test_null_title_and_bad_visibility_default() {
        let doc = decode_document(json!({"sections": [
            {"type": "projects", "title": null, "visible": "no", "data": null}
        ]}));
        assert_eq!(doc.sections.len(), 1);
        assert_eq!(doc.sections[0].title, "Projects");
        assert!(doc.sections[0].visible);
        assert!(doc.sections[0].data.is_empty());
    }

    #[test]
    fn test_null_item_field_defaults_instead_of_dropping_item() {
        let doc = decode_document(json!({"sections": [
            {"type": "experience", "data": [
                {"id": "x1", "company": "Acme", "description": null, "current": true}
            ]}
        ]}));
        let data = &doc.sections[0].data;
        assert_eq!(data.len(), 1);
        assert_eq!(data[0].id(), "x1");
        assert_eq!(data[0].field("company"), Some(json!("Acme")));
        assert_eq!(data[0].field("description"), Some(json!("")));
        assert_eq!(data[0].field("current"), Some(json!(true)));
    }

    #[test]
    fn test_missing_and_duplicate_ids_are_reissued() {
        let doc = decode_document(json!({
            "personalInfo": {"socialLinks": [{"id": "dup", "platform": "gh", "url": "u"}]},
            "sections": [
                {"type": "skills", "data": [{"name": "Rust"}, {"id": "dup", "name": "Go"}, {"id": "keep", "name": "C"}]}
            ]
        }));
        assert_eq!(doc.personal_info.social_links[0].id, "dup");
        let ids: Vec<_> = doc.sections[0].data.iter().map(|i| i.id().to_string()).collect();
        assert!(!ids[0].is_empty());
        assert_ne!(ids[1], "dup");
        assert_eq!(ids[2], "keep");
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_partial_metadata_keeps_present_fields() {
        let doc = decode_document(json!({"metadata": {"title": "Partial", "version": 7}}));
        assert_eq!(doc.metadata.title, "Partial");
        assert_eq!(doc.metadata.version, 7);
        assert!(!doc.metadata.id.is_empty());
    }

    #[test]
    fn test_well_formed_document_decodes_unchanged() {
        let mut original = ResumeDocument::default();
        original.personal_info.name = "Grace".to_string();
        let decoded = decode_document(serde_json::to_value(&original).unwrap());
        assert_eq!(decoded, original);
    }
}
