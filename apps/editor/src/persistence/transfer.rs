//! JSON export and import of whole documents.

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::document::heal::decode_document;
use crate::models::resume::ResumeDocument;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Import is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Import must be a JSON object describing a resume")]
    NotADocument,
}

/// Pretty-printed JSON of the whole document.
pub fn export_json(doc: &ResumeDocument) -> Result<String, TransferError> {
    Ok(serde_json::to_string_pretty(doc)?)
}

/// `<title>.json`, with characters unsafe in file names replaced.
pub fn default_filename(doc: &ResumeDocument) -> String {
    sanitize_filename(&doc.metadata.title)
}

/// Reduces `raw` to a single file name: no separators, no leading dots,
/// always a `.json` extension. Empty input becomes `resume.json`.
pub fn sanitize_filename(raw: &str) -> String {
    let stem: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let stem = stem.trim_matches(|c: char| c == '.' || c.is_whitespace());
    let stem = stem.strip_suffix(".json").unwrap_or(stem);
    if stem.is_empty() {
        "resume.json".to_string()
    } else {
        format!("{stem}.json")
    }
}

pub async fn export_to_file(
    doc: &ResumeDocument,
    dir: &Path,
    filename: Option<&str>,
) -> Result<PathBuf, TransferError> {
    let name = match filename.map(str::trim).filter(|f| !f.is_empty()) {
        Some(f) => sanitize_filename(f),
        None => default_filename(doc),
    };
    let path = dir.join(name);
    let json = export_json(doc)?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|source| TransferError::Write {
            path: path.clone(),
            source,
        })?;
    info!("Exported document {} to {}", doc.metadata.id, path.display());
    Ok(path)
}

/// Parses an exported document. Syntax errors and non-object payloads are
/// rejected; anything else is healed into a valid document.
pub fn import_json(text: &str) -> Result<ResumeDocument, TransferError> {
    let value: Value = serde_json::from_str(text)?;
    if !value.is_object() {
        return Err(TransferError::NotADocument);
    }
    Ok(decode_document(value))
}

pub async fn import_from_file(path: &Path) -> Result<ResumeDocument, TransferError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| TransferError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    let doc = import_json(&text)?;
    info!("Imported document {} from {}", doc.metadata.id, path.display());
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::items::Item;
    use crate::models::resume::SectionType;
    use crate::sections::mutator::{upsert_item, CommitMode};
    use serde_json::json;

    fn sample() -> ResumeDocument {
        let mut doc = ResumeDocument::new(Some("Ada Lovelace"));
        doc.personal_info.name = "Ada".to_string();
        let mut skill = Item::blank(SectionType::Skills);
        skill.set_field("name", json!("Analysis")).unwrap();
        doc.sections = upsert_item(&doc.sections, skill, CommitMode::Create);
        doc
    }

    #[tokio::test]
    async fn test_export_then_import_restores_document() {
        let dir = tempfile::tempdir().unwrap();
        let doc = sample();

        let path = export_to_file(&doc, dir.path(), None).await.unwrap();
        assert_eq!(path.file_name().unwrap(), "Ada Lovelace.json");

        let imported = import_from_file(&path).await.unwrap();
        assert_eq!(imported, doc);
    }

    #[test]
    fn test_import_rejects_syntax_errors_and_non_objects() {
        assert!(matches!(import_json("{oops"), Err(TransferError::Malformed(_))));
        assert!(matches!(import_json("[1, 2]"), Err(TransferError::NotADocument)));
    }

    #[test]
    fn test_import_heals_partial_document() {
        let doc = import_json(r#"{"metadata": {"title": "Partial"}, "sections": null}"#).unwrap();
        assert_eq!(doc.metadata.title, "Partial");
        assert_eq!(doc.sections.len(), 6);
    }

    #[tokio::test]
    async fn test_import_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = import_from_file(&dir.path().join("missing.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Read { .. }));
    }

    #[test]
    fn test_default_filename_sanitizes_title() {
        let mut doc = ResumeDocument::default();
        doc.metadata.title = "CV: 2024/25".to_string();
        assert_eq!(default_filename(&doc), "CV_ 2024_25.json");
        doc.metadata.title = "   ".to_string();
        assert_eq!(default_filename(&doc), "resume.json");
    }

    #[tokio::test]
    async fn test_export_to_file_keeps_caller_filename_inside_dir() {
        let dir = tempfile::tempdir().unwrap();
        let doc = ResumeDocument::default();

        let path = export_to_file(&doc, dir.path(), Some("../../escape"))
            .await
            .unwrap();
        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(path.file_name().unwrap(), "_.._escape.json");

        let path = export_to_file(&doc, dir.path(), Some("/tmp/abs.json"))
            .await
            .unwrap();
        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(path.file_name().unwrap(), "_tmp_abs.json");
        assert!(path.exists());
    }

    #[test]
    fn test_sanitize_filename_keeps_single_extension() {
        assert_eq!(sanitize_filename("mine.json"), "mine.json");
        assert_eq!(sanitize_filename("mine"), "mine.json");
        assert_eq!(sanitize_filename("..."), "resume.json");
    }
}
