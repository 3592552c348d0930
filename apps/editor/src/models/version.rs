use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::resume::ResumeDocument;

/// An immutable deep copy of the document taken at `timestamp`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub description: String,
    pub data: ResumeDocument,
}

/// Listing entry without the document payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub description: String,
    pub title: String,
}

impl From<&VersionSnapshot> for VersionSummary {
    fn from(v: &VersionSnapshot) -> Self {
        Self {
            id: v.id.clone(),
            timestamp: v.timestamp,
            description: v.description.clone(),
            title: v.data.metadata.title.clone(),
        }
    }
}
