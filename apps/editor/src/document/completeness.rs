use serde::{Deserialize, Serialize};

use crate::models::resume::{ResumeDocument, SectionType};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum SectionStatus {
    Filled,
    Sparse,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionHealth {
    pub section: SectionType,
    pub item_count: usize,
    pub visible: bool,
    pub status: SectionStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletenessReport {
    pub is_complete: bool,
    /// Share of required personal fields filled in, 0 – 100.
    pub score: u32,
    pub missing_fields: Vec<String>,
    pub sections: Vec<SectionHealth>,
    pub total_items: usize,
}

const REQUIRED_FIELDS: &[&str] = &["personalInfo.name", "personalInfo.email", "personalInfo.phone"];

/// Items needed before a section counts as filled rather than sparse.
const FILLED_THRESHOLD: usize = 2;

pub fn compute_completeness(doc: &ResumeDocument) -> CompletenessReport {
    let info = &doc.personal_info;
    let values = [&info.name, &info.email, &info.phone];

    let missing_fields: Vec<String> = REQUIRED_FIELDS
        .iter()
        .zip(values)
        .filter(|(_, v)| v.trim().is_empty())
        .map(|(field, _)| field.to_string())
        .collect();

    let completed = REQUIRED_FIELDS.len() - missing_fields.len();
    let score = ((completed as f64 / REQUIRED_FIELDS.len() as f64) * 100.0).round() as u32;

    let sections: Vec<SectionHealth> = SectionType::ALL
        .iter()
        .map(|kind| {
            let section = doc.section(*kind);
            let item_count = section.map(|s| s.data.len()).unwrap_or(0);
            let status = match item_count {
                0 => SectionStatus::Missing,
                n if n < FILLED_THRESHOLD => SectionStatus::Sparse,
                _ => SectionStatus::Filled,
            };
            SectionHealth {
                section: *kind,
                item_count,
                visible: section.map(|s| s.visible).unwrap_or(false),
                status,
            }
        })
        .collect();

    CompletenessReport {
        is_complete: missing_fields.is_empty(),
        score,
        missing_fields,
        total_items: sections.iter().map(|s| s.item_count).sum(),
        sections,
    }
}
