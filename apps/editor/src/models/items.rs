//! Section item shapes. One struct per section kind, unified by [`Item`].
//!
//! Every field defaults when missing so documents written by older builds
//! (or edited by hand) still decode.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::ids::new_id;
use crate::models::resume::SectionType;

pub const MIN_SKILL_LEVEL: u8 = 1;
pub const MAX_SKILL_LEVEL: u8 = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Education {
    pub id: String,
    pub school: String,
    pub degree: String,
    pub major: String,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Experience {
    pub id: String,
    pub company: String,
    pub position: String,
    pub start_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub description: String,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Skill {
    pub id: String,
    pub name: String,
    pub level: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Default for Skill {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            level: 3,
            category: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub description: String,
    pub technologies: Vec<String>,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Certification {
    pub id: String,
    pub name: String,
    pub issuer: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Proficiency {
    Native,
    Fluent,
    Advanced,
    #[default]
    Intermediate,
    Basic,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Language {
    pub id: String,
    pub name: String,
    pub proficiency: Proficiency,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One record within a section, keyed by the section kind it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Item {
    Education(Education),
    Experience(Experience),
    Skill(Skill),
    Project(Project),
    Certification(Certification),
    Language(Language),
}

#[derive(Debug, Error)]
pub enum FieldError {
    #[error("Unknown field '{field}' for {kind} items")]
    UnknownField { kind: &'static str, field: String },

    #[error("Item ids are immutable")]
    ImmutableId,

    #[error("Invalid value for '{field}': {source}")]
    InvalidValue {
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

const EDUCATION_FIELDS: &[&str] = &[
    "school",
    "degree",
    "major",
    "startDate",
    "endDate",
    "current",
    "gpa",
    "description",
];
const EXPERIENCE_FIELDS: &[&str] = &[
    "company",
    "position",
    "startDate",
    "endDate",
    "current",
    "location",
    "description",
    "achievements",
];
const SKILL_FIELDS: &[&str] = &["name", "level", "category"];
const PROJECT_FIELDS: &[&str] = &[
    "name",
    "role",
    "startDate",
    "endDate",
    "current",
    "url",
    "description",
    "technologies",
    "achievements",
];
const CERTIFICATION_FIELDS: &[&str] = &[
    "name",
    "issuer",
    "date",
    "credentialId",
    "url",
    "description",
];
const LANGUAGE_FIELDS: &[&str] = &["name", "proficiency", "certificate", "notes"];

/// Editable (non-id) fields of an item kind, in wire (camelCase) naming.
pub fn editable_fields(kind: SectionType) -> &'static [&'static str] {
    match kind {
        SectionType::Education => EDUCATION_FIELDS,
        SectionType::Experience => EXPERIENCE_FIELDS,
        SectionType::Skills => SKILL_FIELDS,
        SectionType::Projects => PROJECT_FIELDS,
        SectionType::Certifications => CERTIFICATION_FIELDS,
        SectionType::Languages => LANGUAGE_FIELDS,
    }
}

impl Item {
    /// Item factory: an empty record of the given kind with a freshly allocated id.
    pub fn blank(kind: SectionType) -> Item {
        let id = new_id();
        match kind {
            SectionType::Education => Item::Education(Education {
                id,
                ..Default::default()
            }),
            SectionType::Experience => Item::Experience(Experience {
                id,
                ..Default::default()
            }),
            SectionType::Skills => Item::Skill(Skill {
                id,
                ..Default::default()
            }),
            SectionType::Projects => Item::Project(Project {
                id,
                ..Default::default()
            }),
            SectionType::Certifications => Item::Certification(Certification {
                id,
                ..Default::default()
            }),
            SectionType::Languages => Item::Language(Language {
                id,
                ..Default::default()
            }),
        }
    }

    /// Decodes a JSON record as the item shape for `kind`.
    pub fn from_value(kind: SectionType, value: Value) -> Result<Item, serde_json::Error> {
        Ok(match kind {
            SectionType::Education => Item::Education(serde_json::from_value(value)?),
            SectionType::Experience => Item::Experience(serde_json::from_value(value)?),
            SectionType::Skills => Item::Skill(serde_json::from_value(value)?),
            SectionType::Projects => Item::Project(serde_json::from_value(value)?),
            SectionType::Certifications => Item::Certification(serde_json::from_value(value)?),
            SectionType::Languages => Item::Language(serde_json::from_value(value)?),
        })
    }

    pub fn id(&self) -> &str {
        match self {
            Item::Education(e) => &e.id,
            Item::Experience(e) => &e.id,
            Item::Skill(s) => &s.id,
            Item::Project(p) => &p.id,
            Item::Certification(c) => &c.id,
            Item::Language(l) => &l.id,
        }
    }

    /// Only the healing decoder may assign ids, and only to records that
    /// arrived without a usable one.
    pub(crate) fn reissue_id(&mut self, id: String) {
        match self {
            Item::Education(e) => e.id = id,
            Item::Experience(e) => e.id = id,
            Item::Skill(s) => s.id = id,
            Item::Project(p) => p.id = id,
            Item::Certification(c) => c.id = id,
            Item::Language(l) => l.id = id,
        }
    }

    pub fn section_type(&self) -> SectionType {
        match self {
            Item::Education(_) => SectionType::Education,
            Item::Experience(_) => SectionType::Experience,
            Item::Skill(_) => SectionType::Skills,
            Item::Project(_) => SectionType::Projects,
            Item::Certification(_) => SectionType::Certifications,
            Item::Language(_) => SectionType::Languages,
        }
    }

    fn to_object(&self) -> Result<Map<String, Value>, serde_json::Error> {
        serde_json::to_value(self).map(|v| match v {
            Value::Object(map) => map,
            _ => Map::new(),
        })
    }

    /// Reads a single field by its wire name. Unset optional fields read as `None`.
    pub fn field(&self, name: &str) -> Option<Value> {
        self.to_object().ok()?.remove(name)
    }

    /// Replaces a single field by its wire name. `null` clears optional fields.
    /// The id can never be changed through this path, and ranged values are
    /// clamped the same way the loader clamps them.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<(), FieldError> {
        let kind = self.section_type();
        if name == "id" {
            return Err(FieldError::ImmutableId);
        }
        if !editable_fields(kind).contains(&name) {
            return Err(FieldError::UnknownField {
                kind: kind.as_str(),
                field: name.to_string(),
            });
        }
        let invalid = |source| FieldError::InvalidValue {
            field: name.to_string(),
            source,
        };
        let mut object = self.to_object().map_err(invalid)?;
        object.insert(name.to_string(), value);
        let mut updated = Item::from_value(kind, Value::Object(object)).map_err(invalid)?;
        updated.normalize();
        *self = updated;
        Ok(())
    }

    /// Clamps values the editor constrains to a range.
    pub fn normalize(&mut self) {
        if let Item::Skill(skill) = self {
            skill.level = skill.level.clamp(MIN_SKILL_LEVEL, MAX_SKILL_LEVEL);
        }
    }

    /// Label shown for the item in the editor list.
    pub fn display_title(&self) -> String {
        let first = |candidates: &[&str]| {
            candidates
                .iter()
                .find(|c| !c.trim().is_empty())
                .map(|c| c.to_string())
        };
        let label = match self {
            Item::Education(e) => first(&[e.school.as_str(), e.degree.as_str()]),
            Item::Experience(e) => first(&[e.company.as_str(), e.position.as_str()]),
            Item::Skill(s) => first(&[s.name.as_str()]),
            Item::Project(p) => first(&[p.name.as_str(), p.role.as_deref().unwrap_or_default()]),
            Item::Certification(c) => first(&[c.name.as_str(), c.issuer.as_str()]),
            Item::Language(l) => first(&[l.name.as_str()]),
        };
        label.unwrap_or_else(|| match self {
            Item::Education(_) => "Untitled education".to_string(),
            Item::Experience(_) => "Untitled experience".to_string(),
            Item::Skill(_) => "Untitled skill".to_string(),
            Item::Project(_) => "Untitled project".to_string(),
            Item::Certification(_) => "Untitled certification".to_string(),
            Item::Language(_) => "Untitled language".to_string(),
        })
    }
}
