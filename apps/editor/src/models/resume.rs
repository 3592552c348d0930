use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::ids::new_id;
use crate::models::items::Item;
use crate::models::now_millis;

pub const DEFAULT_TITLE: &str = "My Resume";
pub const MAX_SPACING: u8 = 3;

/// The fixed set of section kinds. Each kind appears at most once in a document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Education,
    Experience,
    Skills,
    Projects,
    Certifications,
    Languages,
}

impl SectionType {
    pub const ALL: [SectionType; 6] = [
        SectionType::Education,
        SectionType::Experience,
        SectionType::Skills,
        SectionType::Projects,
        SectionType::Certifications,
        SectionType::Languages,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Education => "education",
            SectionType::Experience => "experience",
            SectionType::Skills => "skills",
            SectionType::Projects => "projects",
            SectionType::Certifications => "certifications",
            SectionType::Languages => "languages",
        }
    }

    /// Title used when a section is created implicitly.
    pub fn default_title(&self) -> &'static str {
        match self {
            SectionType::Education => "Education",
            SectionType::Experience => "Work Experience",
            SectionType::Skills => "Skills",
            SectionType::Projects => "Projects",
            SectionType::Certifications => "Certifications",
            SectionType::Languages => "Languages",
        }
    }
}

/// Missing fields decode as those of a fresh document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Metadata {
    pub id: String,
    pub title: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_modified: DateTime<Utc>,
    pub version: u64,
}

impl Metadata {
    pub fn fresh(title: Option<&str>) -> Self {
        let now = now_millis();
        Self {
            id: new_id(),
            title: title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(DEFAULT_TITLE)
                .to_string(),
            created_at: now,
            last_modified: now,
            version: 1,
        }
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self::fresh(None)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct SocialLink {
    pub id: String,
    pub platform: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonalInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub social_links: Vec<SocialLink>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    #[default]
    Inter,
    Roboto,
    OpenSans,
    Lato,
    Merriweather,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Modern,
    Classic,
    Minimal,
    Professional,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub font_family: FontFamily,
    pub font_size: FontSize,
    pub color_scheme: ColorScheme,
    pub spacing: u8,
    pub show_avatar: bool,
    #[serde(rename = "template", alias = "templateId")]
    pub template_id: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font_family: FontFamily::Inter,
            font_size: FontSize::Medium,
            color_scheme: ColorScheme::Modern,
            spacing: 1,
            show_avatar: true,
            template_id: "modern".to_string(),
        }
    }
}

impl Settings {
    /// Clamps out-of-range values and fills an empty template id.
    pub fn normalized(mut self) -> Self {
        self.spacing = self.spacing.min(MAX_SPACING);
        if self.template_id.trim().is_empty() {
            self.template_id = Settings::default().template_id;
        }
        self
    }
}

/// An ordered, visibility-toggleable group of same-typed items.
///
/// Serializes to `{ type, title, visible, order, data }`. Every item in `data`
/// has the shape of `section_type`; decoding rejects any that do not.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawSection")]
pub struct Section {
    pub section_type: SectionType,
    pub title: String,
    pub visible: bool,
    pub order: usize,
    pub data: Vec<Item>,
}

impl Section {
    pub fn empty(section_type: SectionType, order: usize) -> Self {
        Self {
            section_type,
            title: section_type.default_title().to_string(),
            visible: true,
            order,
            data: Vec::new(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SectionRef<'a> {
    #[serde(rename = "type")]
    section_type: SectionType,
    title: &'a str,
    visible: bool,
    order: usize,
    data: &'a [Item],
}

impl Serialize for Section {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SectionRef {
            section_type: self.section_type,
            title: &self.title,
            visible: self.visible,
            order: self.order,
            data: &self.data,
        }
        .serialize(serializer)
    }
}

/// Wire shape of a section before its items are decoded for the section kind.
/// Only `type` is required; any other field of the wrong type reads as its default.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSection {
    #[serde(rename = "type")]
    pub section_type: SectionType,
    #[serde(default, deserialize_with = "or_default")]
    pub title: String,
    #[serde(default = "default_visible", deserialize_with = "visible_or_default")]
    pub visible: bool,
    #[serde(default, deserialize_with = "or_default")]
    pub order: usize,
    #[serde(default, deserialize_with = "or_default")]
    pub data: Vec<Value>,
}

fn default_visible() -> bool {
    true
}

fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

fn visible_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(Value::deserialize(deserializer)?
        .as_bool()
        .unwrap_or_else(default_visible))
}

impl TryFrom<RawSection> for Section {
    type Error = String;

    fn try_from(raw: RawSection) -> Result<Self, Self::Error> {
        let data = raw
            .data
            .into_iter()
            .map(|v| Item::from_value(raw.section_type, v))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid {} item: {e}", raw.section_type.as_str()))?;
        let title = if raw.title.trim().is_empty() {
            raw.section_type.default_title().to_string()
        } else {
            raw.title
        };
        Ok(Section {
            section_type: raw.section_type,
            title,
            visible: raw.visible,
            order: raw.order,
            data,
        })
    }
}

/// The canonical six-section skeleton, all visible and empty.
pub fn default_sections() -> Vec<Section> {
    SectionType::ALL
        .iter()
        .enumerate()
        .map(|(order, kind)| Section::empty(*kind, order))
        .collect()
}

/// The root aggregate: the single source of truth for the resume being edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResumeDocument {
    pub metadata: Metadata,
    pub personal_info: PersonalInfo,
    pub sections: Vec<Section>,
    pub settings: Settings,
}

impl ResumeDocument {
    pub fn new(title: Option<&str>) -> Self {
        Self {
            metadata: Metadata::fresh(title),
            personal_info: PersonalInfo::default(),
            sections: default_sections(),
            settings: Settings::default(),
        }
    }

    pub fn section(&self, kind: SectionType) -> Option<&Section> {
        self.sections.iter().find(|s| s.section_type == kind)
    }

    pub fn find_item(&self, kind: SectionType, item_id: &str) -> Option<&Item> {
        self.section(kind)?.data.iter().find(|i| i.id() == item_id)
    }
}

impl Default for ResumeDocument {
    fn default() -> Self {
        Self::new(None)
    }
}
