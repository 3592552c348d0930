//! Advisory checks on items and personal info.
//!
//! Nothing here blocks a commit. Warnings are returned to the caller and
//! logged so the editor can highlight fields.

use serde::{Deserialize, Serialize};

use crate::models::items::{Item, MAX_SKILL_LEVEL, MIN_SKILL_LEVEL};
use crate::models::resume::PersonalInfo;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum WarningSeverity {
    Advisory,
    Warning,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
}

impl ValidationWarning {
    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
            severity: WarningSeverity::Warning,
        }
    }

    fn advisory(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
            severity: WarningSeverity::Advisory,
        }
    }
}

fn require(warnings: &mut Vec<ValidationWarning>, field: &str, value: &str) {
    if value.trim().is_empty() {
        warnings.push(ValidationWarning::warning(field, format!("{field} is required")));
    }
}

/// `current` and an end date are mutually exclusive; exactly one should be set
/// for dated entries that require an end.
fn check_period(
    warnings: &mut Vec<ValidationWarning>,
    current: bool,
    end_date: Option<&str>,
    end_required: bool,
) {
    let has_end = end_date.is_some_and(|d| !d.trim().is_empty());
    if current && has_end {
        warnings.push(ValidationWarning::advisory(
            "endDate",
            "Marked as current but also has an end date",
        ));
    } else if end_required && !current && !has_end {
        warnings.push(ValidationWarning::warning(
            "endDate",
            "Choose an end date or mark as current",
        ));
    }
}

fn check_url(warnings: &mut Vec<ValidationWarning>, field: &str, url: Option<&str>) {
    if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
        if !is_valid_url(url) {
            warnings.push(ValidationWarning::warning(
                field,
                format!("'{url}' is not a valid URL"),
            ));
        }
    }
}

pub fn is_valid_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !host.is_empty() && !host.contains(char::is_whitespace)
        }
        None => false,
    }
}

pub fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(a, b)| !a.is_empty() && !b.is_empty())
        }
        None => false,
    }
}

/// Digits, spaces, `-`, `+`, parentheses; at least seven digits.
pub fn is_valid_phone(phone: &str) -> bool {
    let allowed = phone
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '+' | '(' | ')'));
    allowed && phone.chars().filter(|c| c.is_ascii_digit()).count() >= 7
}

pub fn validate_item(item: &Item) -> Vec<ValidationWarning> {
    let mut w = Vec::new();
    match item {
        Item::Education(e) => {
            require(&mut w, "school", &e.school);
            require(&mut w, "degree", &e.degree);
            require(&mut w, "major", &e.major);
            require(&mut w, "startDate", &e.start_date);
            check_period(&mut w, e.current, e.end_date.as_deref(), true);
        }
        Item::Experience(e) => {
            require(&mut w, "company", &e.company);
            require(&mut w, "position", &e.position);
            require(&mut w, "startDate", &e.start_date);
            require(&mut w, "description", &e.description);
            check_period(&mut w, e.current, e.end_date.as_deref(), true);
        }
        Item::Skill(s) => {
            require(&mut w, "name", &s.name);
            if !(MIN_SKILL_LEVEL..=MAX_SKILL_LEVEL).contains(&s.level) {
                w.push(ValidationWarning::warning(
                    "level",
                    format!("Level must be between {MIN_SKILL_LEVEL} and {MAX_SKILL_LEVEL}"),
                ));
            }
        }
        Item::Project(p) => {
            require(&mut w, "name", &p.name);
            require(&mut w, "description", &p.description);
            check_period(&mut w, p.current, p.end_date.as_deref(), false);
            check_url(&mut w, "url", p.url.as_deref());
        }
        Item::Certification(c) => {
            require(&mut w, "name", &c.name);
            require(&mut w, "issuer", &c.issuer);
            require(&mut w, "date", &c.date);
            check_url(&mut w, "url", c.url.as_deref());
        }
        Item::Language(l) => {
            require(&mut w, "name", &l.name);
        }
    }
    w
}

pub fn validate_personal_info(info: &PersonalInfo) -> Vec<ValidationWarning> {
    let mut w = Vec::new();
    require(&mut w, "name", &info.name);
    require(&mut w, "email", &info.email);
    require(&mut w, "phone", &info.phone);
    require(&mut w, "location", &info.location);
    if !info.email.trim().is_empty() && !is_valid_email(&info.email) {
        w.push(ValidationWarning::warning("email", "Enter a valid email address"));
    }
    if !info.phone.trim().is_empty() && !is_valid_phone(&info.phone) {
        w.push(ValidationWarning::warning("phone", "Enter a valid phone number"));
    }
    check_url(&mut w, "website", info.website.as_deref());
    for link in &info.social_links {
        check_url(&mut w, "socialLinks", Some(&link.url));
    }
    w
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::SectionType;
    use serde_json::json;

    fn filled_experience() -> Item {
        let mut item = Item::blank(SectionType::Experience);
        item.set_field("company", json!("Acme")).unwrap();
        item.set_field("position", json!("Engineer")).unwrap();
        item.set_field("startDate", json!("2020-01")).unwrap();
        item.set_field("description", json!("Built things")).unwrap();
        item
    }

    #[test]
    fn test_complete_current_experience_passes() {
        let mut item = filled_experience();
        item.set_field("current", json!(true)).unwrap();
        assert!(validate_item(&item).is_empty());
    }

    #[test]
    fn test_missing_end_and_not_current_warns() {
        let w = validate_item(&filled_experience());
        assert_eq!(w.len(), 1);
        assert_eq!(w[0].field, "endDate");
        assert_eq!(w[0].severity, WarningSeverity::Warning);
    }

    #[test]
    fn test_current_with_end_date_is_advisory() {
        let mut item = filled_experience();
        item.set_field("current", json!(true)).unwrap();
        item.set_field("endDate", json!("2022-01")).unwrap();
        let w = validate_item(&item);
        assert_eq!(w.len(), 1);
        assert_eq!(w[0].severity, WarningSeverity::Advisory);
    }

    #[test]
    fn test_blank_education_lists_required_fields() {
        let w = validate_item(&Item::blank(SectionType::Education));
        let fields: Vec<_> = w.iter().map(|w| w.field.as_str()).collect();
        assert_eq!(fields, vec!["school", "degree", "major", "startDate", "endDate"]);
    }

    #[test]
    fn test_project_without_end_is_fine() {
        let mut item = Item::blank(SectionType::Projects);
        item.set_field("name", json!("Compiler")).unwrap();
        item.set_field("description", json!("A toy compiler")).unwrap();
        assert!(validate_item(&item).is_empty());
        item.set_field("url", json!("not a url")).unwrap();
        assert_eq!(validate_item(&item)[0].field, "url");
    }

    #[test]
    fn test_skill_level_out_of_range() {
        let item = Item::from_value(SectionType::Skills, json!({"id": "s", "name": "Rust", "level": 0}))
            .unwrap();
        assert_eq!(validate_item(&item)[0].field, "level");
    }

    #[test]
    fn test_url_email_phone_helpers() {
        assert!(is_valid_url("https://example.com/path"));
        assert!(is_valid_url("http://localhost:3000"));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("https://"));
        assert!(is_valid_email("ada@example.com"));
        assert!(!is_valid_email("ada@example"));
        assert!(!is_valid_email("ada example.com"));
        assert!(is_valid_phone("+1 (555) 010-0100"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("555-CALL-NOW"));
    }

    #[test]
    fn test_personal_info_checks() {
        let info = PersonalInfo {
            name: "Ada".to_string(),
            email: "ada@".to_string(),
            phone: "+44 20 7946 0000".to_string(),
            location: "London".to_string(),
            website: Some("ada.dev".to_string()),
            ..Default::default()
        };
        let fields: Vec<_> = validate_personal_info(&info)
            .into_iter()
            .map(|w| w.field)
            .collect();
        assert_eq!(fields, vec!["email".to_string(), "website".to_string()]);
    }
}
