//! The single-writer owner of the resume being edited.
//!
//! All writes are serialized through one `watch` channel: readers take
//! snapshots, subscribers (the autosave bridge) are woken after every write.

use std::convert::Infallible;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info};

use crate::ids::new_id;
use crate::models::now_millis;
use crate::models::resume::{Metadata, PersonalInfo, ResumeDocument, Section, Settings, SocialLink};

#[derive(Clone)]
pub struct DocumentStore {
    tx: Arc<watch::Sender<ResumeDocument>>,
}

impl DocumentStore {
    pub fn new(doc: ResumeDocument) -> Self {
        let (tx, _rx) = watch::channel(doc);
        Self { tx: Arc::new(tx) }
    }

    /// Snapshot of the current document.
    pub fn get(&self) -> ResumeDocument {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResumeDocument> {
        self.tx.subscribe()
    }

    /// Replaces the document content. Identity (`id`, `createdAt`) is kept.
    pub fn set(&self, doc: ResumeDocument) {
        self.update(move |_| doc);
    }

    /// Applies a pure function of the previous document.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&ResumeDocument) -> ResumeDocument,
    {
        let _ = self.try_update(|prev| Ok::<_, Infallible>(f(prev)));
    }

    /// Like [`update`](Self::update), but leaves the document untouched (and
    /// unstamped) when `f` fails.
    pub fn try_update<F, E>(&self, f: F) -> Result<(), E>
    where
        F: FnOnce(&ResumeDocument) -> Result<ResumeDocument, E>,
    {
        let mut outcome = Ok(());
        self.tx.send_if_modified(|current| match f(&*current) {
            Ok(mut next) => {
                next.metadata.id = current.metadata.id.clone();
                next.metadata.created_at = current.metadata.created_at;
                next.metadata.version = current.metadata.version + 1;
                next.metadata.last_modified = now_millis();
                *current = next;
                true
            }
            Err(e) => {
                outcome = Err(e);
                false
            }
        });
        if outcome.is_ok() {
            debug!("Document updated");
        }
        outcome
    }

    /// Overwrites the whole document, identity included. Reserved for
    /// new/reset/import/version restore.
    pub fn replace(&self, mut doc: ResumeDocument) {
        doc.metadata.last_modified = now_millis();
        info!(
            "Replacing document with '{}' ({})",
            doc.metadata.title, doc.metadata.id
        );
        self.tx.send_replace(doc);
    }

    pub fn new_document(&self, title: Option<&str>) {
        self.replace(ResumeDocument::new(title));
    }

    /// Resets to a fresh default. Declining confirmation is a no-op.
    pub fn reset(&self, confirmed: bool) -> bool {
        if !confirmed {
            return false;
        }
        self.replace(ResumeDocument::default());
        true
    }

    // ── Derived views ──────────────────────────────────────────────────────

    pub fn metadata(&self) -> Metadata {
        self.tx.borrow().metadata.clone()
    }

    pub fn set_title(&self, title: &str) {
        let title = title.trim().to_string();
        self.update(|prev| {
            let mut next = prev.clone();
            next.metadata.title = title;
            next
        });
    }

    pub fn personal_info(&self) -> PersonalInfo {
        self.tx.borrow().personal_info.clone()
    }

    pub fn set_personal_info(&self, info: PersonalInfo) {
        self.update_personal_info(move |_| info);
    }

    pub fn update_personal_info<F>(&self, f: F)
    where
        F: FnOnce(&PersonalInfo) -> PersonalInfo,
    {
        self.update(|prev| {
            let mut next = prev.clone();
            next.personal_info = f(&prev.personal_info);
            next
        });
    }

    pub fn sections(&self) -> Vec<Section> {
        self.tx.borrow().sections.clone()
    }

    pub fn set_sections(&self, sections: Vec<Section>) {
        self.update_sections(move |_| sections);
    }

    pub fn update_sections<F>(&self, f: F)
    where
        F: FnOnce(&[Section]) -> Vec<Section>,
    {
        self.update(|prev| {
            let mut next = prev.clone();
            next.sections = f(&prev.sections);
            next
        });
    }

    pub fn settings(&self) -> Settings {
        self.tx.borrow().settings.clone()
    }

    pub fn set_settings(&self, settings: Settings) {
        let settings = settings.normalized();
        self.update(|prev| {
            let mut next = prev.clone();
            next.settings = settings;
            next
        });
    }

    // ── Social links ───────────────────────────────────────────────────────

    pub fn add_social_link(&self, platform: &str, url: &str) -> SocialLink {
        let link = SocialLink {
            id: new_id(),
            platform: platform.to_string(),
            url: url.to_string(),
            icon: None,
        };
        let added = link.clone();
        self.update_personal_info(|prev| {
            let mut next = prev.clone();
            next.social_links.push(link);
            next
        });
        added
    }

    /// Returns `false` when no link has the given id.
    pub fn remove_social_link(&self, link_id: &str) -> bool {
        if !self
            .personal_info()
            .social_links
            .iter()
            .any(|l| l.id == link_id)
        {
            return false;
        }
        self.update_personal_info(|prev| {
            let mut next = prev.clone();
            next.social_links.retain(|l| l.id != link_id);
            next
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::SectionType;

    #[test]
    fn test_set_stamps_metadata_and_keeps_identity() {
        let store = DocumentStore::new(ResumeDocument::default());
        let before = store.get();

        let mut edited = ResumeDocument::new(Some("Other"));
        edited.personal_info.name = "Ada".to_string();
        store.set(edited);

        let after = store.get();
        assert_eq!(after.personal_info.name, "Ada");
        assert_eq!(after.metadata.title, "Other");
        assert_eq!(after.metadata.id, before.metadata.id);
        assert_eq!(after.metadata.created_at, before.metadata.created_at);
        assert_eq!(after.metadata.version, before.metadata.version + 1);
        assert!(after.metadata.last_modified >= before.metadata.last_modified);
    }

    #[test]
    fn test_views_preserve_other_fields() {
        let store = DocumentStore::new(ResumeDocument::default());
        store.update_personal_info(|p| PersonalInfo {
            name: "Ada".to_string(),
            ..p.clone()
        });
        store.set_settings(Settings {
            spacing: 2,
            ..Settings::default()
        });
        store.update_sections(|s| s[..2].to_vec());

        let doc = store.get();
        assert_eq!(doc.personal_info.name, "Ada");
        assert_eq!(doc.settings.spacing, 2);
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[1].section_type, SectionType::Experience);
    }

    #[test]
    fn test_settings_are_clamped_on_write() {
        let store = DocumentStore::new(ResumeDocument::default());
        store.set_settings(Settings {
            spacing: 10,
            ..Settings::default()
        });
        assert_eq!(store.settings().spacing, 3);
    }

    #[test]
    fn test_failed_try_update_leaves_document() {
        let store = DocumentStore::new(ResumeDocument::default());
        let before = store.get();
        let result: Result<(), &str> = store.try_update(|_| Err("nope"));
        assert_eq!(result, Err("nope"));
        assert_eq!(store.get(), before);
    }

    #[test]
    fn test_replace_overwrites_identity() {
        let store = DocumentStore::new(ResumeDocument::default());
        let incoming = ResumeDocument::new(Some("Imported"));
        store.replace(incoming.clone());
        let doc = store.get();
        assert_eq!(doc.metadata.id, incoming.metadata.id);
        assert_eq!(doc.metadata.created_at, incoming.metadata.created_at);
        assert_eq!(doc.metadata.title, "Imported");
    }

    #[test]
    fn test_reset_requires_confirmation() {
        let store = DocumentStore::new(ResumeDocument::default());
        store.update_personal_info(|p| PersonalInfo {
            name: "Ada".to_string(),
            ..p.clone()
        });
        let id = store.metadata().id;

        assert!(!store.reset(false));
        assert_eq!(store.personal_info().name, "Ada");

        assert!(store.reset(true));
        assert_eq!(store.personal_info().name, "");
        assert_ne!(store.metadata().id, id);
    }

    #[test]
    fn test_social_links_add_and_remove() {
        let store = DocumentStore::new(ResumeDocument::default());
        let a = store.add_social_link("github", "https://github.com/ada");
        let b = store.add_social_link("blog", "https://ada.dev");
        assert_ne!(a.id, b.id);
        assert!(store.remove_social_link(&a.id));
        assert!(!store.remove_social_link(&a.id));
        let links = store.personal_info().social_links;
        assert_eq!(links, vec![b]);
    }

    #[tokio::test]
    async fn test_subscribers_see_writes() {
        let store = DocumentStore::new(ResumeDocument::default());
        let mut rx = store.subscribe();
        store.set_title("Renamed");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().metadata.title, "Renamed");
    }
}
