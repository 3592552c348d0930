use uuid::Uuid;

/// Allocates a fresh identifier for any document entity (items, social links,
/// version snapshots, documents). Identifiers are never reused.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
