// Document store: the single source of truth for the resume, its derived
// views, healing of untrusted input and the completeness summary.

pub mod completeness;
pub mod handlers;
pub mod heal;
pub mod store;
