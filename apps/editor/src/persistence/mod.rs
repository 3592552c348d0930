pub mod autosave;
pub mod handlers;
pub mod kv;
pub mod transfer;
