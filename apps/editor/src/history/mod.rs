pub mod handlers;
pub mod versions;
