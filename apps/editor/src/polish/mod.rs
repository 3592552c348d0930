// Polish: the rewrite state machine, the service wiring it to the document,
// and the text-provider seam.

pub mod handlers;
pub mod orchestrator;
pub mod prompts;
pub mod service;
pub mod transform;
