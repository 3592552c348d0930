//! The text-rewriting collaborator behind polish requests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PolishMode {
    Polish,
    Expand,
    Simplify,
    Format,
}

impl PolishMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolishMode::Polish => "polish",
            PolishMode::Expand => "expand",
            PolishMode::Simplify => "simplify",
            PolishMode::Format => "format",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolishRequest {
    pub mode: PolishMode,
    pub content: String,
    /// Label of the field being rewritten, e.g. "Work Experience / description".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("Text provider failed: {0}")]
    Provider(String),
}

/// Streams rewritten text for a request. Each chunk is sent on `chunks` as it
/// becomes available; returning `Ok` signals completion, `Err` a failure.
#[async_trait]
pub trait TextTransform: Send + Sync {
    async fn transform(
        &self,
        request: PolishRequest,
        chunks: mpsc::Sender<String>,
    ) -> Result<(), TransformError>;
}
