//! Polish state machine: `Idle -> Polishing -> (Accepted | Rejected) -> Idle`.
//!
//! Every `start` bumps a generation counter. Chunk, finish and failure events
//! carry the generation they belong to and are ignored unless it is the
//! current one and a stream is still open, so an abandoned stream can never
//! write into a newer request.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::items::FieldError;
use crate::models::resume::SectionType;
use crate::polish::transform::PolishMode;
use crate::sections::staging::StagingError;

/// The document field a polish request reads from and writes back to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolishTarget {
    Summary,
    Item {
        section_type: SectionType,
        item_id: String,
        field: String,
    },
    Staged {
        staged_id: String,
        field: String,
    },
}

impl PolishTarget {
    /// Human-readable label handed to the text provider as context.
    pub fn label(&self) -> String {
        match self {
            PolishTarget::Summary => "personal summary".to_string(),
            PolishTarget::Item {
                section_type, field, ..
            } => format!("{} / {field}", section_type.default_title()),
            PolishTarget::Staged { field, .. } => field.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PolishError {
    #[error("A polish request is already streaming")]
    Busy,

    #[error("The polish result is still streaming")]
    StillStreaming,

    #[error("No polish result to accept")]
    NothingToAccept,

    #[error("Polish target not found: {0}")]
    TargetMissing(String),

    #[error("Field '{0}' does not hold text")]
    NotText(String),

    #[error("Polishing is unavailable: no text provider is configured")]
    Unavailable,

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error(transparent)]
    Field(#[from] FieldError),
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolishState {
    pub is_polishing: bool,
    pub current_mode: Option<PolishMode>,
    pub original_content: String,
    pub polished_content: String,
    pub show_compare: bool,
    pub target: Option<PolishTarget>,
    pub generation: u64,
}

#[derive(Debug, Default)]
pub struct PolishOrchestrator {
    state: PolishState,
}

impl PolishOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PolishState {
        &self.state
    }

    /// Opens the compare view for a new request and returns its generation.
    /// A finished but undecided result is discarded; a running stream is not.
    pub fn start(
        &mut self,
        mode: PolishMode,
        target: PolishTarget,
        original: String,
    ) -> Result<u64, PolishError> {
        if self.state.is_polishing {
            return Err(PolishError::Busy);
        }
        let generation = self.state.generation + 1;
        self.state = PolishState {
            is_polishing: true,
            current_mode: Some(mode),
            original_content: original,
            polished_content: String::new(),
            show_compare: true,
            target: Some(target),
            generation,
        };
        Ok(generation)
    }

    fn is_live(&self, generation: u64) -> bool {
        self.state.is_polishing && self.state.generation == generation
    }

    /// Appends a streamed chunk. Returns `false` if the chunk is stale.
    pub fn append_chunk(&mut self, generation: u64, chunk: &str) -> bool {
        if !self.is_live(generation) {
            return false;
        }
        self.state.polished_content.push_str(chunk);
        true
    }

    /// Ends the stream; the compare view stays open for a decision.
    pub fn finish(&mut self, generation: u64) -> bool {
        if !self.is_live(generation) {
            return false;
        }
        self.state.is_polishing = false;
        true
    }

    /// Ends the stream with an inline error marker. `original_content` is untouched.
    pub fn fail(&mut self, generation: u64, message: &str) -> bool {
        if !self.is_live(generation) {
            return false;
        }
        self.state
            .polished_content
            .push_str(&format!("\n\n❌ Error: {message}"));
        self.state.is_polishing = false;
        true
    }

    /// The target and text an accept would write.
    pub fn candidate(&self) -> Result<(PolishTarget, String), PolishError> {
        if self.state.is_polishing {
            return Err(PolishError::StillStreaming);
        }
        match (&self.state.target, self.state.show_compare) {
            (Some(target), true) => Ok((target.clone(), self.state.polished_content.clone())),
            _ => Err(PolishError::NothingToAccept),
        }
    }

    /// Discards the result and returns to idle. Closing while streaming is
    /// allowed and behaves the same. Returns `false` when already idle.
    pub fn reject(&mut self) -> bool {
        if !self.state.show_compare {
            return false;
        }
        self.close();
        true
    }

    /// Returns to idle, keeping the generation counter.
    pub fn close(&mut self) {
        self.state = PolishState {
            generation: self.state.generation,
            ..PolishState::default()
        };
    }
}
