//! Transformation Requests
//!
//! A request is built once per user action, handed to the provider facade,
//! and dropped when the call settles. Nothing here is ever persisted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::messages::Tab;

/// The three transformations a user can trigger
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformKind {
    /// Condense the input into a short bullet summary
    Summarize,
    /// Rewrite the input as action-focused bullets
    Refine,
    /// Fix grammar and clarity, keeping meaning and tone
    Proofread,
}

impl TransformKind {
    /// All kinds, in button order
    pub const ALL: [TransformKind; 3] = [Self::Summarize, Self::Refine, Self::Proofread];

    /// Stable lowercase name (used in messages and logs)
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summarize => "summarize",
            Self::Refine => "refine",
            Self::Proofread => "proofread",
        }
    }

    /// The result tab this kind writes into
    #[must_use]
    pub fn tab(&self) -> Tab {
        match self {
            Self::Summarize => Tab::Summary,
            Self::Refine => Tab::Bullets,
            Self::Proofread => Tab::Proofread,
        }
    }

    /// Status text shown while a request of this kind is in flight
    #[must_use]
    pub fn progress_label(&self) -> &'static str {
        match self {
            Self::Summarize => "Summarizing...",
            Self::Refine => "Generating 5 bullets...",
            Self::Proofread => "Proofreading...",
        }
    }
}

impl std::fmt::Display for TransformKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input rejected before a request could be built
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Input was empty or whitespace only
    #[error("Please paste some text first.")]
    EmptyInput,
}

/// A single transformation request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransformationRequest {
    /// Which transformation to run
    pub kind: TransformKind,
    /// Trimmed, non-empty input text
    input_text: String,
    /// Auxiliary hint for backends that accept one
    pub context: Option<String>,
}

impl TransformationRequest {
    /// Build a request, trimming the input.
    ///
    /// Fails with [`ValidationError::EmptyInput`] when nothing but
    /// whitespace remains.
    pub fn new(kind: TransformKind, raw_text: &str) -> Result<Self, ValidationError> {
        let trimmed = raw_text.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyInput);
        }
        Ok(Self {
            kind,
            input_text: trimmed.to_string(),
            context: None,
        })
    }

    /// Attach a context hint
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// The trimmed input
    #[must_use]
    pub fn input_text(&self) -> &str {
        &self.input_text
    }
}
