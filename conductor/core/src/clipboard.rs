//! Clipboard Capability
//!
//! The orchestrator copies through a [`ClipboardChain`]: the primary
//! clipboard first, then an optional fallback when the primary fails.
//! Concrete clipboards live in the surface crates.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a clipboard write
#[derive(Debug, Error)]
pub enum ClipboardError {
    /// No clipboard mechanism is usable here
    #[error("no clipboard available")]
    NoClipboard,

    /// A clipboard helper program failed
    #[error("clipboard command '{command}' failed: {message}")]
    Command {
        /// Program that was run
        command: String,
        /// Error description
        message: String,
    },

    /// Writing to the clipboard sink failed
    #[error("clipboard write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A place text can be copied to
#[async_trait]
pub trait Clipboard: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &str;

    /// Replace the clipboard contents with `text`
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Primary clipboard with an optional fallback
pub struct ClipboardChain {
    primary: Box<dyn Clipboard>,
    fallback: Option<Box<dyn Clipboard>>,
}

impl ClipboardChain {
    /// Chain with only a primary clipboard
    pub fn new(primary: impl Clipboard + 'static) -> Self {
        Self {
            primary: Box::new(primary),
            fallback: None,
        }
    }

    /// Add a fallback tried when the primary fails
    #[must_use]
    pub fn with_fallback(mut self, fallback: impl Clipboard + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// Copy `text`, falling back once on failure
    pub async fn copy(&self, text: &str) -> Result<(), ClipboardError> {
        match self.primary.write_text(text).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let Some(ref fallback) = self.fallback else {
                    return Err(e);
                };
                tracing::warn!(
                    clipboard = %self.primary.name(),
                    fallback = %fallback.name(),
                    error = %e,
                    "Clipboard write failed, trying fallback"
                );
                fallback.write_text(text).await
            }
        }
    }
}

/// Clipboard that always fails; used when nothing else is configured
#[derive(Clone, Copy, Debug, Default)]
pub struct NoClipboard;

#[async_trait]
impl Clipboard for NoClipboard {
    fn name(&self) -> &str {
        "none"
    }

    async fn write_text(&self, _text: &str) -> Result<(), ClipboardError> {
        Err(ClipboardError::NoClipboard)
    }
}
