//! Transformation Backends
//!
//! Backends are the concrete text-transformation capabilities behind the
//! provider facade. Each one can be probed for readiness and executed.
//!
//! # Available Backends
//!
//! - **Prompt**: general-purpose model on a local Ollama server (primary)
//! - **Summarizer**: dedicated summarization model, may download on demand
//! - **Heuristic**: deterministic offline fallback
//!
//! # Usage
//!
//! ```ignore
//! use inklens_core::backend::{OllamaClient, OllamaSettings, PromptBackend, TransformBackend};
//!
//! let client = OllamaClient::new(OllamaSettings::default());
//! let backend = PromptBackend::new(client, "llama3.2");
//! let status = backend.probe().await;
//! ```

mod fake_ollama;
mod heuristic;
mod ollama;
mod prompt;
mod summarizer;
mod traits;

pub use heuristic::HeuristicBackend;
pub use ollama::{GenerateRequest, OllamaClient, OllamaSettings};
pub use prompt::{build_prompt, PromptBackend, SessionOptions};
pub use summarizer::{
    build_summary_prompt, SummarizerBackend, SummarizerOptions, SummaryFormat, SummaryLength,
    SummaryType,
};
pub use traits::{CapabilityStatus, ProviderEvent, ProviderEvents, TransformBackend};
