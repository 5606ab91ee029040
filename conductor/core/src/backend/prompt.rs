//! Prompt Backend
//!
//! The primary backend: a general-purpose language model driven by a
//! kind-specific instruction. Only runs when the model is ready right now;
//! a model that still needs downloading is reported as an advisory by the
//! facade and the chain moves on.

use async_trait::async_trait;

use super::ollama::{GenerateRequest, OllamaClient};
use super::traits::{CapabilityStatus, ProviderEvents, TransformBackend};
use crate::request::{TransformKind, TransformationRequest};

/// Languages a prompt session reads and writes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionOptions {
    /// Expected input languages (BCP 47 tags)
    pub input_languages: Vec<String>,
    /// Expected output languages (BCP 47 tags)
    pub output_languages: Vec<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            input_languages: vec!["en".to_string()],
            output_languages: vec!["en".to_string()],
        }
    }
}

impl SessionOptions {
    /// System prompt carrying the language expectations
    #[must_use]
    pub fn system_prompt(&self) -> String {
        format!(
            "You are a writing assistant. The input is written in: {}. Respond only in: {}.",
            self.input_languages.join(", "),
            self.output_languages.join(", ")
        )
    }
}

/// Kind-specific instruction followed by the input
#[must_use]
pub fn build_prompt(kind: TransformKind, text: &str) -> String {
    let instruction = match kind {
        TransformKind::Summarize => "Summarize the input into 5 concise markdown bullet points.",
        TransformKind::Refine => {
            "Rewrite the input as 5 crisp, action-focused bullets (keep key entities, \
             numbers, and dates). Output markdown bullets only."
        }
        TransformKind::Proofread => {
            "Proofread the input. Fix grammar/clarity, keep meaning and tone. \
             Return corrected text only."
        }
    };
    format!("{instruction}\n\nInput:\n{text}")
}

/// General-purpose prompt backend on Ollama
pub struct PromptBackend {
    client: OllamaClient,
    model: String,
    options: SessionOptions,
}

impl PromptBackend {
    /// Create a backend using `model`
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            options: SessionOptions::default(),
        }
    }

    /// Override the language expectations
    #[must_use]
    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    /// Model identifier
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TransformBackend for PromptBackend {
    fn name(&self) -> &str {
        "prompt"
    }

    async fn probe(&self) -> CapabilityStatus {
        self.client.model_status(&self.model).await
    }

    async fn execute(
        &self,
        request: &TransformationRequest,
        _events: &ProviderEvents,
    ) -> anyhow::Result<String> {
        let generate = GenerateRequest {
            model: self.model.clone(),
            prompt: build_prompt(request.kind, request.input_text()),
            system: Some(self.options.system_prompt()),
        };
        self.client.generate(&generate).await
    }
}
