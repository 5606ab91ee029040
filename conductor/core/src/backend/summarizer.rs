//! Summarizer Backend
//!
//! A dedicated summarization model. It handles the summarize kind only and,
//! unlike the prompt backend, is worth constructing even when its model
//! still has to be downloaded: the download streams progress to the caller.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ollama::{GenerateRequest, OllamaClient};
use super::traits::{CapabilityStatus, ProviderEvents, TransformBackend};
use crate::request::{TransformKind, TransformationRequest};

/// Shape of the summary
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryType {
    /// The most important points as a list
    #[default]
    KeyPoints,
    /// A short overview
    Tldr,
    /// An intriguing teaser
    Teaser,
    /// A single headline
    Headline,
}

/// Output format
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryFormat {
    /// Markdown
    #[default]
    Markdown,
    /// Plain text
    PlainText,
}

/// Output length
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryLength {
    /// Short
    Short,
    /// Medium
    #[default]
    Medium,
    /// Long
    Long,
}

/// Summarizer construction options
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerOptions {
    /// Summary shape
    #[serde(rename = "type")]
    pub summary_type: SummaryType,
    /// Output format
    pub format: SummaryFormat,
    /// Output length
    pub length: SummaryLength,
}

impl SummarizerOptions {
    /// Instruction describing these options
    #[must_use]
    pub fn instruction(&self) -> String {
        let count = match self.length {
            SummaryLength::Short => 3,
            SummaryLength::Medium => 5,
            SummaryLength::Long => 7,
        };
        let shape = match self.summary_type {
            SummaryType::KeyPoints => format!("the {count} most important key points as a list"),
            SummaryType::Tldr => format!("a TL;DR of at most {count} sentences"),
            SummaryType::Teaser => "a short teaser that makes the reader want more".to_string(),
            SummaryType::Headline => "a single headline".to_string(),
        };
        let format = match self.format {
            SummaryFormat::Markdown => "Use markdown.",
            SummaryFormat::PlainText => "Use plain text without markup.",
        };
        format!("Summarize the text as {shape}. {format}")
    }
}

/// Build the summarization prompt, with optional shared context
#[must_use]
pub fn build_summary_prompt(options: &SummarizerOptions, text: &str, context: Option<&str>) -> String {
    let mut prompt = options.instruction();
    if let Some(context) = context.filter(|c| !c.trim().is_empty()) {
        prompt.push_str("\n\nContext: ");
        prompt.push_str(context.trim());
    }
    prompt.push_str("\n\nText:\n");
    prompt.push_str(text);
    prompt
}

/// Dedicated summarization backend on Ollama
pub struct SummarizerBackend {
    client: OllamaClient,
    model: String,
    options: SummarizerOptions,
}

impl SummarizerBackend {
    /// Create a backend using `model`
    pub fn new(client: OllamaClient, model: impl Into<String>, options: SummarizerOptions) -> Self {
        Self {
            client,
            model: model.into(),
            options,
        }
    }
}

#[async_trait]
impl TransformBackend for SummarizerBackend {
    fn name(&self) -> &str {
        "summarizer"
    }

    fn supports(&self, kind: TransformKind) -> bool {
        kind == TransformKind::Summarize
    }

    fn admits(&self, status: CapabilityStatus) -> bool {
        matches!(
            status,
            CapabilityStatus::Available | CapabilityStatus::Downloadable
        )
    }

    async fn probe(&self) -> CapabilityStatus {
        self.client.model_status(&self.model).await
    }

    async fn execute(
        &self,
        request: &TransformationRequest,
        events: &ProviderEvents,
    ) -> anyhow::Result<String> {
        self.client
            .ensure_model(&self.model, self.name(), events)
            .await?;

        let generate = GenerateRequest {
            model: self.model.clone(),
            prompt: build_summary_prompt(
                &self.options,
                request.input_text(),
                request.context.as_deref(),
            ),
            system: None,
        };
        self.client.generate(&generate).await
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::backend::fake_ollama::{FakeOllama, PullReply};
    use crate::backend::ollama::OllamaSettings;
    use crate::backend::ProviderEvent;

    #[test]
    fn test_default_options_are_key_points_markdown_medium() {
        let options = SummarizerOptions::default();
        assert_eq!(options.summary_type, SummaryType::KeyPoints);
        assert_eq!(options.format, SummaryFormat::Markdown);
        assert_eq!(options.length, SummaryLength::Medium);
        assert_eq!(
            options.instruction(),
            "Summarize the text as the 5 most important key points as a list. Use markdown."
        );
    }

    #[test]
    fn test_context_is_included_when_present() {
        let options = SummarizerOptions::default();
        let prompt = build_summary_prompt(&options, "body", Some(" meeting notes "));
        assert!(prompt.contains("\n\nContext: meeting notes\n\nText:\nbody"));

        let prompt = build_summary_prompt(&options, "body", Some("  "));
        assert!(!prompt.contains("Context"));
    }

    #[test]
    fn test_options_parse_from_toml() {
        let options: SummarizerOptions =
            toml::from_str("type = \"tldr\"\nformat = \"plain-text\"\nlength = \"short\"").unwrap();
        assert_eq!(options.summary_type, SummaryType::Tldr);
        assert_eq!(options.format, SummaryFormat::PlainText);
        assert_eq!(options.length, SummaryLength::Short);
    }

    #[test]
    fn test_summarize_only_and_admits_downloadable() {
        let backend = SummarizerBackend::new(
            OllamaClient::new(OllamaSettings::default()),
            "m",
            SummarizerOptions::default(),
        );
        assert!(backend.supports(TransformKind::Summarize));
        assert!(!backend.supports(TransformKind::Refine));
        assert!(backend.admits(CapabilityStatus::Downloadable));
        assert!(!backend.admits(CapabilityStatus::Unavailable));
    }

    #[tokio::test]
    async fn test_execute_downloads_then_summarizes_with_context() {
        let ndjson = concat!(
            "{\"status\":\"pulling abc\",\"total\":4,\"completed\":2}\n",
            "{\"status\":\"success\"}\n",
        );
        let server = FakeOllama::start(PullReply::Stream(ndjson), "- the point").await;
        let backend = SummarizerBackend::new(
            server.client(OllamaSettings::default()),
            "tiny",
            SummarizerOptions::default(),
        );
        let request = TransformationRequest::new(TransformKind::Summarize, " long text ")
            .unwrap()
            .with_context("meeting notes");
        let (tx, mut rx) = mpsc::unbounded_channel();

        assert_eq!(backend.probe().await, CapabilityStatus::Downloadable);
        let summary = backend.execute(&request, &tx).await.unwrap();

        assert_eq!(summary, "- the point");
        assert_eq!(
            rx.try_recv().unwrap(),
            ProviderEvent::DownloadProgress {
                backend: "summarizer".to_string(),
                fraction: 0.5,
            }
        );
        assert_eq!(
            server.paths(),
            vec!["/api/tags", "/api/tags", "/api/pull", "/api/generate"]
        );
        let generate: serde_json::Value =
            serde_json::from_str(&server.body_of("/api/generate").unwrap()).unwrap();
        assert_eq!(generate["model"], "tiny");
        let prompt = generate["prompt"].as_str().unwrap();
        assert!(prompt.contains("Context: meeting notes"));
        assert!(prompt.ends_with("Text:\nlong text"));
    }
}
