//! Ollama Client
//!
//! Thin HTTP client for a local Ollama server, shared by the prompt and
//! summarizer backends.
//!
//! # Ollama API
//!
//! - `/api/tags` - List pulled models (used for availability probes)
//! - `/api/generate` - Non-streaming completion
//! - `/api/pull` - Download a model; streams newline-delimited JSON progress

use std::time::Duration;

use futures::StreamExt;

use super::traits::{CapabilityStatus, ProviderEvent, ProviderEvents};

/// Connection settings for an Ollama server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OllamaSettings {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Timeout for generate calls
    pub request_timeout: Duration,
    /// Upper bound on a model download
    pub download_timeout: Duration,
    /// Whether a missing model may be pulled on demand
    pub allow_download: bool,
}

impl Default for OllamaSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 11434,
            request_timeout: Duration::from_secs(120),
            download_timeout: Duration::from_secs(1800),
            allow_download: true,
        }
    }
}

/// A single completion call
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerateRequest {
    /// Model identifier
    pub model: String,
    /// Prompt text
    pub prompt: String,
    /// System prompt
    pub system: Option<String>,
}

/// Ollama HTTP client
#[derive(Clone, Debug)]
pub struct OllamaClient {
    settings: OllamaSettings,
    http_client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client
    #[must_use]
    pub fn new(settings: OllamaSettings) -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self {
            settings,
            http_client,
        }
    }

    /// Connection settings
    #[must_use]
    pub fn settings(&self) -> &OllamaSettings {
        &self.settings
    }

    /// Get the base URL
    fn base_url(&self) -> String {
        format!("http://{}:{}", self.settings.host, self.settings.port)
    }

    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url())
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url())
    }

    fn pull_url(&self) -> String {
        format!("{}/api/pull", self.base_url())
    }

    /// Names of the models the server has pulled
    pub async fn list_models(&self) -> anyhow::Result<Vec<String>> {
        let response = self
            .http_client
            .get(self.tags_url())
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {status}: {body}");
        }

        let data: serde_json::Value = response.json().await?;

        let models = data
            .get("models")
            .and_then(|m| m.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|m| Some(m.get("name")?.as_str()?.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }

    /// Readiness of `model` on this server. Never fails.
    pub async fn model_status(&self, model: &str) -> CapabilityStatus {
        match self.list_models().await {
            Ok(models) if models.iter().any(|m| model_matches(m, model)) => {
                CapabilityStatus::Available
            }
            Ok(_) if self.settings.allow_download => CapabilityStatus::Downloadable,
            Ok(_) => {
                tracing::debug!(model = %model, "Model not pulled and downloads disabled");
                CapabilityStatus::Unavailable
            }
            Err(e) => {
                tracing::debug!(model = %model, error = %e, "Ollama probe failed");
                CapabilityStatus::Unavailable
            }
        }
    }

    /// Run a completion and return the response text
    pub async fn generate(&self, request: &GenerateRequest) -> anyhow::Result<String> {
        let mut json_request = serde_json::json!({
            "model": request.model,
            "prompt": request.prompt,
            "stream": false,
        });
        if let Some(ref system) = request.system {
            json_request["system"] = serde_json::json!(system);
        }

        let response = self
            .http_client
            .post(self.generate_url())
            .timeout(self.settings.request_timeout)
            .json(&json_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama returned {status}: {body}");
        }

        let data: serde_json::Value = response.json().await?;
        if let Some(error) = data.get("error").and_then(|e| e.as_str()) {
            anyhow::bail!("Ollama error: {error}");
        }

        Ok(data
            .get("response")
            .and_then(|r| r.as_str())
            .unwrap_or("")
            .to_string())
    }

    /// Make sure `model` is present, pulling it if needed.
    ///
    /// Download progress is reported on `events` as it arrives. The whole
    /// download is bounded by the configured download timeout.
    pub async fn ensure_model(
        &self,
        model: &str,
        backend: &str,
        events: &ProviderEvents,
    ) -> anyhow::Result<()> {
        if self.model_status(model).await == CapabilityStatus::Available {
            return Ok(());
        }

        tracing::info!(model = %model, backend = %backend, "Pulling model");
        match tokio::time::timeout(
            self.settings.download_timeout,
            self.pull(model, backend, events),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => anyhow::bail!(
                "Download of {model} did not finish within {:?}",
                self.settings.download_timeout
            ),
        }
    }

    async fn pull(&self, model: &str, backend: &str, events: &ProviderEvents) -> anyhow::Result<()> {
        let response = self
            .http_client
            .post(self.pull_url())
            .json(&serde_json::json!({ "model": model, "stream": true }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Ollama pull returned {status}: {body}");
        }

        let mut stream = response.bytes_stream();
        let mut buffer = String::new();

        while let Some(chunk) = stream.next().await {
            buffer.push_str(&String::from_utf8_lossy(&chunk?));

            // Parse newline-delimited JSON
            while let Some(pos) = buffer.find('\n') {
                let line = buffer[..pos].trim().to_string();
                buffer.drain(..=pos);
                match parse_pull_line(&line) {
                    PullUpdate::Progress(fraction) => {
                        let _ = events.send(ProviderEvent::DownloadProgress {
                            backend: backend.to_string(),
                            fraction,
                        });
                    }
                    PullUpdate::Success => return Ok(()),
                    PullUpdate::Failed(error) => anyhow::bail!("Model download failed: {error}"),
                    PullUpdate::Status(status) => {
                        tracing::debug!(model = %model, status = %status, "Pull status");
                    }
                    PullUpdate::Ignored => {}
                }
            }
        }

        match parse_pull_line(buffer.trim()) {
            PullUpdate::Success => Ok(()),
            PullUpdate::Failed(error) => anyhow::bail!("Model download failed: {error}"),
            _ => anyhow::bail!("Model download ended without a success signal"),
        }
    }
}

/// One line of `/api/pull` output
#[derive(Clone, Debug, PartialEq)]
enum PullUpdate {
    Progress(f64),
    Status(String),
    Success,
    Failed(String),
    Ignored,
}

fn parse_pull_line(line: &str) -> PullUpdate {
    if line.is_empty() {
        return PullUpdate::Ignored;
    }
    let Ok(data) = serde_json::from_str::<serde_json::Value>(line) else {
        return PullUpdate::Ignored;
    };

    if let Some(error) = data.get("error").and_then(|e| e.as_str()) {
        return PullUpdate::Failed(error.to_string());
    }

    let total = data.get("total").and_then(serde_json::Value::as_u64);
    let completed = data.get("completed").and_then(serde_json::Value::as_u64);
    if let (Some(total), Some(completed)) = (total, completed) {
        if total > 0 {
            #[allow(clippy::cast_precision_loss)]
            return PullUpdate::Progress(completed as f64 / total as f64);
        }
    }

    match data.get("status").and_then(|s| s.as_str()) {
        Some("success") => PullUpdate::Success,
        Some(status) => PullUpdate::Status(status.to_string()),
        None => PullUpdate::Ignored,
    }
}

/// Whether a listed model name satisfies a configured one
/// (`llama3.2` matches `llama3.2:latest`)
fn model_matches(listed: &str, wanted: &str) -> bool {
    if listed == wanted {
        return true;
    }
    !wanted.contains(':') && listed.strip_suffix(":latest") == Some(wanted)
}
