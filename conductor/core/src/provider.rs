//! Transformation Provider Facade
//!
//! One `execute` call over an ordered chain of backends:
//!
//! ```text
//! request
//!    |
//!    v
//! prompt backend      -- available?                 --> result
//!    |                   downloadable? advisory, continue
//!    v
//! summarizer backend  -- summarize only; available
//!    |                   or downloadable (pulls)     --> result
//!    v
//! heuristic backend   -- only when no prompt backend
//!    |                   is configured               --> result
//!    v
//! ProviderError::Unavailable
//! ```
//!
//! The first backend that supports the kind and admits its probed status is
//! executed. Its outcome is final: a failure there is reported as
//! [`ProviderError::Backend`] and the chain does not continue.

use thiserror::Error;

use crate::backend::{
    CapabilityStatus, HeuristicBackend, OllamaClient, OllamaSettings, PromptBackend,
    ProviderEvent, ProviderEvents, SummarizerBackend, TransformBackend,
};
use crate::config::InklensConfig;
use crate::request::TransformationRequest;

/// Advisory emitted when a backend needs a download it will not start itself
pub const DOWNLOAD_ADVISORY: &str = "Preparing on-device model (download required)…";

/// Errors from the provider facade
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No backend in the chain could take the request
    #[error("no transformation backend is available")]
    Unavailable,

    /// The selected backend failed
    #[error("{backend} backend failed: {message}")]
    Backend {
        /// Name of the backend that failed
        backend: String,
        /// Error description
        message: String,
    },
}

/// Ordered fallback chain of backends
pub struct ProviderFacade {
    chain: Vec<Box<dyn TransformBackend>>,
}

impl ProviderFacade {
    /// Facade over an explicit chain, tried in order
    #[must_use]
    pub fn new(chain: Vec<Box<dyn TransformBackend>>) -> Self {
        Self { chain }
    }

    /// Start building the standard chain
    #[must_use]
    pub fn builder() -> ProviderFacadeBuilder {
        ProviderFacadeBuilder::default()
    }

    /// Build the standard chain from configuration
    #[must_use]
    pub fn from_config(config: &InklensConfig) -> Self {
        let backend = &config.backend;
        let client = OllamaClient::new(OllamaSettings {
            host: backend.host.clone(),
            port: backend.port,
            request_timeout: backend.request_timeout,
            download_timeout: backend.download_timeout,
            allow_download: backend.allow_download,
        });

        let mut builder = Self::builder();
        if backend.enable_prompt {
            builder = builder.primary(PromptBackend::new(
                client.clone(),
                backend.prompt_model.clone(),
            ));
        }
        if backend.enable_summarizer {
            builder = builder.summarizer(SummarizerBackend::new(
                client,
                backend.summarizer_model.clone(),
                config.summarizer,
            ));
        }
        if backend.enable_heuristic {
            builder = builder.legacy(HeuristicBackend::new());
        }
        builder.build()
    }

    /// Backend names in chain order
    #[must_use]
    pub fn backend_names(&self) -> Vec<&str> {
        self.chain.iter().map(|b| b.name()).collect()
    }

    /// Run `request` through the chain
    pub async fn execute(
        &self,
        request: &TransformationRequest,
        events: &ProviderEvents,
    ) -> Result<String, ProviderError> {
        for backend in &self.chain {
            if !backend.supports(request.kind) {
                continue;
            }

            let status = backend.probe().await;
            tracing::debug!(
                backend = %backend.name(),
                kind = %request.kind,
                status = status.description(),
                "Probed backend"
            );

            if backend.admits(status) {
                tracing::info!(backend = %backend.name(), kind = %request.kind, "Executing request");
                return backend.execute(request, events).await.map_err(|e| {
                    tracing::error!(backend = %backend.name(), error = %e, "Backend failed");
                    ProviderError::Backend {
                        backend: backend.name().to_string(),
                        message: e.to_string(),
                    }
                });
            }

            if status == CapabilityStatus::Downloadable {
                let _ = events.send(ProviderEvent::Advisory(DOWNLOAD_ADVISORY.to_string()));
            }
        }

        Err(ProviderError::Unavailable)
    }
}

/// Builder for the standard chain
#[derive(Default)]
pub struct ProviderFacadeBuilder {
    primary: Option<Box<dyn TransformBackend>>,
    summarizer: Option<Box<dyn TransformBackend>>,
    legacy: Option<Box<dyn TransformBackend>>,
}

impl ProviderFacadeBuilder {
    /// Primary prompt-style backend
    #[must_use]
    pub fn primary(mut self, backend: impl TransformBackend + 'static) -> Self {
        self.primary = Some(Box::new(backend));
        self
    }

    /// Specialised summarization backend
    #[must_use]
    pub fn summarizer(mut self, backend: impl TransformBackend + 'static) -> Self {
        self.summarizer = Some(Box::new(backend));
        self
    }

    /// Last-resort backend, used only when no primary is configured
    #[must_use]
    pub fn legacy(mut self, backend: impl TransformBackend + 'static) -> Self {
        self.legacy = Some(Box::new(backend));
        self
    }

    /// Assemble the chain: primary, summarizer, then legacy if there is no
    /// primary
    #[must_use]
    pub fn build(self) -> ProviderFacade {
        let has_primary = self.primary.is_some();
        let legacy = self.legacy.filter(|_| !has_primary);
        let chain = [self.primary, self.summarizer, legacy]
            .into_iter()
            .flatten()
            .collect();
        ProviderFacade::new(chain)
    }
}
