//! Transformation Backend Traits
//!
//! Every backend in the fallback chain implements [`TransformBackend`]. The
//! provider facade only talks to this trait: it probes, checks whether the
//! backend admits the probed status, and executes.
//!
//! Backends report progress (model downloads, advisories) on a
//! [`ProviderEvents`] channel that is separate from the result, so progress
//! never waits on completion.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::request::{TransformKind, TransformationRequest};

/// Readiness of a backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityStatus {
    /// Usable immediately
    Available,
    /// Usable after an on-demand model download
    Downloadable,
    /// Not usable
    Unavailable,
}

impl CapabilityStatus {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Downloadable => "download required",
            Self::Unavailable => "unavailable",
        }
    }
}

/// Progress events emitted while a request runs
#[derive(Clone, Debug, PartialEq)]
pub enum ProviderEvent {
    /// Non-fatal notice (the chain keeps going)
    Advisory(String),
    /// Model download progress
    DownloadProgress {
        /// Backend doing the download
        backend: String,
        /// Fraction complete, 0.0..=1.0
        fraction: f64,
    },
}

impl ProviderEvent {
    /// Status-line text for this event
    #[must_use]
    pub fn status_text(&self) -> String {
        match self {
            Self::Advisory(text) => text.clone(),
            Self::DownloadProgress { fraction, .. } => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u8;
                format!("Downloading on-device model… {percent}%")
            }
        }
    }
}

/// Sender side of the progress channel
pub type ProviderEvents = mpsc::UnboundedSender<ProviderEvent>;

/// Transformation backend
///
/// Implement this trait to add a new path to the fallback chain.
#[async_trait]
pub trait TransformBackend: Send + Sync {
    /// Backend name for logs and progress events
    fn name(&self) -> &str;

    /// Whether this backend can handle `kind` at all
    fn supports(&self, kind: TransformKind) -> bool {
        let _ = kind;
        true
    }

    /// Whether a probed status is good enough to run this backend now
    fn admits(&self, status: CapabilityStatus) -> bool {
        status == CapabilityStatus::Available
    }

    /// Query readiness. Must not fail: faults map to
    /// [`CapabilityStatus::Unavailable`].
    async fn probe(&self) -> CapabilityStatus;

    /// Run the transformation and return the result text verbatim
    async fn execute(
        &self,
        request: &TransformationRequest,
        events: &ProviderEvents,
    ) -> anyhow::Result<String>;
}
