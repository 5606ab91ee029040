//! Surface Events
//!
//! Events sent from a UI surface to the orchestrator. Surfaces report what
//! the user did; the orchestrator decides what it means.

use serde::{Deserialize, Serialize};

use crate::messages::Tab;
use crate::request::TransformKind;

/// Events from UI surface to orchestrator
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceEvent {
    // ============================================
    // Input
    // ============================================
    /// The raw input text changed
    InputChanged {
        /// Full current text
        text: String,
    },

    // ============================================
    // Actions
    // ============================================
    /// Run a transformation on the given text
    Transform {
        /// Which transformation
        kind: TransformKind,
        /// Raw input at the time of the request
        text: String,
    },

    /// Clear input and every output
    Clear,

    /// Persist the whole session now
    Save,

    /// Copy the active tab's content
    CopyActive,

    /// Switch tabs
    SelectTab {
        /// Tab to show
        tab: Tab,
    },

    // ============================================
    // Lifecycle
    // ============================================
    /// The surface is shutting down
    Quit,
}

impl SurfaceEvent {
    /// Whether handling this event may await a backend
    #[must_use]
    pub fn is_long_running(&self) -> bool {
        matches!(self, Self::Transform { .. })
    }
}
