//! View Messages
//!
//! Messages sent from the orchestrator to a UI surface. The surface holds no
//! business logic: it renders the status line, enables or disables its
//! action controls from the busy flag, and shows whatever tab content it is
//! told about.

use serde::{Deserialize, Serialize};

/// Messages from the orchestrator to the UI surface
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewMessage {
    /// Replace the status line
    Status {
        /// Status text
        text: String,
        /// Severity, used for colouring
        level: StatusLevel,
    },

    /// Busy flag changed; every action control follows it
    Busy {
        /// Whether a transformation is in flight
        busy: bool,
    },

    /// The active tab changed
    TabActivated {
        /// The tab that is now active
        active: Tab,
        /// Selection flags for all three tabs, in display order
        tabs: [TabState; 3],
    },

    /// A tab's backing text changed
    OutputUpdated {
        /// Which tab
        tab: Tab,
        /// New content
        content: String,
    },

    /// Raw input restored from a previous session
    InputRestored {
        /// Restored text
        text: String,
    },

    /// Input validation failed (surface shows its invalid-input cue)
    InputInvalid,

    /// Input is valid again (surface drops the invalid-input cue)
    InputAccepted,

    /// The raw input was cleared
    InputCleared,
}

/// Status severity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    /// Informational
    Info,
    /// Success
    Success,
    /// Error
    Error,
}

/// Result tabs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    /// Summary output
    #[default]
    Summary,
    /// Action bullets output
    Bullets,
    /// Proofread output
    Proofread,
}

impl Tab {
    /// All tabs in display order
    pub const ALL: [Tab; 3] = [Self::Summary, Self::Bullets, Self::Proofread];

    /// Stable lowercase name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Bullets => "bullets",
            Self::Proofread => "proofread",
        }
    }

    /// Tab heading
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Summary => "Summary",
            Self::Bullets => "Bullets",
            Self::Proofread => "Proofread",
        }
    }

    /// Next tab, wrapping around
    #[must_use]
    pub fn next(&self) -> Self {
        match self {
            Self::Summary => Self::Bullets,
            Self::Bullets => Self::Proofread,
            Self::Proofread => Self::Summary,
        }
    }

    /// Previous tab, wrapping around
    #[must_use]
    pub fn previous(&self) -> Self {
        match self {
            Self::Summary => Self::Proofread,
            Self::Bullets => Self::Summary,
            Self::Proofread => Self::Bullets,
        }
    }
}

impl std::fmt::Display for Tab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selection state of one tab
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabState {
    /// Which tab
    pub tab: Tab,
    /// Whether it is the selected one
    pub selected: bool,
}
