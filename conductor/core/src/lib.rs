//! InkLens Core - Headless Text-Assistant Orchestration
//!
//! This crate holds everything InkLens does, independent of any UI
//! framework: the backend fallback chain, the request orchestrator, session
//! persistence, and tab state. A surface (the TUI, or a test) forwards user
//! actions and renders what it is told.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         UI Surface                           │
//! │            (ratatui TUI, headless tests, ...)                │
//! └───────────────┬──────────────────────────────▲───────────────┘
//!                 │ SurfaceEvent (up)            │ ViewMessage (down)
//! ┌───────────────▼──────────────────────────────┴───────────────┐
//! │                        Orchestrator                          │
//! │  ┌──────────┐  ┌──────────┐  ┌───────────┐  ┌──────────────┐ │
//! │  │ BusyGate │  │ Session  │  │    Tab    │  │  Clipboard   │ │
//! │  │          │  │Controller│  │Controller │  │    Chain     │ │
//! │  └──────────┘  └────┬─────┘  └───────────┘  └──────────────┘ │
//! │                     │ KeyValueStore                          │
//! │  ┌──────────────────▼───────────────────────────────────────┐ │
//! │  │ ProviderFacade: prompt -> summarizer -> heuristic        │ │
//! │  └──────────────────────────────────────────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Orchestrator`]: runs transformations and owns the session
//! - [`ViewMessage`]: messages sent to the surface
//! - [`SurfaceEvent`]: events sent from the surface
//! - [`ProviderFacade`]: ordered backend fallback chain
//! - [`SessionController`]: in-memory session with write-through storage
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use inklens_core::{
//!     load_config, ClipboardChain, FileStore, NoClipboard, Orchestrator, ProviderFacade,
//!     TransformKind,
//! };
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     let (tx, mut rx) = mpsc::channel(100);
//!     let store = FileStore::default_location().expect("data dir");
//!
//!     let orchestrator = Orchestrator::new(
//!         ProviderFacade::from_config(&config),
//!         Arc::new(store),
//!         ClipboardChain::new(NoClipboard),
//!         tx,
//!     );
//!     orchestrator.start().await;
//!     orchestrator.handle(TransformKind::Summarize, "Some long text.").await;
//!
//!     while let Ok(msg) = rx.try_recv() {
//!         println!("{msg:?}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # No TUI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any other
//! UI framework.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod clipboard;
pub mod config;
pub mod events;
pub mod gate;
pub mod messages;
pub mod orchestrator;
pub mod provider;
pub mod request;
pub mod session;
pub mod storage;
pub mod tabs;

// Re-exports for convenience
pub use backend::{
    CapabilityStatus, HeuristicBackend, OllamaClient, OllamaSettings, PromptBackend,
    ProviderEvent, ProviderEvents, SummarizerBackend, SummarizerOptions, TransformBackend,
};
pub use clipboard::{Clipboard, ClipboardChain, ClipboardError, NoClipboard};
pub use events::SurfaceEvent;
pub use gate::{BusyGate, BusyPermit};
pub use messages::{StatusLevel, Tab, TabState, ViewMessage};
pub use orchestrator::{Orchestrator, DEFAULT_AUTOSAVE_DELAY, UNAVAILABLE_STATUS};
pub use provider::{ProviderError, ProviderFacade, ProviderFacadeBuilder, DOWNLOAD_ADVISORY};
pub use request::{TransformKind, TransformationRequest, ValidationError};
pub use session::{Debounce, Outputs, SessionController, SessionPatch, SessionState};
pub use storage::{FileStore, KeyValueStore, MemoryStore, PersistenceError};
pub use tabs::TabController;

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, BackendConfig, ConfigError,
    ConfigOverrides, ConfigSource, ConfigToml, InklensConfig,
};
