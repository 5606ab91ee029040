//! InkLens TUI - Terminal interface for InkLens
//!
//! A thin surface over `inklens-core`: it turns key presses into
//! `SurfaceEvent`s and renders the `ViewMessage`s it gets back.
//!
//! # Architecture
//!
//! - **App**: event loop, key mapping, rendering
//! - **Display**: state derived from view messages
//! - **Clipboard**: system-command clipboard with an OSC 52 fallback
//! - **Theme**: colours

pub mod app;
pub mod clipboard;
pub mod display;
pub mod theme;

pub use app::App;
