//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles:
//! - The core crate never depends on a terminal UI framework
//! - Production code propagates errors instead of unwrapping
//! - Production code never blocks the runtime with `std::thread::sleep`
//! - Async code never does blocking file, network or process I/O
//!
//! These tests are designed to catch violations early in the development cycle.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Workspace root, two levels above this crate
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .ancestors()
        .nth(2)
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
}

/// Rust sources under `dir`, relative to the workspace root
#[must_use]
pub fn rust_sources(dir: &str) -> Vec<PathBuf> {
    WalkDir::new(workspace_root().join(dir))
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| path.extension().is_some_and(|ext| ext == "rs"))
        .collect()
}

/// The part of a source file before its `#[cfg(test)]` module.
///
/// A file gated as a whole with `#![cfg(test)]` has no production part.
#[must_use]
pub fn production_part(source: &str) -> &str {
    if source.contains("#![cfg(test)]") {
        return "";
    }
    source
        .find("#[cfg(test)]")
        .map_or(source, |idx| &source[..idx])
}

/// Lines of `source` that are not comments
pub fn code_lines(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim_start().starts_with("//"))
}

/// Signature line of the function enclosing line `idx` (0-based), if any.
///
/// Walks back to the nearest `fn` signature. Good enough for rustfmt'd code
/// with no nested functions.
#[must_use]
pub fn enclosing_fn<'a>(lines: &[&'a str], idx: usize) -> Option<&'a str> {
    lines[..=idx.min(lines.len().saturating_sub(1))]
        .iter()
        .rev()
        .map(|line| line.trim())
        .filter(|line| !line.starts_with("//"))
        .find(|line| line.starts_with("fn ") || line.contains(" fn "))
}

