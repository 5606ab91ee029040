//! Layering and hygiene rules for production code
//!
//! - `conductor/core` stays headless: no ratatui, no crossterm
//! - Production code does not `unwrap()` or `expect()`
//! - Async code never blocks a runtime thread with `std::thread::sleep`
//! - Async code never does blocking file, network or process I/O
//!
//! Synchronous functions may still use `std::fs`; they run at startup,
//! before the event loop takes over.

use architectural_enforcement::{code_lines, enclosing_fn, production_part, rust_sources};

/// Blocking calls that stall every task sharing the runtime thread
const BLOCKING_IO: &[&str] = &[
    "std::fs::",
    "use std::fs",
    "std::net::",
    "std::process::Command",
    "reqwest::blocking",
];

fn violations(dirs: &[&str], needles: &[&str]) -> Vec<String> {
    let mut found = Vec::new();
    for dir in dirs {
        for path in rust_sources(dir) {
            let Ok(source) = std::fs::read_to_string(&path) else {
                continue;
            };
            for (line_no, line) in code_lines(production_part(&source)) {
                if needles.iter().any(|needle| line.contains(needle)) {
                    found.push(format!("{}:{}: {}", path.display(), line_no, line.trim()));
                }
            }
        }
    }
    found
}

/// The core crate must not know about any terminal UI framework.
#[test]
fn test_core_has_no_ui_dependencies() {
    let found = violations(&["conductor/core/src"], &["ratatui", "crossterm"]);
    assert!(found.is_empty(), "UI framework used in core:\n{}", found.join("\n"));

    let manifest = std::fs::read_to_string(
        architectural_enforcement::workspace_root().join("conductor/core/Cargo.toml"),
    )
    .unwrap();
    assert!(!manifest.contains("ratatui"));
    assert!(!manifest.contains("crossterm"));
}

/// Errors are propagated, not unwrapped.
#[test]
fn test_no_unwrap_in_production_code() {
    let found = violations(&["conductor/core/src", "tui/src"], &[".unwrap()", ".expect("]);
    assert!(found.is_empty(), "unwrap/expect in production code:\n{}", found.join("\n"));
}

/// Blocking sleeps stall the single-threaded UI loop.
#[test]
fn test_no_blocking_sleep() {
    let found = violations(&["conductor/core/src", "tui/src"], &["std::thread::sleep"]);
    assert!(found.is_empty(), "blocking sleep in production code:\n{}", found.join("\n"));
}

fn blocking_io_in_async(dirs: &[&str]) -> Vec<String> {
    let mut found = Vec::new();
    for dir in dirs {
        for path in rust_sources(dir) {
            let Ok(source) = std::fs::read_to_string(&path) else {
                continue;
            };
            let lines: Vec<&str> = production_part(&source).lines().collect();
            for (idx, line) in lines.iter().enumerate() {
                let code = line.trim_start();
                if code.starts_with("//") || !BLOCKING_IO.iter().any(|n| code.contains(n)) {
                    continue;
                }
                // Module-level imports and async bodies both count.
                let in_sync_fn =
                    enclosing_fn(&lines, idx).is_some_and(|sig| !sig.contains("async fn"));
                if !in_sync_fn {
                    found.push(format!("{}:{}: {}", path.display(), idx + 1, code));
                }
            }
        }
    }
    found
}

/// Session writes, model downloads and clipboard helpers all run on the
/// same runtime as the UI loop.
#[test]
fn test_no_blocking_io_in_async_code() {
    let found = blocking_io_in_async(&["conductor/core/src", "tui/src"]);
    assert!(
        found.is_empty(),
        "blocking I/O in async code (use tokio::fs / tokio::process):\n{}",
        found.join("\n")
    );
}

#[test]
fn test_enclosing_fn_tells_sync_from_async() {
    let source = "use std::fs;\n\nfn load() {\n    std::fs::read(\"a\");\n}\n\npub async fn save() {\n    std::fs::write(\"a\", \"b\");\n}\n";
    let lines: Vec<&str> = source.lines().collect();
    assert_eq!(enclosing_fn(&lines, 0), None);
    assert_eq!(enclosing_fn(&lines, 3), Some("fn load() {"));
    assert_eq!(enclosing_fn(&lines, 7), Some("pub async fn save() {"));
}

/// The scan actually sees the sources it guards.
#[test]
fn test_sources_are_found() {
    assert!(rust_sources("conductor/core/src")
        .iter()
        .any(|p| p.ends_with("orchestrator.rs")));
    assert!(rust_sources("tui/src").iter().any(|p| p.ends_with("app.rs")));
}
