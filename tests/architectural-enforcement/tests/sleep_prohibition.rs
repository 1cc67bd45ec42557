//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT call sleep methods.
//! **Exceptions**: frame pacing in the render loop, the demo script's
//! scripted timing, test code.

use std::fs;
use std::path::Path;

use architectural_enforcement::{production_lines, rust_files};

/// Files allowed to sleep, and the word that must appear near the call
const ALLOWED: &[(&str, &str)] = &[
    ("expression/core/src/display/render_loop.rs", "frame"),
    ("tui/src/script.rs", ""),
];

/// Test that production code does not contain sleep() calls
#[test]
fn test_no_sleep_in_production_code() {
    let mut violations = Vec::new();
    for dir in ["expression/core/src", "tui/src"] {
        for file in rust_files(dir) {
            check_file(&file, &mut violations);
        }
    }

    if !violations.is_empty() {
        eprintln!("\n❌ CRITICAL: Sleep calls found in production code!\n");
        for violation in &violations {
            eprintln!("  ❌ {violation}");
        }
        eprintln!("\n✅ ACCEPTABLE sleep uses:");
        eprintln!("  - Frame pacing in the render loop");
        eprintln!("  - Scripted timing in the demo script");
        eprintln!("  - Periodic tasks using tokio::time::interval()");
        panic!(
            "\nFound {} sleep violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

fn allowance(path: &Path) -> Option<&'static str> {
    let normalized = path.to_string_lossy().replace('\\', "/");
    ALLOWED
        .iter()
        .find(|(suffix, _)| normalized.ends_with(suffix))
        .map(|(_, context)| *context)
}

fn check_file(path: &Path, violations: &mut Vec<String>) {
    let Ok(content) = fs::read_to_string(path) else {
        return;
    };
    let lines = production_lines(&content);

    for (pos, (line_number, code)) in lines.iter().enumerate() {
        if !(code.contains("::sleep(") || code.contains(".sleep(")) {
            continue;
        }
        if let Some(context) = allowance(path) {
            if context.is_empty() || near(&lines, pos, context) {
                continue;
            }
        }
        violations.push(format!("{}:{} - {}", path.display(), line_number, code.trim()));
    }
}

/// Whether `word` appears within a few lines before `pos`
fn near(lines: &[(usize, String)], pos: usize, word: &str) -> bool {
    lines[pos.saturating_sub(8)..=pos]
        .iter()
        .any(|(_, code)| code.to_lowercase().contains(word))
}

#[test]
fn test_frame_context_detection() {
    let lines: Vec<(usize, String)> = [
        "let elapsed = frame_start.elapsed();",
        "if let Some(remaining) = self.frame_duration.checked_sub(elapsed) {",
        "    std::thread::sleep(remaining);",
    ]
    .iter()
    .enumerate()
    .map(|(i, l)| (i + 1, (*l).to_string()))
    .collect();
    assert!(near(&lines, 2, "frame"));
    assert!(!near(&lines, 2, "backoff"));
}
