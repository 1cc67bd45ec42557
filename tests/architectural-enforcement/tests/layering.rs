//! Integration Test: Engine Layering
//!
//! The expression engine must stay headless: no terminal or UI crates in
//! its manifest or its source. Surfaces live in their own crates.

use std::fs;

use architectural_enforcement::{production_lines, rust_files, workspace_root};

const UI_CRATES: &[&str] = &["ratatui", "crossterm"];

#[test]
fn test_engine_manifest_has_no_ui_dependencies() {
    let manifest = fs::read_to_string(workspace_root().join("expression/core/Cargo.toml"))
        .expect("engine manifest readable");
    for krate in UI_CRATES {
        assert!(
            !manifest.contains(krate),
            "expression-core must not depend on {krate}"
        );
    }
}

#[test]
fn test_engine_source_has_no_ui_imports() {
    let mut violations = Vec::new();
    for file in rust_files("expression/core/src") {
        let content = fs::read_to_string(&file).expect("source readable");
        for (line_number, code) in production_lines(&content) {
            if UI_CRATES
                .iter()
                .any(|krate| code.contains(&format!("{krate}::")))
            {
                violations.push(format!("{}:{}", file.display(), line_number));
            }
        }
    }
    assert!(violations.is_empty(), "UI imports in engine: {violations:?}");
}
