//! End-to-end tests for the styled-lint-rs binary.
//!
//! Each test builds a throwaway workspace with a stub `@babel/core` that
//! reports fixed style metadata, then runs the binary against it.
//! Tests are skipped when `node` is not on PATH.

#![cfg(not(target_os = "windows"))]

use camino::Utf8PathBuf;
use node_runner::NodeCompiler;
use pretty_assertions::assert_eq;
use serde::Deserialize;
use std::fs;
use std::process::{Command, Output};

const STUB_BABEL: &str = r#"
exports.transformSync = function (source) {
  if (!source.includes('css`')) {
    return { code: source, metadata: {} };
  }
  return {
    code: source,
    metadata: {
      linaria: {
        rules: {
          '.t1': {
            className: 't1',
            displayName: 'title',
            cssText: 'color: red;',
            start: { line: 1, column: 18 },
          },
        },
        replacements: [
          {
            original: { start: { line: 1, column: 25 }, end: { line: 1, column: 33 } },
            length: 3,
          },
        ],
      },
    },
  };
};
"#;

const TITLE_SOURCE: &str = "const title = css`color: ${c};`;\n";

#[derive(Debug, Deserialize)]
struct JsonWarning {
    filename: String,
    line: u32,
    column: u32,
    rule: String,
}

struct Workspace {
    _dir: tempfile::TempDir,
    root: Utf8PathBuf,
    node: Utf8PathBuf,
}

fn workspace() -> Option<Workspace> {
    let Some(node) = NodeCompiler::find_node(None) else {
        eprintln!("Skipping CLI test: node not found on PATH");
        return None;
    };

    let dir = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();

    let babel = root.join("node_modules/@babel/core");
    fs::create_dir_all(&babel).unwrap();
    fs::write(
        babel.join("package.json"),
        r#"{ "name": "@babel/core", "version": "7.0.0-stub", "main": "index.js" }"#,
    )
    .unwrap();
    fs::write(babel.join("index.js"), STUB_BABEL).unwrap();

    fs::write(root.join("title.js"), TITLE_SOURCE).unwrap();
    fs::write(root.join("plain.js"), "export const plain = 1;\n").unwrap();

    Some(Workspace {
        _dir: dir,
        root,
        node,
    })
}

fn run(workspace: &Workspace, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_styled-lint-rs"))
        .arg("--workspace")
        .arg(workspace.root.as_str())
        .arg("--node")
        .arg(workspace.node.as_str())
        .args(extra)
        .output()
        .unwrap()
}

#[test]
fn emits_synthetic_css() {
    let Some(workspace) = workspace() else {
        return;
    };

    let output = run(&workspace, &["--emit-css"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("/* title.js */"));
    assert!(stdout.contains(&format!(".title {{{}color: red; }}", " ".repeat(10))));
    assert!(!stdout.contains("plain.js"));
    assert!(stdout.contains("in 2 files (1 with styles)"));
}

#[test]
fn writes_css_files() {
    let Some(workspace) = workspace() else {
        return;
    };

    let output = run(&workspace, &["--out-dir", ".styled-lint"]);
    assert!(output.status.success());

    let css = fs::read_to_string(workspace.root.join(".styled-lint/title.js.css")).unwrap();
    assert_eq!(css, format!(".title {{{}color: red; }}", " ".repeat(10)));
    assert!(!workspace.root.join(".styled-lint/plain.js.css").exists());
}

#[test]
fn maps_lint_results_back_to_source() {
    let Some(workspace) = workspace() else {
        return;
    };

    let results = serde_json::json!([
        {
            "source": ".styled-lint/title.js.css",
            "warnings": [
                { "line": 1, "column": 19, "severity": "error", "text": "a", "rule": "before" },
                { "line": 1, "column": 27, "severity": "error", "text": "b", "rule": "inside" },
                { "line": 1, "column": 30, "severity": "warning", "text": "c", "rule": "after" }
            ]
        }
    ]);
    fs::write(workspace.root.join("results.json"), results.to_string()).unwrap();

    let output = run(
        &workspace,
        &[
            "--out-dir",
            ".styled-lint",
            "--results",
            "results.json",
            "--output",
            "json",
        ],
    );

    // Errors were reported.
    assert_eq!(output.status.code(), Some(1));

    let warnings: Vec<JsonWarning> = serde_json::from_slice(&output.stdout).unwrap();
    let positions: Vec<(&str, &str, u32, u32)> = warnings
        .iter()
        .map(|w| (w.rule.as_str(), w.filename.as_str(), w.line, w.column))
        .collect();
    assert_eq!(
        positions,
        vec![
            ("before", "title.js", 1, 19),
            ("inside", "title.js", 1, 32),
            ("after", "title.js", 1, 36),
        ]
    );
}

#[test]
fn json_output_stays_parseable_with_emitted_css() {
    let Some(workspace) = workspace() else {
        return;
    };

    fs::write(workspace.root.join("results.json"), "[]").unwrap();

    let output = run(
        &workspace,
        &["--emit-css", "--results", "results.json", "--output", "json"],
    );
    assert!(output.status.success());

    let warnings: Vec<JsonWarning> = serde_json::from_slice(&output.stdout).unwrap();
    assert!(warnings.is_empty());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("/* title.js */"));
}

#[test]
fn threshold_hides_warnings() {
    let Some(workspace) = workspace() else {
        return;
    };

    let results = r#"[{ "source": "title.js", "warnings": [
        { "line": 1, "column": 30, "severity": "warning", "text": "c", "rule": "after" }
    ] }]"#;
    fs::write(workspace.root.join("results.json"), results).unwrap();

    let output = run(
        &workspace,
        &["--results", "results.json", "--threshold", "error", "--output", "machine"],
    );
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(!stdout.contains("WARNING"));
    assert!(stdout.contains("0 errors and 0 warnings"));
}
