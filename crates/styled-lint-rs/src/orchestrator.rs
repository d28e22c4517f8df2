//! Main orchestration logic.

use crate::cli::{Args, OutputFormat, Threshold};
use crate::config::{ConfigError, LintConfig};
use crate::output::{CheckSummary, Formatter};
use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use node_runner::{NodeCompiler, NodeError};
use rustc_hash::FxHashMap;
use std::fs;
use style_extractor::{Extraction, LintResult, Severity, StyleCompiler, StyleProcessor};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Orchestration errors.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Invalid glob pattern.
    #[error("invalid glob pattern: {0}")]
    InvalidGlob(String),

    /// Config error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// No node binary could be located.
    #[error("node not found: install Node.js or pass --node")]
    NodeNotFound,

    /// Node runner error.
    #[error(transparent)]
    Node(#[from] NodeError),

    /// Failed to read the linter results.
    #[error("failed to read lint results from {path}: {message}")]
    ReadResults { path: Utf8PathBuf, message: String },

    /// Failed to write synthetic CSS.
    #[error("failed to write {path}: {message}")]
    WriteFailed { path: Utf8PathBuf, message: String },
}

/// A file whose embedded styles were extracted.
#[derive(Debug, Clone)]
pub struct StyledFile {
    /// Absolute path of the source file.
    pub path: Utf8PathBuf,
    /// Path relative to the workspace.
    pub relative: Utf8PathBuf,
    /// The original source text.
    pub source: String,
    /// The synthetic CSS.
    pub css: String,
}

/// What an extraction pass produced.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    /// Files with embedded styles, in scan order.
    pub styled: Vec<StyledFile>,
    /// Number of files the compiler failed on.
    pub failed: usize,
}

/// Runs extraction, and mapping when results are given, over the workspace.
pub fn run(args: Args) -> Result<CheckSummary, OrchestratorError> {
    let workspace = resolve_workspace(&args.workspace);

    // Load configuration
    let config = match &args.config {
        Some(path) => LintConfig::load(&workspace.join(path))?,
        None => LintConfig::find(&workspace)?,
    };

    let mut options = config.processor_options();
    if let Some(rule_order) = args.rule_order {
        options.rule_order = rule_order.into();
    }

    let ignore_set = build_ignore_set(&config.exclude, &args.ignore)?;
    let files = discover_files(&workspace, &config.file_extensions(), &ignore_set);
    debug!(count = files.len(), %workspace, "discovered files");

    let node = args
        .node
        .clone()
        .or_else(|| config.node.clone())
        .or_else(|| NodeCompiler::find_node(Some(&workspace)))
        .ok_or(OrchestratorError::NodeNotFound)?;
    let compiler = NodeCompiler::new(node, workspace.clone())?;
    debug!(node = %compiler.node_path(), "using node");
    let mut processor = StyleProcessor::with_options(compiler, options);

    check(&args, &workspace, &files, &mut processor)
}

/// Runs a check pass with an already configured processor.
pub fn check<C: StyleCompiler>(
    args: &Args,
    workspace: &Utf8Path,
    files: &[Utf8PathBuf],
    processor: &mut StyleProcessor<C>,
) -> Result<CheckSummary, OrchestratorError> {
    let report = extract_files(processor, workspace, files);

    let mut summary = CheckSummary {
        file_count: files.len(),
        styled_file_count: report.styled.len(),
        failed_count: report.failed,
        fail_on_warnings: args.fail_on_warnings,
        ..Default::default()
    };

    if args.emit_css {
        let css = format_emitted_css(&report.styled);
        // stdout carries the JSON array
        if matches!(args.output, OutputFormat::Json) {
            eprint!("{}", css);
        } else {
            print!("{}", css);
        }
    }

    let out_dir = args.out_dir.as_ref().map(|dir| workspace.join(dir));
    if let Some(out_dir) = &out_dir {
        let written = write_css(&report.styled, out_dir)?;
        debug!(count = written.len(), %out_dir, "wrote synthetic css");
    }

    let Some(results_path) = &args.results else {
        if !matches!(args.output, OutputFormat::Json) {
            println!("{}", summary.format());
        }
        return Ok(summary);
    };

    let results_path = workspace.join(results_path);
    let results = read_results(&results_path)?;
    let mapped = map_results(processor, results, workspace, out_dir.as_deref());

    let sources: FxHashMap<&Utf8Path, &str> = report
        .styled
        .iter()
        .map(|file| (file.path.as_path(), file.source.as_str()))
        .collect();

    let formatter = Formatter::new(args.output);
    let mut json_warnings = Vec::new();

    for (path, result) in &mapped {
        let warnings: Vec<_> = result
            .warnings
            .iter()
            .filter(|w| include_severity(w.severity(), args.threshold))
            .cloned()
            .collect();

        for warning in &warnings {
            match warning.severity() {
                Severity::Error => summary.error_count += 1,
                Severity::Warning => summary.warning_count += 1,
            }
        }

        if warnings.is_empty() {
            continue;
        }

        let display_path = path.strip_prefix(workspace).unwrap_or(path.as_path());
        match args.output {
            OutputFormat::Json => {
                json_warnings.extend(Formatter::format_json_warnings(&warnings, display_path));
            }
            _ => {
                let source = sources.get(path.as_path()).copied();
                print!("{}", formatter.format(&warnings, display_path, source));
            }
        }
    }

    match args.output {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json_warnings).unwrap_or_default()
            );
        }
        _ => println!("{}", summary.format()),
    }

    Ok(summary)
}

/// Extracts the embedded styles of every file in one processor session.
///
/// Unreadable files and compiler failures are logged and skipped.
pub fn extract_files<C: StyleCompiler>(
    processor: &mut StyleProcessor<C>,
    workspace: &Utf8Path,
    files: &[Utf8PathBuf],
) -> ExtractionReport {
    let mut report = ExtractionReport::default();

    for path in files {
        let source = match fs::read_to_string(path) {
            Ok(source) => source,
            Err(e) => {
                warn!("failed to read {}: {}", path, e);
                continue;
            }
        };

        match processor.code(&source, path) {
            Extraction::Extracted(styles) if styles.css.is_empty() => {
                debug!(%path, "no rules extracted");
            }
            Extraction::Extracted(styles) => {
                let relative = path.strip_prefix(workspace).unwrap_or(path.as_path()).to_owned();
                report.styled.push(StyledFile {
                    path: path.clone(),
                    relative,
                    source,
                    css: styles.css,
                });
            }
            Extraction::CompileFailed(error) => {
                warn!("{}", error);
                report.failed += 1;
            }
            Extraction::NoEmbeddedStyles => {}
        }
    }

    report
}

/// Formats the synthetic CSS of every file under a path header.
pub fn format_emitted_css(files: &[StyledFile]) -> String {
    let mut output = String::new();
    for file in files {
        output.push_str(&format!("/* {} */\n{}\n\n", file.relative, file.css));
    }
    output
}

/// Writes each file's synthetic CSS to `<out_dir>/<relative path>.css`.
pub fn write_css(
    files: &[StyledFile],
    out_dir: &Utf8Path,
) -> Result<Vec<Utf8PathBuf>, OrchestratorError> {
    let mut written = Vec::with_capacity(files.len());

    for file in files {
        let target = out_dir.join(format!("{}.css", file.relative));
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| OrchestratorError::WriteFailed {
                path: parent.to_owned(),
                message: e.to_string(),
            })?;
        }
        fs::write(&target, &file.css).map_err(|e| OrchestratorError::WriteFailed {
            path: target.clone(),
            message: e.to_string(),
        })?;
        written.push(target);
    }

    Ok(written)
}

/// Reads the linter's JSON results.
fn read_results(path: &Utf8Path) -> Result<Vec<LintResult>, OrchestratorError> {
    let content = fs::read_to_string(path).map_err(|e| OrchestratorError::ReadResults {
        path: path.to_owned(),
        message: e.to_string(),
    })?;

    LintResult::parse_many(&content).map_err(|e| OrchestratorError::ReadResults {
        path: path.to_owned(),
        message: e.to_string(),
    })
}

/// Corrects each result against the file it was produced for.
///
/// The returned results report the original file as their `source`.
pub fn map_results<C: StyleCompiler>(
    processor: &StyleProcessor<C>,
    results: Vec<LintResult>,
    workspace: &Utf8Path,
    out_dir: Option<&Utf8Path>,
) -> Vec<(Utf8PathBuf, LintResult)> {
    let mut mapped = Vec::with_capacity(results.len());

    for mut result in results {
        let Some(source) = result.source.as_deref() else {
            warn!("skipping lint result without a source path");
            continue;
        };

        let original = original_path(source, workspace, out_dir);
        if !processor.result(&mut result, &original) {
            debug!(%original, "no extracted styles, positions left as reported");
        }

        result.source = Some(original.to_string());
        mapped.push((original, result));
    }

    mapped
}

/// Resolves the source file a lint result refers to.
///
/// Results for files under `out_dir` point at synthetic CSS and are mapped
/// back to the file that CSS was extracted from.
pub fn original_path(source: &str, workspace: &Utf8Path, out_dir: Option<&Utf8Path>) -> Utf8PathBuf {
    let path = Utf8Path::new(source);
    let path = if path.is_relative() {
        workspace.join(path)
    } else {
        path.to_owned()
    };

    if let Some(out_dir) = out_dir {
        if let Ok(relative) = path.strip_prefix(out_dir) {
            let relative = relative.as_str();
            return workspace.join(relative.strip_suffix(".css").unwrap_or(relative));
        }
    }

    path
}

/// Builds the set of ignored paths.
fn build_ignore_set(exclude: &[String], ignore: &[String]) -> Result<GlobSet, OrchestratorError> {
    let mut ignore_builder = GlobSetBuilder::new();
    for pattern in exclude.iter().chain(ignore) {
        let glob = Glob::new(pattern).map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))?;
        ignore_builder.add(glob);
    }

    // Add default ignores
    for pattern in ["**/node_modules/**", "**/dist/**", "**/.styled-lint/**"] {
        if let Ok(glob) = Glob::new(pattern) {
            ignore_builder.add(glob);
        }
    }

    ignore_builder
        .build()
        .map_err(|e| OrchestratorError::InvalidGlob(e.to_string()))
}

/// Finds the files to process, sorted by path.
fn discover_files(workspace: &Utf8Path, extensions: &[&str], ignore_set: &GlobSet) -> Vec<Utf8PathBuf> {
    let mut files: Vec<Utf8PathBuf> = WalkDir::new(workspace)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
        .filter(|p| {
            let file_name = p.file_name().unwrap_or("");
            extensions.iter().any(|ext| file_name.ends_with(ext))
        })
        .filter(|p| {
            let relative = p.strip_prefix(workspace).unwrap_or(p.as_path());
            !ignore_set.is_match(relative.as_str())
        })
        .collect();
    files.sort();
    files
}

fn resolve_workspace(workspace: &Utf8Path) -> Utf8PathBuf {
    let absolute = if workspace.is_relative() {
        std::env::current_dir()
            .ok()
            .and_then(|p| Utf8PathBuf::try_from(p).ok())
            .unwrap_or_default()
            .join(workspace)
    } else {
        workspace.to_owned()
    };

    absolute.canonicalize_utf8().unwrap_or(absolute)
}

fn include_severity(severity: Severity, threshold: Threshold) -> bool {
    match threshold {
        Threshold::Error => severity == Severity::Error,
        Threshold::Warning => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use source_map::{Location, Position, Replacement};
    use style_extractor::{CompileError, Rule, StyleMetadata, Warning};

    struct Fixture {
        _dir: tempfile::TempDir,
        root: Utf8PathBuf,
    }

    fn fixture(files: &[(&str, &str)]) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        for (path, content) in files {
            let path = root.join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        Fixture { _dir: dir, root }
    }

    /// Reports one rule at the start of line 1 for files with a `css` tag,
    /// fails on files mentioning `BROKEN`.
    fn compiler(source: &str, filename: &Utf8Path) -> Result<Option<StyleMetadata>, CompileError> {
        if source.contains("BROKEN") {
            return Err(CompileError::Failed {
                filename: filename.to_string(),
                message: "Unexpected token".to_string(),
            });
        }

        let mut metadata = StyleMetadata::default();
        metadata.rules.insert(
            ".a".to_string(),
            Rule::new("a", "color: ${c};", Position::new(1, 4)),
        );
        metadata.replacements = vec![Replacement::new(
            Location::new(Position::new(1, 11), Position::new(1, 15)),
            1,
        )]
        .into();
        Ok(Some(metadata))
    }

    #[test]
    fn test_discover_files() {
        let fx = fixture(&[
            ("src/a.ts", ""),
            ("src/b.tsx", ""),
            ("src/c.css", ""),
            ("src/gen/d.ts", ""),
            ("node_modules/pkg/index.js", ""),
        ]);
        let ignore = build_ignore_set(&["src/gen/**".to_string()], &[]).unwrap();
        let files = discover_files(&fx.root, &[".ts", ".tsx", ".js"], &ignore);

        let relative: Vec<&str> = files
            .iter()
            .map(|p| p.strip_prefix(&fx.root).unwrap().as_str())
            .collect();
        assert_eq!(relative, vec!["src/a.ts", "src/b.tsx"]);
    }

    #[test]
    fn test_invalid_glob() {
        let err = build_ignore_set(&[], &["a/**[".to_string()]).unwrap_err();
        assert!(matches!(err, OrchestratorError::InvalidGlob(_)));
    }

    #[test]
    fn test_extract_files() {
        let fx = fixture(&[
            ("a.js", "css`color: ${c};`"),
            ("b.js", "export const b = 1;"),
            ("c.js", "css`BROKEN`"),
        ]);
        let files: Vec<Utf8PathBuf> = ["a.js", "b.js", "c.js"]
            .iter()
            .map(|f| fx.root.join(f))
            .collect();

        let mut processor = StyleProcessor::new(compiler);
        let report = extract_files(&mut processor, &fx.root, &files);

        assert_eq!(report.failed, 1);
        assert_eq!(report.styled.len(), 1);
        assert_eq!(report.styled[0].relative.as_str(), "a.js");
        assert_eq!(report.styled[0].css, ".a {color: ${c}; }");
    }

    #[test]
    fn test_rules_free_metadata_is_not_emitted() {
        let fx = fixture(&[("a.js", "css`color: ${c};`")]);
        let files = vec![fx.root.join("a.js")];
        let mut processor = StyleProcessor::new(|_: &str, _: &Utf8Path| {
            let mut metadata = StyleMetadata::default();
            metadata.replacements = vec![Replacement::new(
                Location::new(Position::new(1, 11), Position::new(1, 15)),
                1,
            )]
            .into();
            Ok::<Option<StyleMetadata>, CompileError>(Some(metadata))
        });

        let report = extract_files(&mut processor, &fx.root, &files);
        assert!(report.styled.is_empty());
        assert_eq!(report.failed, 0);
        // Replacements are still remembered for correction.
        assert!(processor.replacements(&files[0]).is_some());

        let out_dir = fx.root.join("out");
        assert!(write_css(&report.styled, &out_dir).unwrap().is_empty());
        assert!(!out_dir.join("a.js.css").exists());
        assert_eq!(format_emitted_css(&report.styled), "");
    }

    #[test]
    fn test_format_emitted_css() {
        let fx = fixture(&[("src/a.js", "css`color: ${c};`")]);
        let files = vec![fx.root.join("src/a.js")];
        let mut processor = StyleProcessor::new(compiler);
        let report = extract_files(&mut processor, &fx.root, &files);

        assert_eq!(
            format_emitted_css(&report.styled),
            "/* src/a.js */\n.a {color: ${c}; }\n\n"
        );
    }

    #[test]
    fn test_write_css() {
        let fx = fixture(&[("src/a.js", "css`color: ${c};`")]);
        let files = vec![fx.root.join("src/a.js")];
        let mut processor = StyleProcessor::new(compiler);
        let report = extract_files(&mut processor, &fx.root, &files);

        let out_dir = fx.root.join(".styled-lint");
        let written = write_css(&report.styled, &out_dir).unwrap();
        assert_eq!(written, vec![out_dir.join("src/a.js.css")]);
        assert_eq!(
            fs::read_to_string(&written[0]).unwrap(),
            ".a {color: ${c}; }"
        );
    }

    #[test]
    fn test_original_path() {
        let workspace = Utf8Path::new("/app");
        let out_dir = Utf8Path::new("/app/.styled-lint");

        assert_eq!(
            original_path("/app/.styled-lint/src/a.tsx.css", workspace, Some(out_dir)),
            Utf8PathBuf::from("/app/src/a.tsx")
        );
        assert_eq!(
            original_path("src/a.tsx", workspace, Some(out_dir)),
            Utf8PathBuf::from("/app/src/a.tsx")
        );
        assert_eq!(
            original_path("/elsewhere/b.js", workspace, None),
            Utf8PathBuf::from("/elsewhere/b.js")
        );
    }

    #[test]
    fn test_map_results() {
        let fx = fixture(&[("src/a.js", "css`color: ${c};`")]);
        let files = vec![fx.root.join("src/a.js")];
        let mut processor = StyleProcessor::new(compiler);
        extract_files(&mut processor, &fx.root, &files);

        let out_dir = fx.root.join(".styled-lint");
        let results = vec![
            LintResult {
                source: Some(out_dir.join("src/a.js.css").to_string()),
                ..LintResult::new(vec![Warning::new(1, 12), Warning::new(1, 14)])
            },
            LintResult {
                source: Some("src/other.js".to_string()),
                ..LintResult::new(vec![Warning::new(1, 14)])
            },
            LintResult::new(vec![Warning::new(1, 1)]),
        ];

        let mapped = map_results(&processor, results, &fx.root, Some(&out_dir));
        assert_eq!(mapped.len(), 2);

        let (path, result) = &mapped[0];
        assert_eq!(path, &fx.root.join("src/a.js"));
        assert_eq!(result.source.as_deref(), Some(path.as_str()));
        let columns: Vec<u32> = result.warnings.iter().map(|w| w.column).collect();
        // Replacement spans 11..=15 with a one-character placeholder.
        assert_eq!(columns, vec![12, 18]);

        // Files without extracted styles pass through unchanged.
        assert_eq!(mapped[1].1.warnings[0].column, 14);
    }

    #[test]
    fn test_check_counts_mapped_warnings() {
        let fx = fixture(&[("a.js", "css`color: ${c};`")]);
        let results = serde_json::json!([
            {
                "source": "a.js",
                "warnings": [
                    { "line": 1, "column": 5, "severity": "error", "text": "e", "rule": "r1" },
                    { "line": 1, "column": 6, "severity": "warning", "text": "w", "rule": "r2" }
                ]
            }
        ]);
        fs::write(fx.root.join("results.json"), results.to_string()).unwrap();

        let args = Args::parse_from([
            "styled-lint-rs",
            "--results",
            "results.json",
            "--output",
            "machine",
        ]);
        let files = vec![fx.root.join("a.js")];
        let mut processor = StyleProcessor::new(compiler);
        let summary = check(&args, &fx.root, &files, &mut processor).unwrap();

        assert_eq!(summary.file_count, 1);
        assert_eq!(summary.styled_file_count, 1);
        assert_eq!(summary.error_count, 1);
        assert_eq!(summary.warning_count, 1);
        assert!(summary.failed());
    }

    #[test]
    fn test_check_threshold_error_drops_warnings() {
        let fx = fixture(&[("a.js", "css`color: ${c};`")]);
        let results = r#"[{ "source": "a.js", "warnings": [
            { "line": 1, "column": 6, "severity": "warning", "text": "w", "rule": "r2" }
        ] }]"#;
        fs::write(fx.root.join("results.json"), results).unwrap();

        let args = Args::parse_from([
            "styled-lint-rs",
            "--results",
            "results.json",
            "--threshold",
            "error",
            "--fail-on-warnings",
        ]);
        let files = vec![fx.root.join("a.js")];
        let mut processor = StyleProcessor::new(compiler);
        let summary = check(&args, &fx.root, &files, &mut processor).unwrap();

        assert_eq!(summary.warning_count, 0);
        assert!(!summary.failed());
    }

    #[test]
    fn test_check_missing_results_file() {
        let fx = fixture(&[]);
        let args = Args::parse_from(["styled-lint-rs", "--results", "missing.json"]);
        let mut processor = StyleProcessor::new(compiler);
        let err = check(&args, &fx.root, &[], &mut processor).unwrap_err();
        assert!(matches!(err, OrchestratorError::ReadResults { .. }));
    }
}
