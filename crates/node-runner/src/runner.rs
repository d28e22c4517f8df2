//! Node.js process runner.

use blake3::Hasher;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, BufReader, Lines, Read, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;
use style_extractor::{CompileError, StyleCompiler, StyleMetadata};
use thiserror::Error;
use tracing::debug;

const NODE_SCRIPT_FILENAME: &str = "node-style-compiler.mjs";
const NODE_SCRIPT_SOURCE: &str = r#"import { createInterface } from 'node:readline';
import { stdin, stdout } from 'node:process';
import { createRequire } from 'node:module';
import { pathToFileURL } from 'node:url';

let babel = null;
try {
  const require = createRequire(pathToFileURL(process.cwd() + '/'));
  babel = require('@babel/core');
} catch (err) {
  const message = err && err.message ? err.message : String(err);
  console.error(`styled-lint-rs node runner failed to load @babel/core: ${message}`);
  process.exit(2);
}

stdout.write(JSON.stringify({ ready: true }) + '\n');

const rl = createInterface({ input: stdin, crlfDelay: Infinity });

for await (const line of rl) {
  if (!line.trim()) continue;

  let req;
  try {
    req = JSON.parse(line);
  } catch (err) {
    const message = err && err.message ? err.message : String(err);
    stdout.write(JSON.stringify({ id: null, protocolError: `invalid json: ${message}` }) + '\n');
    continue;
  }

  const id = req.id;

  try {
    const result = babel.transformSync(req.source, { filename: req.filename });
    const styles = result && result.metadata ? result.metadata.linaria : null;
    const metadata = styles
      ? { rules: styles.rules || {}, replacements: styles.replacements || [] }
      : null;
    stdout.write(JSON.stringify({ id, metadata }) + '\n');
  } catch (err) {
    const message = err && err.message ? err.message : String(err);
    stdout.write(JSON.stringify({ id, error: message }) + '\n');
  }
}
"#;

/// Error types for the node runner.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Failed to spawn the node process.
    #[error("failed to spawn node: {0}")]
    SpawnFailed(#[from] std::io::Error),

    /// The node process exited with an error.
    #[error("node exited with code {code}: {stderr}")]
    ProcessFailed { code: i32, stderr: String },

    /// node binary not found.
    #[error("node binary not found at: {0}")]
    NotFound(Utf8PathBuf),

    /// Failed to write the worker script.
    #[error("failed to prepare node runner script: {0}")]
    ScriptFailed(String),

    /// Node runner protocol error.
    #[error("node runner protocol error: {0}")]
    ProtocolError(String),

    /// Failed to parse a node response.
    #[error("failed to parse node response: {0}")]
    ParseError(String),
}

impl From<NodeError> for CompileError {
    fn from(error: NodeError) -> Self {
        CompileError::Unavailable(error.to_string())
    }
}

#[derive(Debug, Serialize)]
struct NodeRequest<'a> {
    id: u64,
    filename: &'a str,
    source: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeResponse {
    id: Option<u64>,
    metadata: Option<serde_json::Value>,
    error: Option<String>,
    protocol_error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NodeReady {
    ready: bool,
}

/// A [`StyleCompiler`] that compiles files with the project's Babel setup in a
/// Node.js worker.
///
/// The worker is started on the first compile and reused until the compiler
/// is dropped. If it dies, the next compile starts a fresh one.
#[derive(Debug)]
pub struct NodeCompiler {
    node_path: Utf8PathBuf,
    workspace_root: Utf8PathBuf,
    script_path: Utf8PathBuf,
    worker: Option<NodeWorker>,
    next_id: u64,
}

impl NodeCompiler {
    /// Creates a compiler whose worker script lives in the user cache directory.
    pub fn new(node_path: Utf8PathBuf, workspace_root: Utf8PathBuf) -> Result<Self, NodeError> {
        let cache_dir = Self::get_cache_dir()
            .ok_or_else(|| NodeError::ScriptFailed("could not determine cache directory".into()))?;
        Self::with_cache_dir(node_path, workspace_root, &cache_dir)
    }

    /// Creates a compiler whose worker script lives in `cache_dir`.
    pub fn with_cache_dir(
        node_path: Utf8PathBuf,
        workspace_root: Utf8PathBuf,
        cache_dir: &Utf8Path,
    ) -> Result<Self, NodeError> {
        if !node_path.exists() {
            return Err(NodeError::NotFound(node_path));
        }

        let script_path = ensure_script(cache_dir)?;
        Ok(Self {
            node_path,
            workspace_root,
            script_path,
            worker: None,
            next_id: 1,
        })
    }

    /// Attempts to find node in the workspace or PATH.
    /// 1. Workspace node_modules/.bin/node (if workspace_root provided)
    /// 2. PATH
    pub fn find_node(workspace_root: Option<&Utf8Path>) -> Option<Utf8PathBuf> {
        if let Some(workspace) = workspace_root {
            let bin = workspace.join("node_modules/.bin");
            if let Some(path) = find_node_in_bin(&bin) {
                return Some(path);
            }
        }

        if let Ok(path) = which::which("node") {
            if let Ok(utf8_path) = Utf8PathBuf::try_from(path) {
                return Some(utf8_path);
            }
        }

        None
    }

    /// Gets the cache directory for styled-lint-rs.
    pub fn get_cache_dir() -> Option<Utf8PathBuf> {
        dirs::cache_dir()
            .and_then(|p| Utf8PathBuf::try_from(p).ok())
            .map(|p| p.join("styled-lint-rs"))
    }

    /// Returns the node binary in use.
    pub fn node_path(&self) -> &Utf8Path {
        &self.node_path
    }

    /// Returns true while a worker process is running.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    fn request(&mut self, source: &str, filename: &Utf8Path) -> Result<NodeResponse, NodeError> {
        if self.worker.is_none() {
            debug!(node = %self.node_path, "starting node worker");
            self.worker = Some(NodeWorker::spawn(
                &self.node_path,
                &self.workspace_root,
                &self.script_path,
            )?);
        }

        let id = self.next_id;
        self.next_id += 1;

        let worker = self
            .worker
            .as_mut()
            .ok_or_else(|| NodeError::ProtocolError("node worker not running".to_string()))?;
        worker.request(&NodeRequest {
            id,
            filename: filename.as_str(),
            source,
        })
    }
}

impl StyleCompiler for NodeCompiler {
    fn compile(
        &mut self,
        source: &str,
        filename: &Utf8Path,
    ) -> Result<Option<StyleMetadata>, CompileError> {
        let response = match self.request(source, filename) {
            Ok(response) => response,
            Err(error) => {
                // The worker is in an unknown state; start over next time.
                self.worker = None;
                return Err(error.into());
            }
        };

        if let Some(message) = response.error {
            return Err(CompileError::Failed {
                filename: filename.to_string(),
                message,
            });
        }

        match response.metadata {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(value) => StyleMetadata::from_value(value).map(Some),
        }
    }
}

fn find_node_in_bin(bin: &Utf8Path) -> Option<Utf8PathBuf> {
    let candidates: &[&str] = if cfg!(windows) {
        &["node.exe", "node.cmd", "node"]
    } else {
        &["node"]
    };

    for candidate in candidates.iter() {
        let path = bin.join(candidate);
        if path.exists() {
            return Some(path);
        }
    }

    None
}

fn ensure_script(cache_dir: &Utf8Path) -> Result<Utf8PathBuf, NodeError> {
    fs::create_dir_all(cache_dir)
        .map_err(|e| NodeError::ScriptFailed(format!("failed to create cache dir: {e}")))?;

    let script_path = cache_dir.join(NODE_SCRIPT_FILENAME);
    let mut hasher = Hasher::new();
    hasher.update(NODE_SCRIPT_SOURCE.as_bytes());
    let expected_hash = hasher.finalize();

    if let Ok(existing) = fs::read(&script_path) {
        let mut hasher = Hasher::new();
        hasher.update(&existing);
        if hasher.finalize() == expected_hash {
            return Ok(script_path);
        }
    }

    fs::write(&script_path, NODE_SCRIPT_SOURCE)
        .map_err(|e| NodeError::ScriptFailed(format!("failed to write node runner script: {e}")))?;

    Ok(script_path)
}

#[derive(Debug)]
struct NodeWorker {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Lines<BufReader<ChildStdout>>,
    stderr_thread: Option<JoinHandle<String>>,
}

impl NodeWorker {
    fn spawn(
        node_path: &Utf8Path,
        workspace_root: &Utf8Path,
        script_path: &Utf8Path,
    ) -> Result<Self, NodeError> {
        let mut child = Command::new(node_path)
            .arg(script_path)
            .current_dir(workspace_root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(NodeError::SpawnFailed)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| NodeError::ProtocolError("failed to open node stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| NodeError::ProtocolError("failed to open node stdout".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| NodeError::ProtocolError("failed to open node stderr".to_string()))?;

        let stderr_thread = std::thread::spawn(move || {
            let mut reader = BufReader::new(stderr);
            let mut buffer = String::new();
            let _ = reader.read_to_string(&mut buffer);
            buffer
        });

        let mut worker = Self {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout).lines(),
            stderr_thread: Some(stderr_thread),
        };

        let ready_line = worker.next_line()?;
        let ready: NodeReady = serde_json::from_str(&ready_line)
            .map_err(|e| NodeError::ParseError(format!("invalid ready response: {e}")))?;
        if !ready.ready {
            return Err(NodeError::ProtocolError(format!(
                "unexpected node ready response: {}",
                ready_line
            )));
        }

        Ok(worker)
    }

    fn request(&mut self, request: &NodeRequest<'_>) -> Result<NodeResponse, NodeError> {
        let line = serde_json::to_string(request)
            .map_err(|e| NodeError::ProtocolError(format!("failed to serialize request: {e}")))?;

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| NodeError::ProtocolError("node stdin already closed".to_string()))?;
        stdin
            .write_all(line.as_bytes())
            .and_then(|()| stdin.write_all(b"\n"))
            .and_then(|()| stdin.flush())
            .map_err(|e| NodeError::ProtocolError(format!("failed to write to node stdin: {e}")))?;

        let line = self.next_line()?;
        let response: NodeResponse = serde_json::from_str(&line)
            .map_err(|e| NodeError::ParseError(format!("invalid response: {e} ({line})")))?;

        if let Some(error) = response.protocol_error {
            return Err(NodeError::ProtocolError(error));
        }

        match response.id {
            Some(id) if id == request.id => Ok(response),
            Some(id) => Err(NodeError::ProtocolError(format!(
                "unexpected response id {id}, expected {}",
                request.id
            ))),
            None => Err(NodeError::ProtocolError(format!(
                "missing response id: {line}"
            ))),
        }
    }

    /// Reads the next stdout line, turning EOF into the process's exit error.
    fn next_line(&mut self) -> Result<String, NodeError> {
        match self.stdout.next() {
            Some(Ok(line)) => Ok(line),
            Some(Err(e)) => Err(NodeError::ProtocolError(format!(
                "failed to read node response: {e}"
            ))),
            None => {
                let stderr = self
                    .stderr_thread
                    .take()
                    .and_then(|handle| handle.join().ok())
                    .unwrap_or_default();
                let status = self.child.wait().map_err(NodeError::SpawnFailed)?;
                Err(NodeError::ProcessFailed {
                    code: status.code().unwrap_or(-1),
                    stderr,
                })
            }
        }
    }
}

impl Drop for NodeWorker {
    fn drop(&mut self) {
        // Closing stdin ends the worker's read loop.
        self.stdin.take();
        if self.child.wait().is_err() {
            let _ = self.child.kill();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf8_dir(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn test_ensure_script_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let cache_dir = utf8_dir(&dir).join("cache");

        let path = ensure_script(&cache_dir).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), NODE_SCRIPT_SOURCE);

        fs::write(&path, "stale").unwrap();
        let again = ensure_script(&cache_dir).unwrap();
        assert_eq!(again, path);
        assert_eq!(fs::read_to_string(&path).unwrap(), NODE_SCRIPT_SOURCE);
    }

    #[test]
    fn test_find_node_in_bin() {
        let dir = tempfile::tempdir().unwrap();
        let bin = utf8_dir(&dir);
        assert!(find_node_in_bin(&bin).is_none());

        let name = if cfg!(windows) { "node.exe" } else { "node" };
        fs::write(bin.join(name), "").unwrap();
        assert_eq!(find_node_in_bin(&bin), Some(bin.join(name)));
    }

    #[test]
    fn test_missing_node_binary() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8_dir(&dir);
        let err = NodeCompiler::with_cache_dir(root.join("no-node"), root.clone(), &root)
            .unwrap_err();
        assert!(matches!(err, NodeError::NotFound(_)));
    }

    #[test]
    fn test_worker_starts_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8_dir(&dir);
        let node = root.join("node");
        fs::write(&node, "").unwrap();

        let compiler = NodeCompiler::with_cache_dir(node.clone(), root.clone(), &root).unwrap();
        assert_eq!(compiler.node_path(), node.as_path());
        assert!(!compiler.is_running());
    }

    #[test]
    fn test_node_error_into_compile_error() {
        let error: CompileError = NodeError::ProtocolError("boom".to_string()).into();
        assert_eq!(
            error.to_string(),
            "style compiler unavailable: node runner protocol error: boom"
        );
    }

    #[test]
    fn test_request_serialization() {
        let request = NodeRequest {
            id: 7,
            filename: "/app/src/Title.tsx",
            source: "css`a: b;`",
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"id":7,"filename":"/app/src/Title.tsx","source":"css`a: b;`"}"#
        );
    }
}
