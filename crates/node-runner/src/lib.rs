//! Node.js runner for the CSS-in-JS style compiler.
//!
//! Style metadata comes from the project's own Babel setup, so this crate
//! keeps a Node.js worker alive for the duration of a lint session and asks it
//! to compile one file at a time. `@babel/core` and the CSS-in-JS preset are
//! resolved from the workspace, exactly as the project's build would.
//!
//! # Example
//!
//! ```ignore
//! use camino::Utf8PathBuf;
//! use node_runner::NodeCompiler;
//! use style_extractor::StyleProcessor;
//!
//! let workspace = Utf8PathBuf::from("/path/to/project");
//! let node = NodeCompiler::find_node(Some(&workspace)).unwrap();
//! let compiler = NodeCompiler::new(node, workspace).unwrap();
//!
//! let mut processor = StyleProcessor::new(compiler);
//! let source = std::fs::read_to_string("/path/to/project/src/Title.tsx").unwrap();
//! println!("{}", processor.code(&source, "src/Title.tsx").css_text());
//! ```

mod runner;

pub use runner::{NodeCompiler, NodeError};
