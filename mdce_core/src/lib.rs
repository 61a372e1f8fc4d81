//! `mdce_core` is the engine behind [mdce](https://github.com/ippie52/mdce), a tool that keeps code samples in markdown documents in sync with the files they were taken from. A backtick fence whose info string reads `lang:path` is a directive: its body is replaced with a line range of `path`, or with the standard output of running `path`.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Markdown document
//!   -> Fence classifier (one line -> Plain / Open / Close, given the open fence length)
//!   -> Directive parser (shell-like words -> StaticSlice or Run)
//!   -> Resolver (file slice + indent normalization, or captured process output)
//!   -> Rewrite engine (explicit state, old fence bodies dropped, resolved content emitted at the close)
//!   -> Transaction (compare, optional backup, atomic replace)
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration loading from `mdce.toml`.
//! - [`discovery`] - Recursive document search honouring `.gitignore` and `[exclude]` patterns.
//! - [`git`] - Tracked/modified classification and commit automation.
//!
//! ## Key Types
//!
//! - [`Directive`] - What a fence asks for: a [`SliceDirective`] or a [`RunDirective`].
//! - [`Rewriter`] - Rewrites one document's text through a [`Resolve`] implementation.
//! - [`DocumentTransaction`] - The in-memory rewrite of a document, committed atomically.
//! - [`RunSummary`] - Per-document outcomes of a batch run.
//! - [`MdceError`] - Every failure, with a miette diagnostic code.
//!
//! ## Directive Syntax
//!
//! ````markdown
//! ```cpp:examples/example.cpp --start 12 --end 26 --indent s4
//! ```
//!
//! ```text:scripts/hello.sh --run --args "big world" --timeout 5
//! ```
//!
//! ```cpp:examples/greeting.h [14-17]
//! ```
//! ````
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use mdce_core::FileResolver;
//! use mdce_core::RewriteOptions;
//! use mdce_core::RewriteStatus;
//! use mdce_core::rewrite_document;
//!
//! let resolver = FileResolver::new();
//! let status =
//! 	rewrite_document(Path::new("README.md"), &RewriteOptions::default(), &resolver).unwrap();
//!
//! if status == RewriteStatus::Changed {
//! 	println!("README.md updated");
//! }
//! ```

pub use batch::*;
pub use config::*;
pub use directive::*;
pub use discovery::*;
pub use engine::*;
pub use error::*;
pub use fence::*;
pub use git::*;
pub use process::*;
pub use resolver::*;
pub use transaction::*;

mod batch;
pub mod config;
mod directive;
pub mod discovery;
mod engine;
#[allow(unused_assignments)]
mod error;
mod fence;
pub mod git;
pub(crate) mod lexer;
mod process;
mod resolver;
mod transaction;

#[cfg(test)]
mod __fixtures;
