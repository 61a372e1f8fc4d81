use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum MdceError {
	#[error(transparent)]
	#[diagnostic(code(mdce::io_error))]
	Io(#[from] std::io::Error),

	#[error("invalid directive: {message}")]
	#[diagnostic(
		code(mdce::directive_syntax),
		help(
			"directives look like ```lang:path/to/file --start 1 --end 10 --indent s4 or \
			 ```lang:script.sh --run --args \"a b\" --timeout 5"
		)
	)]
	DirectiveSyntax { message: String },

	#[error(
		"line range {start}..={end} is out of bounds for `{path}` ({line_count} line(s))"
	)]
	#[diagnostic(
		code(mdce::line_range),
		help("check the --start/--end values against the current length of the file")
	)]
	LineRange {
		path: String,
		start: usize,
		end: usize,
		line_count: usize,
	},

	#[error("`{path}` exited with {}: {stderr}", status_label(.code))]
	#[diagnostic(code(mdce::process_execution))]
	ProcessExecution {
		path: String,
		code: Option<i32>,
		stderr: String,
	},

	#[error("`{path}` did not finish within {seconds:.1}s and was killed")]
	#[diagnostic(
		code(mdce::process_timeout),
		help("raise the limit with --timeout or the [run] timeout setting in mdce.toml")
	)]
	ProcessTimeout { path: String, seconds: f64 },

	#[error("target `{path}` cannot be read: {reason}")]
	#[diagnostic(
		code(mdce::missing_target),
		help("target paths are resolved relative to the directory of the document")
	)]
	MissingTarget { path: String, reason: String },

	#[error("directive fence opened on line {line} is never closed")]
	#[diagnostic(
		code(mdce::unterminated_fence),
		help("close the block with a backtick fence at least as long as the opening one")
	)]
	UnterminatedFence { line: usize },

	#[error(
		"embedded line {line} is a {found}-backtick fence, which would close the surrounding \
		 {fence_len}-backtick fence"
	)]
	#[diagnostic(
		code(mdce::fence_collision),
		help("wrap the directive in a fence longer than any fence inside the embedded content")
	)]
	FenceCollision {
		line: usize,
		found: usize,
		fence_len: usize,
	},

	#[error("line {line}: {source}")]
	#[diagnostic(code(mdce::directive_failed))]
	AtLine {
		line: usize,
		#[source]
		source: Box<MdceError>,
	},

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(mdce::config_parse),
		help("check that mdce.toml is valid TOML and that every glob pattern is well formed")
	)]
	ConfigParse(String),

	#[error("symlink cycle detected at: `{path}`")]
	#[diagnostic(
		code(mdce::symlink_cycle),
		help("remove the circular symlink or exclude this path")
	)]
	SymlinkCycle { path: String },

	#[error("git failed: {reason}")]
	#[diagnostic(code(mdce::git))]
	Git { reason: String },
}

impl MdceError {
	/// Attach the 1-indexed document line that triggered this error.
	pub fn at_line(self, line: usize) -> Self {
		Self::AtLine {
			line,
			source: Box::new(self),
		}
	}

	/// The innermost error, skipping any line wrappers.
	pub fn root_cause(&self) -> &MdceError {
		match self {
			Self::AtLine { source, .. } => source.root_cause(),
			other => other,
		}
	}

	/// The document line this error was reported against, if known.
	pub fn line(&self) -> Option<usize> {
		match self {
			Self::AtLine { line, .. } | Self::UnterminatedFence { line } => Some(*line),
			_ => None,
		}
	}
}

#[allow(clippy::ref_option)]
fn status_label(code: &Option<i32>) -> String {
	match code {
		Some(code) => format!("status {code}"),
		None => "no status".to_string(),
	}
}

pub type MdceResult<T> = Result<T, MdceError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
