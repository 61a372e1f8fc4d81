use std::path::Path;
use std::time::Duration;

use derive_more::Deref;
use derive_more::DerefMut;

use crate::CommandRunner;
use crate::CommandSpec;
use crate::Directive;
use crate::IndentUnit;
use crate::MdceError;
use crate::MdceResult;
use crate::RunDirective;
use crate::SliceDirective;
use crate::SystemCommandRunner;

/// Lines ready to be placed inside a managed fence. Every line ends in `\n`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deref, DerefMut)]
pub struct ResolvedContent(Vec<String>);

impl ResolvedContent {
	pub fn new(lines: Vec<String>) -> Self {
		Self(lines)
	}

	/// Split `text` into lines, terminating each one with `\n`.
	pub fn from_text(text: &str) -> Self {
		Self(text.lines().map(|line| format!("{line}\n")).collect())
	}

	pub fn into_lines(self) -> Vec<String> {
		self.0
	}
}

/// Produces the content for a directive.
pub trait Resolve {
	/// Resolve `directive` with relative targets anchored at `base_dir`.
	fn resolve(&self, base_dir: &Path, directive: &Directive) -> MdceResult<ResolvedContent>;
}

/// The production resolver: reads files from disk and runs executables
/// through a [`CommandRunner`].
pub struct FileResolver {
	runner: Box<dyn CommandRunner>,
	default_timeout: Option<Duration>,
}

impl Default for FileResolver {
	fn default() -> Self {
		Self::new()
	}
}

impl FileResolver {
	pub fn new() -> Self {
		Self::with_runner(SystemCommandRunner)
	}

	pub fn with_runner(runner: impl CommandRunner + 'static) -> Self {
		Self {
			runner: Box::new(runner),
			default_timeout: None,
		}
	}

	/// Timeout applied to run directives that do not set their own.
	#[must_use]
	pub fn with_default_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.default_timeout = timeout;
		self
	}

	fn resolve_run_directive(
		&self,
		base_dir: &Path,
		run: &RunDirective,
	) -> MdceResult<ResolvedContent> {
		let timeout = run.timeout.or(self.default_timeout);
		resolve_run(self.runner.as_ref(), base_dir, &run.target, &run.args, timeout)
	}
}

impl Resolve for FileResolver {
	fn resolve(&self, base_dir: &Path, directive: &Directive) -> MdceResult<ResolvedContent> {
		match directive {
			Directive::StaticSlice(SliceDirective {
				target,
				start,
				end,
				indent,
			}) => resolve_slice(&base_dir.join(target), *start, *end, *indent),
			Directive::Run(run) => self.resolve_run_directive(base_dir, run),
		}
	}
}

/// Read the inclusive, 1-indexed line range `start..=end` from `path`.
///
/// Without a `start` the whole file is returned. Without an `end` exactly
/// line `start` is returned. When `indent` is set the common left margin,
/// measured in whole units, is removed.
pub fn resolve_slice(
	path: &Path,
	start: Option<usize>,
	end: Option<usize>,
	indent: Option<IndentUnit>,
) -> MdceResult<ResolvedContent> {
	let display = path.display().to_string();
	let text = std::fs::read_to_string(path).map_err(|e| {
		MdceError::MissingTarget {
			path: display.clone(),
			reason: e.to_string(),
		}
	})?;

	let lines = ResolvedContent::from_text(&text).into_lines();
	let line_count = lines.len();

	let selected = match (start, end) {
		(None, None) => lines,
		(None, Some(_)) => {
			return Err(MdceError::DirectiveSyntax {
				message: "`--end` requires `--start`".to_string(),
			});
		}
		(Some(start), end) => {
			let end = end.unwrap_or(start);
			if start == 0 || start - 1 > line_count || end > line_count || end < start {
				return Err(MdceError::LineRange {
					path: display,
					start,
					end,
					line_count,
				});
			}

			lines[start - 1..end].to_vec()
		}
	};

	let selected = match indent {
		Some(unit) => normalize_indent(selected, unit),
		None => selected,
	};

	Ok(ResolvedContent(selected))
}

/// Remove the smallest whole-unit indentation shared by all lines.
///
/// Every selected line takes part in the minimum, blank ones included, and
/// every line loses the same `minimum * width` leading characters. The strip
/// stops short of a line's `\n`.
pub fn normalize_indent(lines: Vec<String>, unit: IndentUnit) -> Vec<String> {
	let prefix = unit.prefix();
	let width = unit.width();

	let minimum = lines
		.iter()
		.map(|line| count_prefix_units(line, &prefix))
		.min()
		.unwrap_or(0);

	if minimum == 0 {
		return lines;
	}

	let strip = minimum * width;

	lines
		.into_iter()
		.map(|line| {
			let removable = line
				.char_indices()
				.take(strip)
				.take_while(|(_, c)| *c != '\n')
				.last()
				.map_or(0, |(index, c)| index + c.len_utf8());
			line[removable..].to_string()
		})
		.collect()
}

fn count_prefix_units(line: &str, prefix: &str) -> usize {
	let mut count = 0;
	let mut rest = line;

	while let Some(next) = rest.strip_prefix(prefix) {
		count += 1;
		rest = next;
	}

	count
}

/// Execute `target`, relative to `base_dir`, with `args` and return its
/// standard output. The process runs with `base_dir` as its working
/// directory.
pub fn resolve_run(
	runner: &dyn CommandRunner,
	base_dir: &Path,
	target: &str,
	args: &[String],
	timeout: Option<Duration>,
) -> MdceResult<ResolvedContent> {
	let program = base_dir.join(target).canonicalize().map_err(|e| {
		MdceError::MissingTarget {
			path: target.to_string(),
			reason: e.to_string(),
		}
	})?;

	if !program.is_file() {
		return Err(MdceError::MissingTarget {
			path: target.to_string(),
			reason: "not a file".to_string(),
		});
	}

	let working_dir = base_dir
		.canonicalize()
		.unwrap_or_else(|_| base_dir.to_path_buf());
	let spec = CommandSpec::new(&program)
		.args(args.iter().cloned())
		.current_dir(working_dir)
		.timeout(timeout);

	let output = runner.run(&spec).map_err(|error| {
		match error {
			MdceError::ProcessTimeout { seconds, .. } => {
				MdceError::ProcessTimeout {
					path: target.to_string(),
					seconds,
				}
			}
			MdceError::ProcessExecution { code, stderr, .. } => {
				MdceError::ProcessExecution {
					path: target.to_string(),
					code,
					stderr,
				}
			}
			other => other,
		}
	})?;

	if !output.success() {
		return Err(MdceError::ProcessExecution {
			path: target.to_string(),
			code: output.code,
			stderr: output.stderr.trim().to_string(),
		});
	}

	tracing::debug!(directive_target = %target, bytes = output.stdout.len(), "captured run output");

	Ok(ResolvedContent::from_text(&output.stdout))
}
