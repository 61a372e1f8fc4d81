use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use clap::ArgAction;
use clap::Parser;

use crate::MdceError;
use crate::MdceResult;
use crate::lexer::split_words;

/// The unit removed from the left margin of sliced lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndentUnit {
	/// A single tab character (`t`).
	Tab,
	/// A run of spaces (`s` or `s<N>`).
	Spaces(usize),
}

impl IndentUnit {
	/// Spaces per unit when `s` is given without a count.
	pub const DEFAULT_SPACES: usize = 4;

	/// The literal text of one unit.
	pub fn prefix(self) -> String {
		match self {
			Self::Tab => "\t".to_string(),
			Self::Spaces(count) => " ".repeat(count),
		}
	}

	/// Number of characters in one unit.
	pub fn width(self) -> usize {
		match self {
			Self::Tab => 1,
			Self::Spaces(count) => count,
		}
	}
}

impl FromStr for IndentUnit {
	type Err = String;

	fn from_str(value: &str) -> Result<Self, Self::Err> {
		match value {
			"t" => Ok(Self::Tab),
			"s" => Ok(Self::Spaces(Self::DEFAULT_SPACES)),
			_ => {
				let count = value
					.strip_prefix('s')
					.and_then(|digits| digits.parse::<usize>().ok())
					.filter(|count| *count > 0)
					.ok_or_else(|| {
						format!("indent unit `{value}` must be `t` or `s[N]` with N a positive integer")
					})?;
				Ok(Self::Spaces(count))
			}
		}
	}
}

impl fmt::Display for IndentUnit {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Tab => write!(f, "t"),
			Self::Spaces(count) => write!(f, "s{count}"),
		}
	}
}

/// Embed a line range of `target`, optionally de-indented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SliceDirective {
	/// Path of the file to slice, relative to the document's directory.
	pub target: String,
	/// 1-indexed first line. `None` embeds the whole file.
	pub start: Option<usize>,
	/// 1-indexed last line, inclusive. `None` with a start embeds one line.
	pub end: Option<usize>,
	/// Unit used to strip the common left margin.
	pub indent: Option<IndentUnit>,
}

/// Execute `target` and embed its standard output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDirective {
	/// Path of the executable, relative to the document's directory.
	pub target: String,
	/// Argument vector passed to the executable as-is.
	pub args: Vec<String>,
	/// Upper bound on the run. `None` waits indefinitely.
	pub timeout: Option<Duration>,
}

/// The instruction attached to an opening fence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
	StaticSlice(SliceDirective),
	Run(RunDirective),
}

impl Directive {
	/// The target path as written in the fence.
	pub fn target(&self) -> &str {
		match self {
			Self::StaticSlice(slice) => &slice.target,
			Self::Run(run) => &run.target,
		}
	}

	/// Short human readable name of the directive mode.
	pub fn mode_name(&self) -> &'static str {
		match self {
			Self::StaticSlice(_) => "slice",
			Self::Run(_) => "run",
		}
	}
}

impl fmt::Display for Directive {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::StaticSlice(slice) => {
				write!(f, "{}", slice.target)?;
				match (slice.start, slice.end) {
					(Some(start), Some(end)) => write!(f, " [{start}-{end}]")?,
					(Some(start), None) => write!(f, " [{start}]")?,
					_ => {}
				}
				if let Some(indent) = slice.indent {
					write!(f, " indent={indent}")?;
				}
				Ok(())
			}
			Self::Run(run) => {
				write!(f, "{}", run.target)?;
				for arg in &run.args {
					write!(f, " {arg}")?;
				}
				if let Some(timeout) = run.timeout {
					write!(f, " timeout={}s", timeout.as_secs())?;
				}
				Ok(())
			}
		}
	}
}

/// Option grammar accepted after the `lang:path` head of a directive fence.
#[derive(Debug, Parser)]
#[command(
	name = "directive",
	no_binary_name = true,
	disable_help_flag = true,
	disable_version_flag = true
)]
struct DirectiveArgs {
	/// First line of the slice (1-indexed).
	#[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
	start: Option<u64>,

	/// Last line of the slice (1-indexed, inclusive).
	#[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
	end: Option<u64>,

	/// De-indentation unit: `t` or `s[N]`.
	#[arg(short, long, value_parser = IndentUnit::from_str)]
	indent: Option<IndentUnit>,

	/// Execute the target instead of slicing it.
	#[arg(short, long)]
	run: bool,

	/// Arguments for the executed target, split like a shell would.
	#[arg(short, long, allow_hyphen_values = true, action = ArgAction::Append)]
	args: Vec<String>,

	/// Maximum number of seconds to wait for the run.
	#[arg(short, long)]
	timeout: Option<u64>,
}

/// Parse the directive text that follows `lang:target` on an opening fence.
///
/// ```
/// use mdce_core::Directive;
/// use mdce_core::parse_directive;
///
/// let directive = parse_directive("src/main.rs", "--start 3 --end 5").unwrap();
/// let Directive::StaticSlice(slice) = directive else {
/// 	panic!("expected a slice");
/// };
/// assert_eq!(slice.start, Some(3));
/// assert_eq!(slice.end, Some(5));
/// ```
pub fn parse_directive(target: &str, raw: &str) -> MdceResult<Directive> {
	let target = target.trim();
	if target.is_empty() {
		return Err(syntax_error("missing target path"));
	}

	let mut words = split_words(raw)?;
	let shorthand = if words.first().is_some_and(|word| word.starts_with('[')) {
		let first = words.remove(0);
		Some(parse_range_shorthand(&first)?)
	} else {
		None
	};

	let parsed = DirectiveArgs::try_parse_from(&words).map_err(|e| clap_error(&e))?;

	if parsed.run {
		let mut args = Vec::new();
		for value in &parsed.args {
			args.extend(split_words(value)?);
		}

		return Ok(Directive::Run(RunDirective {
			target: target.to_string(),
			args,
			timeout: parsed.timeout.map(Duration::from_secs),
		}));
	}

	if !parsed.args.is_empty() {
		return Err(syntax_error("`--args` is only valid together with `--run`"));
	}

	let (start, end) = match shorthand {
		Some(range) => {
			if parsed.start.is_some() || parsed.end.is_some() {
				return Err(syntax_error(
					"a `[start-end]` range cannot be combined with `--start`/`--end`",
				));
			}
			range
		}
		None => (parsed.start.map(|n| n as usize), parsed.end.map(|n| n as usize)),
	};

	if start.is_none() && end.is_some() {
		return Err(syntax_error("`--end` requires `--start`"));
	}

	Ok(Directive::StaticSlice(SliceDirective {
		target: target.to_string(),
		start,
		end,
		indent: parsed.indent,
	}))
}

/// Parse the `[N]` / `[N-M]` range shorthand.
fn parse_range_shorthand(word: &str) -> MdceResult<(Option<usize>, Option<usize>)> {
	let invalid = || syntax_error(format!("invalid line range `{word}`, expected `[N]` or `[N-M]`"));
	let inner = word
		.strip_prefix('[')
		.and_then(|rest| rest.strip_suffix(']'))
		.ok_or_else(invalid)?;

	let parse_line = |text: &str| {
		text.trim()
			.parse::<usize>()
			.ok()
			.filter(|line| *line > 0)
			.ok_or_else(invalid)
	};

	match inner.split_once('-') {
		Some((start, end)) => Ok((Some(parse_line(start)?), Some(parse_line(end)?))),
		None => Ok((Some(parse_line(inner)?), None)),
	}
}

fn clap_error(error: &clap::Error) -> MdceError {
	let rendered = error.to_string();
	let first = rendered.lines().next().unwrap_or_default();
	syntax_error(first.trim_start_matches("error: ").trim())
}

fn syntax_error(message: impl Into<String>) -> MdceError {
	MdceError::DirectiveSyntax {
		message: message.into(),
	}
}
