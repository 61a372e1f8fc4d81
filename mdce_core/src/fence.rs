use crate::Directive;
use crate::MdceResult;
use crate::directive::parse_directive;

/// Minimum number of backticks that make up a fence.
pub const MIN_FENCE_LEN: usize = 3;

/// The classification of a single document line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenceMarker {
	/// Ordinary text, or a shorter fence nested inside an active block.
	Plain,
	/// A fence opening a new block. `directive` is present when the info
	/// string carries a `lang:path` head.
	Open {
		fence_len: usize,
		directive: Option<Directive>,
	},
	/// A fence at least as long as the active one.
	Close { fence_len: usize },
}

/// The pieces of an opening fence's info string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FenceHeader<'a> {
	pub fence_len: usize,
	/// Syntax tag before the colon.
	pub tag: Option<&'a str>,
	/// Target path after the colon.
	pub target: Option<&'a str>,
	/// Everything after the `lang:path` head.
	pub directive_text: &'a str,
}

impl FenceHeader<'_> {
	/// Whether the header names both a tag and a target.
	pub fn is_directive(&self) -> bool {
		self.tag.is_some() && self.target.is_some()
	}
}

/// Split a line into its fence components. Returns `None` when the line does
/// not start with at least three backticks.
pub fn fence_header(line: &str) -> Option<FenceHeader<'_>> {
	let line = line.trim_end_matches(['\n', '\r']);
	let fence_len = line.chars().take_while(|&c| c == '`').count();

	if fence_len < MIN_FENCE_LEN {
		return None;
	}

	let info = line[fence_len..].trim_start();
	let head_len = info.find(char::is_whitespace).unwrap_or(info.len());
	let (head, rest) = info.split_at(head_len);

	let Some((tag, target)) = head.split_once(':') else {
		return Some(FenceHeader {
			fence_len,
			tag: None,
			target: None,
			directive_text: info.trim(),
		});
	};

	if !is_valid_tag(tag) {
		return Some(FenceHeader {
			fence_len,
			tag: None,
			target: None,
			directive_text: info.trim(),
		});
	}

	let target = Some(target).filter(|target| !target.is_empty() && !target.contains('`'));

	Some(FenceHeader {
		fence_len,
		tag: Some(tag),
		target,
		directive_text: rest.trim(),
	})
}

/// Classify `line` given the length of the currently open fence, if any.
///
/// Only an opening fence with a `lang:path` head reaches the directive
/// parser, so a syntax error can only come from such a line.
pub fn classify(line: &str, active_fence_len: Option<usize>) -> MdceResult<FenceMarker> {
	let Some(header) = fence_header(line) else {
		return Ok(FenceMarker::Plain);
	};

	if let Some(active) = active_fence_len {
		if header.fence_len >= active {
			return Ok(FenceMarker::Close {
				fence_len: header.fence_len,
			});
		}

		return Ok(FenceMarker::Plain);
	}

	let directive = match (header.tag, header.target) {
		(Some(_), Some(target)) => Some(parse_directive(target, header.directive_text)?),
		_ => None,
	};

	Ok(FenceMarker::Open {
		fence_len: header.fence_len,
		directive,
	})
}

fn is_valid_tag(tag: &str) -> bool {
	!tag.is_empty()
		&& tag
			.chars()
			.all(|c| c.is_alphanumeric() || matches!(c, '_' | '+' | '#' | '.' | '-'))
}
