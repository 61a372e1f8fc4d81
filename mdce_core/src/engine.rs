use std::path::Path;
use std::path::PathBuf;

use crate::Directive;
use crate::MdceError;
use crate::MdceResult;
use crate::fence::FenceMarker;
use crate::fence::classify;
use crate::fence::fence_header;
use crate::resolver::Resolve;
use crate::resolver::ResolvedContent;

/// Where the rewrite currently is relative to fenced blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RewriteState {
	/// Not inside any fence.
	#[default]
	Outside,
	/// Inside an ordinary fence. Its body is left alone.
	Unmanaged { fence_len: usize, opened_at: usize },
	/// Inside a directive fence. The old body is discarded and `deferred` is
	/// written out when the fence closes.
	Managed {
		fence_len: usize,
		opened_at: usize,
		deferred: ResolvedContent,
	},
}

impl RewriteState {
	/// The length of the open fence, if any.
	pub fn active_fence_len(&self) -> Option<usize> {
		match self {
			Self::Outside => None,
			Self::Unmanaged { fence_len, .. } | Self::Managed { fence_len, .. } => Some(*fence_len),
		}
	}
}

/// What to do with a single input line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
	/// The output at this position differs from the input line.
	pub replace: bool,
	/// Lines to write at this position. May be empty.
	pub emit: Vec<String>,
}

impl ParseOutcome {
	fn keep(line: &str) -> Self {
		Self {
			replace: false,
			emit: vec![line.to_string()],
		}
	}

	fn drop_line() -> Self {
		Self {
			replace: true,
			emit: Vec::new(),
		}
	}
}

/// Advance the rewrite by one line.
///
/// `line` keeps its own line ending. `line_number` is 1-indexed and is only
/// recorded, never used to look anything up.
pub fn step(
	state: RewriteState,
	line: &str,
	line_number: usize,
	base_dir: &Path,
	resolver: &dyn Resolve,
) -> MdceResult<(RewriteState, ParseOutcome)> {
	let marker = classify(line, state.active_fence_len())?;

	let next = match (state, marker) {
		(RewriteState::Outside, FenceMarker::Plain) => {
			(RewriteState::Outside, ParseOutcome::keep(line))
		}
		(
			RewriteState::Outside,
			FenceMarker::Open {
				fence_len,
				directive: Some(directive),
			},
		) => {
			tracing::debug!(line = line_number, %directive, "resolving directive");
			let deferred = resolver.resolve(base_dir, &directive)?;
			check_fence_collision(&deferred, fence_len)?;
			let state = RewriteState::Managed {
				fence_len,
				opened_at: line_number,
				deferred,
			};
			(state, ParseOutcome::keep(line))
		}
		(
			RewriteState::Outside,
			FenceMarker::Open {
				fence_len,
				directive: None,
			},
		) => {
			let state = RewriteState::Unmanaged {
				fence_len,
				opened_at: line_number,
			};
			(state, ParseOutcome::keep(line))
		}
		(RewriteState::Managed { deferred, .. }, FenceMarker::Close { .. }) => {
			let mut emit = deferred.into_lines();
			emit.push(line.to_string());
			let outcome = ParseOutcome {
				replace: true,
				emit,
			};
			(RewriteState::Outside, outcome)
		}
		(state @ RewriteState::Managed { .. }, FenceMarker::Plain) => {
			(state, ParseOutcome::drop_line())
		}
		(RewriteState::Unmanaged { .. }, FenceMarker::Close { .. }) => {
			(RewriteState::Outside, ParseOutcome::keep(line))
		}
		(state @ RewriteState::Unmanaged { .. }, FenceMarker::Plain) => {
			(state, ParseOutcome::keep(line))
		}
		// `classify` only returns `Open` without an active fence and only
		// returns `Close` with one.
		(state, _) => (state, ParseOutcome::keep(line)),
	};

	Ok(next)
}

/// Resolved content must not contain a fence that would close the managed
/// one, otherwise the next rewrite ends the block early.
fn check_fence_collision(content: &ResolvedContent, fence_len: usize) -> MdceResult<()> {
	let collision = content.iter().enumerate().find_map(|(index, line)| {
		fence_header(line)
			.filter(|header| header.fence_len >= fence_len)
			.map(|header| (index + 1, header.fence_len))
	});

	match collision {
		Some((line, found)) => {
			Err(MdceError::FenceCollision {
				line,
				found,
				fence_len,
			})
		}
		None => Ok(()),
	}
}

/// A directive found in a document, without its content resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveEntry {
	/// 1-indexed line of the opening fence.
	pub line: usize,
	pub fence_len: usize,
	pub directive: Directive,
}

/// Rewrites whole documents by folding [`step`] over their lines.
pub struct Rewriter<'a> {
	base_dir: PathBuf,
	resolver: &'a dyn Resolve,
}

impl<'a> Rewriter<'a> {
	/// `base_dir` anchors relative targets, normally the document's
	/// directory.
	pub fn new(base_dir: impl Into<PathBuf>, resolver: &'a dyn Resolve) -> Self {
		Self {
			base_dir: base_dir.into(),
			resolver,
		}
	}

	pub fn base_dir(&self) -> &Path {
		&self.base_dir
	}

	/// Produce the rewritten document.
	///
	/// The first failing directive aborts the rewrite and is reported against
	/// its line. A directive fence that is never closed is an error because
	/// its body would otherwise swallow the rest of the document.
	pub fn rewrite(&self, content: &str) -> MdceResult<String> {
		let mut output = String::with_capacity(content.len());
		let mut state = RewriteState::Outside;

		for (index, line) in content.split_inclusive('\n').enumerate() {
			let line_number = index + 1;
			let (next, outcome) = step(state, line, line_number, &self.base_dir, self.resolver)
				.map_err(|e| e.at_line(line_number))?;

			for emitted in &outcome.emit {
				output.push_str(emitted);
			}

			state = next;
		}

		match state {
			RewriteState::Outside => Ok(output),
			RewriteState::Unmanaged { opened_at, .. } => {
				tracing::warn!(line = opened_at, "code fence is never closed");
				Ok(output)
			}
			RewriteState::Managed { opened_at, .. } => {
				Err(MdceError::UnterminatedFence { line: opened_at })
			}
		}
	}

	/// List every directive in `content` in document order.
	pub fn directives(content: &str) -> MdceResult<Vec<DirectiveEntry>> {
		let mut entries = Vec::new();
		let mut active: Option<usize> = None;

		for (index, line) in content.split_inclusive('\n').enumerate() {
			let line_number = index + 1;
			match classify(line, active).map_err(|e| e.at_line(line_number))? {
				FenceMarker::Open {
					fence_len,
					directive,
				} => {
					active = Some(fence_len);
					if let Some(directive) = directive {
						entries.push(DirectiveEntry {
							line: line_number,
							fence_len,
							directive,
						});
					}
				}
				FenceMarker::Close { .. } => active = None,
				FenceMarker::Plain => {}
			}
		}

		Ok(entries)
	}
}
