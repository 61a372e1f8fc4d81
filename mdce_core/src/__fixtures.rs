use std::cell::RefCell;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::path::Path;

use crate::CommandOutput;
use crate::CommandRunner;
use crate::CommandSpec;
use crate::Directive;
use crate::MdceError;
use crate::MdceResult;
use crate::Resolve;
use crate::ResolvedContent;

/// Resolver returning canned content per target, recording every call.
#[derive(Default)]
pub struct FakeResolver {
	content: HashMap<String, String>,
	failures: HashMap<String, String>,
	pub calls: RefCell<Vec<String>>,
}

impl FakeResolver {
	pub fn with(mut self, target: &str, text: &str) -> Self {
		self.content.insert(target.to_string(), text.to_string());
		self
	}

	pub fn failing(mut self, target: &str, reason: &str) -> Self {
		self.failures.insert(target.to_string(), reason.to_string());
		self
	}
}

impl Resolve for FakeResolver {
	fn resolve(&self, _base_dir: &Path, directive: &Directive) -> MdceResult<ResolvedContent> {
		let target = directive.target();
		self.calls.borrow_mut().push(target.to_string());

		if let Some(reason) = self.failures.get(target) {
			return Err(MdceError::MissingTarget {
				path: target.to_string(),
				reason: reason.clone(),
			});
		}

		self.content.get(target).map_or_else(
			|| {
				Err(MdceError::MissingTarget {
					path: target.to_string(),
					reason: "not registered".to_string(),
				})
			},
			|text| Ok(ResolvedContent::from_text(text)),
		)
	}
}

/// Runner replaying queued outputs in order and recording each spec.
#[derive(Default)]
pub struct FakeRunner {
	outputs: RefCell<VecDeque<MdceResult<CommandOutput>>>,
	pub specs: RefCell<Vec<CommandSpec>>,
}

impl FakeRunner {
	pub fn push(self, code: i32, stdout: &str, stderr: &str) -> Self {
		self.outputs.borrow_mut().push_back(Ok(CommandOutput {
			code: Some(code),
			stdout: stdout.to_string(),
			stderr: stderr.to_string(),
		}));
		self
	}

	pub fn push_error(self, error: MdceError) -> Self {
		self.outputs.borrow_mut().push_back(Err(error));
		self
	}

	/// The argument vectors of every recorded call.
	pub fn recorded_args(&self) -> Vec<Vec<String>> {
		self.specs
			.borrow()
			.iter()
			.map(|spec| spec.args.clone())
			.collect()
	}
}

impl CommandRunner for FakeRunner {
	fn run(&self, spec: &CommandSpec) -> MdceResult<CommandOutput> {
		self.specs.borrow_mut().push(spec.clone());
		self.outputs
			.borrow_mut()
			.pop_front()
			.unwrap_or_else(|| Ok(CommandOutput::default()))
	}
}

pub fn write_file(dir: &Path, relative: &str, content: &str) {
	let path = dir.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create dir: {e}"));
	}
	std::fs::write(path, content).unwrap_or_else(|e| panic!("write: {e}"));
}

pub fn read_file(dir: &Path, relative: &str) -> String {
	std::fs::read_to_string(dir.join(relative)).unwrap_or_else(|e| panic!("read: {e}"))
}

#[cfg(unix)]
pub fn write_script(dir: &Path, relative: &str, body: &str) {
	use std::os::unix::fs::PermissionsExt;

	write_file(dir, relative, &format!("#!/bin/sh\n{body}\n"));
	let path = dir.join(relative);
	std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
		.unwrap_or_else(|e| panic!("chmod: {e}"));
}

pub fn numbered_lines(count: usize) -> String {
	(1..=count).map(|n| format!("line {n}\n")).collect()
}
