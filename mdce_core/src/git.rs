use std::path::Path;
use std::path::PathBuf;

use crate::CommandOutput;
use crate::CommandRunner;
use crate::CommandSpec;
use crate::MdceError;
use crate::MdceResult;

/// Default message used when committing refreshed documents.
pub const DEFAULT_COMMIT_MESSAGE: &str = "docs: refresh embedded code";

/// How git sees a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GitFileStatus {
	/// The file is known to the index.
	pub tracked: bool,
	/// The working copy differs from the index.
	pub modified: bool,
}

impl GitFileStatus {
	pub fn label(self) -> &'static str {
		match (self.tracked, self.modified) {
			(false, _) => "untracked",
			(true, true) => "modified",
			(true, false) => "unmodified",
		}
	}
}

/// A git work tree, queried through a [`CommandRunner`].
pub struct GitRepository<'a> {
	root: PathBuf,
	runner: &'a dyn CommandRunner,
}

impl<'a> GitRepository<'a> {
	/// Locate the work tree containing `dir`. Returns `None` outside of a
	/// repository or when git is not installed.
	pub fn discover(dir: &Path, runner: &'a dyn CommandRunner) -> Option<Self> {
		let spec = CommandSpec::new("git")
			.args(["rev-parse", "--show-toplevel"])
			.current_dir(dir);

		let output = match runner.run(&spec) {
			Ok(output) if output.success() => output,
			Ok(_) => return None,
			Err(error) => {
				tracing::debug!(%error, "git is unavailable");
				return None;
			}
		};

		let root = output.stdout.trim();
		if root.is_empty() {
			return None;
		}

		Some(Self {
			root: PathBuf::from(root),
			runner,
		})
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Whether `path` is tracked and whether it has unstaged changes.
	pub fn status(&self, path: &Path) -> MdceResult<GitFileStatus> {
		let path = path_arg(path);
		let tracked = self
			.git(&["ls-files", "--error-unmatch", "--", &path])?
			.success();

		if !tracked {
			return Ok(GitFileStatus {
				tracked,
				modified: false,
			});
		}

		let diff = self.git(&["diff", "--quiet", "--", &path])?;
		let modified = match diff.code {
			Some(0) => false,
			Some(1) => true,
			_ => return Err(git_failure("diff", &diff)),
		};

		Ok(GitFileStatus { tracked, modified })
	}

	/// Stage `paths` and commit them with `message`.
	pub fn commit(&self, paths: &[PathBuf], message: &str) -> MdceResult<()> {
		if paths.is_empty() {
			return Ok(());
		}

		let paths: Vec<String> = paths.iter().map(|path| path_arg(path)).collect();

		let mut add = vec!["add", "--"];
		add.extend(paths.iter().map(String::as_str));
		let output = self.git(&add)?;
		if !output.success() {
			return Err(git_failure("add", &output));
		}

		let mut commit = vec!["commit", "-m", message, "--"];
		commit.extend(paths.iter().map(String::as_str));
		let output = self.git(&commit)?;
		if !output.success() {
			return Err(git_failure("commit", &output));
		}

		tracing::debug!(files = paths.len(), "committed documents");

		Ok(())
	}

	fn git(&self, args: &[&str]) -> MdceResult<CommandOutput> {
		let spec = CommandSpec::new("git")
			.args(args.iter().copied())
			.current_dir(&self.root);

		self.runner.run(&spec).map_err(|e| {
			MdceError::Git {
				reason: e.to_string(),
			}
		})
	}
}

fn path_arg(path: &Path) -> String {
	path.display().to_string()
}

fn git_failure(command: &str, output: &CommandOutput) -> MdceError {
	let stderr = output.stderr.trim();
	let reason = if stderr.is_empty() {
		format!("`git {command}` exited with {:?}", output.code)
	} else {
		format!("`git {command}`: {stderr}")
	};

	MdceError::Git { reason }
}
