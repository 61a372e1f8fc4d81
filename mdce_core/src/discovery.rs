use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use globset::Glob;
use globset::GlobSet;
use globset::GlobSetBuilder;
use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;

use crate::MdceConfig;
use crate::MdceError;
use crate::MdceResult;
use crate::config::DEFAULT_DOCUMENT_PATTERN;

/// Options controlling which files are treated as documents.
///
/// Use [`DiscoveryOptions::default()`] for sensible defaults or
/// [`DiscoveryOptions::from_config`] to construct from an [`MdceConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
	/// Glob patterns a file name (or root relative path) must match.
	pub document_patterns: Vec<String>,
	/// Gitignore-style patterns for files and directories to skip.
	pub exclude_patterns: Vec<String>,
	/// Descend into subdirectories.
	pub recursive: bool,
	/// Whether to ignore the project's `.gitignore`.
	pub disable_gitignore: bool,
}

impl Default for DiscoveryOptions {
	fn default() -> Self {
		Self {
			document_patterns: vec![DEFAULT_DOCUMENT_PATTERN.to_string()],
			exclude_patterns: Vec::new(),
			recursive: true,
			disable_gitignore: false,
		}
	}
}

impl DiscoveryOptions {
	/// Construct [`DiscoveryOptions`] from an [`MdceConfig`].
	pub fn from_config(config: Option<&MdceConfig>) -> Self {
		let Some(config) = config else {
			return Self::default();
		};

		Self {
			document_patterns: config.documents.patterns.clone(),
			exclude_patterns: config.exclude.patterns.clone(),
			recursive: config.recursive,
			disable_gitignore: config.disable_gitignore,
		}
	}
}

/// Find every document under `roots`.
///
/// Roots that are files are taken as given. Directory roots are walked, and
/// the results of each root are sorted. Paths already produced by an earlier
/// root are dropped. `.gitignore` and `[exclude]` rules are anchored at
/// `project_root`.
pub fn discover_documents(
	project_root: &Path,
	roots: &[PathBuf],
	options: &DiscoveryOptions,
) -> MdceResult<Vec<PathBuf>> {
	let documents = build_document_matcher(&options.document_patterns)?;
	let gitignore = if options.disable_gitignore {
		Gitignore::empty()
	} else {
		build_gitignore(project_root)
	};
	let custom_exclude = build_exclude_matcher(project_root, &options.exclude_patterns)?;

	let walker = Walker {
		project_root,
		documents: &documents,
		gitignore: &gitignore,
		custom_exclude: &custom_exclude,
		recursive: options.recursive,
	};

	let mut seen = HashSet::new();
	let mut result = Vec::new();

	for root in roots {
		let mut found = Vec::new();

		if root.is_file() {
			found.push(root.clone());
		} else if root.is_dir() {
			let mut visited_dirs = HashSet::new();
			walker.walk_dir(root, &mut found, &mut visited_dirs)?;
			found.sort();
		} else {
			return Err(MdceError::MissingTarget {
				path: root.display().to_string(),
				reason: "no such file or directory".to_string(),
			});
		}

		for path in found {
			let key = path.canonicalize().unwrap_or_else(|_| path.clone());
			if seen.insert(key) {
				result.push(path);
			}
		}
	}

	tracing::debug!(count = result.len(), "discovered documents");

	Ok(result)
}

struct Walker<'a> {
	project_root: &'a Path,
	documents: &'a GlobSet,
	gitignore: &'a Gitignore,
	custom_exclude: &'a Gitignore,
	recursive: bool,
}

impl Walker<'_> {
	fn walk_dir(
		&self,
		dir: &Path,
		files: &mut Vec<PathBuf>,
		visited_dirs: &mut HashSet<PathBuf>,
	) -> MdceResult<()> {
		// Detect symlink cycles by tracking canonical paths.
		let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
		if !visited_dirs.insert(canonical) {
			return Err(MdceError::SymlinkCycle {
				path: dir.display().to_string(),
			});
		}

		for entry in std::fs::read_dir(dir)? {
			let path = entry?.path();
			let is_dir = path.is_dir();

			if is_dir
				&& path
					.file_name()
					.and_then(|name| name.to_str())
					.is_some_and(is_ignored_directory_name)
			{
				continue;
			}

			if self.is_excluded(&path, is_dir) {
				tracing::debug!(path = %path.display(), "skipping excluded path");
				continue;
			}

			if is_dir {
				if self.recursive {
					self.walk_dir(&path, files, visited_dirs)?;
				}
			} else if self.is_document(&path) {
				files.push(path);
			}
		}

		Ok(())
	}

	fn is_excluded(&self, path: &Path, is_dir: bool) -> bool {
		// Ignore rules only apply below the project root.
		if !path.starts_with(self.project_root) {
			return false;
		}

		self.gitignore.matched(path, is_dir).is_ignore()
			|| self.custom_exclude.matched(path, is_dir).is_ignore()
	}

	fn is_document(&self, path: &Path) -> bool {
		if path
			.file_name()
			.is_some_and(|name| self.documents.is_match(name))
		{
			return true;
		}

		path.strip_prefix(self.project_root)
			.is_ok_and(|relative| self.documents.is_match(relative))
	}
}

fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || name == "node_modules" || name == "target"
}

fn build_document_matcher(patterns: &[String]) -> MdceResult<GlobSet> {
	let mut builder = GlobSetBuilder::new();
	for pattern in patterns {
		let glob = Glob::new(pattern).map_err(|e| {
			MdceError::ConfigParse(format!("invalid document pattern `{pattern}`: {e}"))
		})?;
		builder.add(glob);
	}
	builder
		.build()
		.map_err(|e| MdceError::ConfigParse(format!("failed to build document patterns: {e}")))
}

/// Build a `Gitignore` matcher from exclude patterns specified in
/// `mdce.toml` `[exclude]`. These follow `.gitignore` syntax and are applied
/// on top of any `.gitignore` rules.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> MdceResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			MdceError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| MdceError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

/// Build a `Gitignore` matcher from the project's `.gitignore` file (if any).
fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		if let Some(error) = builder.add(&gitignore_path) {
			tracing::warn!(%error, "ignoring unreadable .gitignore");
		}
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}
