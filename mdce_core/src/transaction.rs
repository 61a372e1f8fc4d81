use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use tempfile::NamedTempFile;

use crate::MdceResult;
use crate::engine::Rewriter;
use crate::resolver::Resolve;

/// Suffix appended to a document's path when backing it up.
pub const DEFAULT_BACKUP_SUFFIX: &str = ".bak";

/// Controls how a changed document is committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
	/// Report changes without touching the file.
	pub dry_run: bool,
	/// Copy the original to `<path><backup_suffix>` before replacing it.
	pub backup: bool,
	pub backup_suffix: String,
}

impl Default for RewriteOptions {
	fn default() -> Self {
		Self {
			dry_run: false,
			backup: false,
			backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
		}
	}
}

/// The result of rewriting a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteStatus {
	/// The rewritten text matches the original. Nothing was written.
	Unchanged,
	/// The rewritten text differs. It was written unless running dry.
	Changed,
}

/// The in-memory rewrite of one document. Nothing on disk changes until
/// [`DocumentTransaction::commit`] is called.
#[derive(Debug, Clone)]
pub struct DocumentTransaction {
	path: PathBuf,
	original: String,
	rewritten: String,
}

impl DocumentTransaction {
	/// Read the document at `path` and rewrite it in memory.
	pub fn prepare(path: &Path, resolver: &dyn Resolve) -> MdceResult<Self> {
		let original = fs::read_to_string(path)?;
		let base_dir = match path.parent() {
			Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
			_ => PathBuf::from("."),
		};

		let rewritten = Rewriter::new(base_dir, resolver).rewrite(&original)?;

		Ok(Self {
			path: path.to_path_buf(),
			original,
			rewritten,
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn original(&self) -> &str {
		&self.original
	}

	pub fn rewritten(&self) -> &str {
		&self.rewritten
	}

	pub fn changed(&self) -> bool {
		self.original != self.rewritten
	}

	/// Persist the rewritten text, honouring `options`.
	pub fn commit(&self, options: &RewriteOptions) -> MdceResult<RewriteStatus> {
		if !self.changed() {
			return Ok(RewriteStatus::Unchanged);
		}

		if options.dry_run {
			return Ok(RewriteStatus::Changed);
		}

		if options.backup {
			let backup = backup_path(&self.path, &options.backup_suffix);
			fs::copy(&self.path, &backup)?;
			tracing::debug!(path = %backup.display(), "wrote backup");
		}

		write_atomic(&self.path, self.rewritten.as_bytes())?;
		tracing::debug!(path = %self.path.display(), "document updated");

		Ok(RewriteStatus::Changed)
	}

	/// Split into `(path, original, rewritten)`.
	pub fn into_parts(self) -> (PathBuf, String, String) {
		(self.path, self.original, self.rewritten)
	}
}

/// Rewrite the document at `path` and commit the result.
pub fn rewrite_document(
	path: &Path,
	options: &RewriteOptions,
	resolver: &dyn Resolve,
) -> MdceResult<RewriteStatus> {
	DocumentTransaction::prepare(path, resolver)?.commit(options)
}

/// `path` with `suffix` appended to its file name.
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
	let mut name: OsString = path.as_os_str().to_owned();
	name.push(suffix);
	PathBuf::from(name)
}

/// Replace `path` with `data` through a temporary file in the same directory
/// so readers only ever see the old or the new content.
fn write_atomic(path: &Path, data: &[u8]) -> MdceResult<()> {
	let dir = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};

	let permissions = fs::metadata(path).map(|metadata| metadata.permissions()).ok();
	let mut temp = NamedTempFile::new_in(dir)?;
	temp.write_all(data)?;
	temp.as_file().sync_all()?;

	if let Some(permissions) = permissions {
		fs::set_permissions(temp.path(), permissions)?;
	}

	temp.persist(path).map_err(|e| e.error)?;

	Ok(())
}
