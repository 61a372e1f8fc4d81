use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::DEFAULT_BACKUP_SUFFIX;
use crate::DEFAULT_COMMIT_MESSAGE;
use crate::MdceError;
use crate::MdceResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["mdce.toml", ".mdce.toml", ".config/mdce.toml"];

/// File name treated as a document when no `[documents]` patterns are set.
pub const DEFAULT_DOCUMENT_PATTERN: &str = "README.md";

/// Configuration loaded from an `mdce.toml` file.
///
/// ```toml
/// recursive = true
/// disable_gitignore = false
///
/// [documents]
/// patterns = ["README.md", "docs/**/*.md"]
///
/// [exclude]
/// patterns = ["vendor/", "build/"]
///
/// [backup]
/// enabled = false
/// suffix = ".bak"
///
/// [run]
/// timeout = 30
///
/// [git]
/// commit = false
/// message = "docs: refresh embedded code"
/// ```
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct MdceConfig {
	/// Descend into subdirectories when searching for documents.
	#[serde(default = "default_true")]
	pub recursive: bool,
	/// When true, `.gitignore` files are not used for filtering. Use
	/// `[exclude]` patterns instead.
	#[serde(default)]
	pub disable_gitignore: bool,
	/// Which files are documents.
	#[serde(default)]
	pub documents: DocumentsConfig,
	/// Exclusion configuration using gitignore-style patterns.
	#[serde(default)]
	pub exclude: ExcludeConfig,
	#[serde(default)]
	pub backup: BackupConfig,
	#[serde(default)]
	pub run: RunConfig,
	#[serde(default)]
	pub git: GitConfig,
}

impl Default for MdceConfig {
	fn default() -> Self {
		Self {
			recursive: true,
			disable_gitignore: false,
			documents: DocumentsConfig::default(),
			exclude: ExcludeConfig::default(),
			backup: BackupConfig::default(),
			run: RunConfig::default(),
			git: GitConfig::default(),
		}
	}
}

/// Glob patterns selecting documents. A pattern matches either the file name
/// or the path relative to the project root.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct DocumentsConfig {
	#[serde(default = "default_document_patterns")]
	pub patterns: Vec<String>,
}

impl Default for DocumentsConfig {
	fn default() -> Self {
		Self {
			patterns: default_document_patterns(),
		}
	}
}

/// Configuration for excluding files and directories from discovery.
///
/// Patterns follow gitignore syntax and are applied on top of any `.gitignore`
/// rules (unless `disable_gitignore` is set).
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ExcludeConfig {
	/// Examples: `"build/"`, `"*.generated.md"`, `"!important.md"`.
	#[serde(default)]
	pub patterns: Vec<String>,
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct BackupConfig {
	#[serde(default)]
	pub enabled: bool,
	#[serde(default = "default_backup_suffix")]
	pub suffix: String,
}

impl Default for BackupConfig {
	fn default() -> Self {
		Self {
			enabled: false,
			suffix: default_backup_suffix(),
		}
	}
}

/// Settings for run directives.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct RunConfig {
	/// Seconds to wait for a run directive without its own `--timeout`.
	#[serde(default)]
	pub timeout: Option<u64>,
}

impl RunConfig {
	pub fn timeout(&self) -> Option<Duration> {
		self.timeout.map(Duration::from_secs)
	}
}

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct GitConfig {
	/// Commit updated documents after a successful `update`.
	#[serde(default)]
	pub commit: bool,
	#[serde(default = "default_commit_message")]
	pub message: String,
}

impl Default for GitConfig {
	fn default() -> Self {
		Self {
			commit: false,
			message: default_commit_message(),
		}
	}
}

fn default_true() -> bool {
	true
}

fn default_document_patterns() -> Vec<String> {
	vec![DEFAULT_DOCUMENT_PATTERN.to_string()]
}

fn default_backup_suffix() -> String {
	DEFAULT_BACKUP_SUFFIX.to_string()
}

fn default_commit_message() -> String {
	DEFAULT_COMMIT_MESSAGE.to_string()
}

impl MdceConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if the file does not exist.
	pub fn load(root: &Path) -> MdceResult<Option<MdceConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		tracing::debug!(path = %config_path.display(), "loading config");

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::parse(&content)?;

		Ok(Some(config))
	}

	/// Parse config text.
	pub fn parse(content: &str) -> MdceResult<MdceConfig> {
		toml::from_str(content).map_err(|e| MdceError::ConfigParse(e.to_string()))
	}
}
