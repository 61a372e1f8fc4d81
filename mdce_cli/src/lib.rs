use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Keep code samples in markdown documents in sync with the files they come from.",
	long_about = "mdce (markdown code embed) rewrites fenced code blocks in place.\n\nA fence \
	              whose info string reads `lang:path` is a directive. Its body is replaced with \
	              a line range of `path`, or with the output of running `path`:\n\n  \
	              ```rust:src/main.rs --start 3 --end 10 --indent s4\n  ```text:scripts/demo.sh \
	              --run --args \"a b\" --timeout 5\n  ```cpp:include/api.h [14-17]\n\nQuick \
	              start:\n  mdce update  Refresh every directive fence\n  mdce check   Verify \
	              everything is up to date\n  mdce list    Show every directive"
)]
pub struct MdceCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Process only this document. Can be repeated. Relative paths are
	/// resolved against the project root.
	#[arg(long, short, global = true)]
	pub file: Vec<PathBuf>,

	/// Search for documents in this directory instead of the project root.
	/// Can be repeated.
	#[arg(long, short, global = true)]
	pub dir: Vec<PathBuf>,

	/// Only look for documents directly inside the search directories.
	#[arg(long, global = true, default_value_t = false)]
	pub no_recursive: bool,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Rewrite every directive fence with fresh content.
	///
	/// Documents are processed one at a time. A document whose directives
	/// cannot all be resolved is left untouched and reported, and the
	/// remaining documents are still processed.
	Update {
		/// Report which documents would change without writing them.
		#[arg(long, default_value_t = false)]
		dry_run: bool,

		/// Copy each changed document to `<path><suffix>` before replacing
		/// it.
		#[arg(long, short, default_value_t = false)]
		backup: bool,

		/// Suffix used for backups. Defaults to `.bak`.
		#[arg(long)]
		backup_suffix: Option<String>,

		/// Commit changed documents to git after updating them.
		#[arg(long, short, default_value_t = false)]
		commit: bool,

		/// Commit message used with `--commit`.
		#[arg(long, short)]
		message: Option<String>,

		/// Default limit, in seconds, for run directives without their own
		/// `--timeout`.
		#[arg(long, short)]
		timeout: Option<u64>,
	},
	/// Check that every directive fence is up to date.
	///
	/// Resolves every directive without writing anything and exits with
	/// status 1 if any document would change. Ideal for CI pipelines. Use
	/// `--diff` to see exactly what changed and `--format` to control the
	/// output style.
	Check {
		/// Show a line diff for each stale document.
		#[arg(long, default_value_t = false)]
		diff: bool,

		/// Output format for check results. Use `text` for human-readable
		/// output, `json` for programmatic consumption, or `github` for
		/// GitHub Actions annotations that appear inline on PRs.
		#[arg(long, value_enum, default_value_t = OutputFormat::Text)]
		format: OutputFormat,

		/// Default limit, in seconds, for run directives without their own
		/// `--timeout`.
		#[arg(long, short)]
		timeout: Option<u64>,
	},
	/// List every directive in the discovered documents.
	///
	/// Nothing is resolved or executed. Useful for auditing which files a
	/// document depends on.
	List {
		/// Output format for the listing.
		#[arg(long, value_enum, default_value_t = ListFormat::Text)]
		format: ListFormat,
	},
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text output with colors and formatting.
	Text,
	/// JSON output for programmatic consumption.
	Json,
	/// GitHub Actions annotation format. Emits `::warning` or `::error`
	/// annotations that appear inline on pull request diffs.
	Github,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ListFormat {
	/// Human-readable text output.
	Text,
	/// JSON output for programmatic consumption.
	Json,
}
