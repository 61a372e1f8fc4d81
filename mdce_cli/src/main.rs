use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use mdce_cli::Commands;
use mdce_cli::ListFormat;
use mdce_cli::MdceCli;
use mdce_cli::OutputFormat;
use mdce_core::Directive;
use mdce_core::DiscoveryOptions;
use mdce_core::DocumentOutcome;
use mdce_core::FileResolver;
use mdce_core::GitRepository;
use mdce_core::MdceConfig;
use mdce_core::MdceError;
use mdce_core::RewriteOptions;
use mdce_core::Rewriter;
use mdce_core::RunSummary;
use mdce_core::SystemCommandRunner;
use mdce_core::discover_documents;
use mdce_core::process_documents;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use tracing_subscriber::EnvFilter;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "MDCE_LOG";

/// Exit status when `check` finds stale documents.
const EXIT_STALE: i32 = 1;
/// Exit status when a document or the setup failed.
const EXIT_FAILURE: i32 = 2;

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = MdceCli::parse();

	// Respect NO_COLOR env var, --no-color flag and terminals without color.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stderr).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	init_tracing(args.verbose, use_color);

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Update {
			dry_run,
			backup,
			backup_suffix,
			commit,
			message,
			timeout,
		}) => {
			let update = UpdateArgs {
				dry_run: *dry_run,
				backup: *backup,
				backup_suffix: backup_suffix.clone(),
				commit: *commit,
				message: message.clone(),
				timeout: *timeout,
			};
			run_update(&args, &update)
		}
		Some(Commands::Check {
			diff,
			format,
			timeout,
		}) => run_check(&args, *diff, *format, *timeout),
		Some(Commands::List { format }) => run_list(&args, *format),
		None => {
			eprintln!("No subcommand specified. Run `mdce --help` for usage.");
			process::exit(EXIT_FAILURE);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<MdceError>() {
			Ok(mdce_err) => {
				let report: miette::Report = (*mdce_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(EXIT_FAILURE);
	}
}

fn init_tracing(verbose: bool, use_color: bool) {
	let default_level = if verbose { "debug" } else { "warn" };
	let filter =
		EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.with_target(false)
		.init();
}

struct UpdateArgs {
	dry_run: bool,
	backup: bool,
	backup_suffix: Option<String>,
	commit: bool,
	message: Option<String>,
	timeout: Option<u64>,
}

/// The project root, its configuration and the documents to process.
struct Workspace {
	root: PathBuf,
	config: MdceConfig,
	documents: Vec<PathBuf>,
}

impl Workspace {
	fn resolver(&self, timeout: Option<u64>) -> FileResolver {
		let timeout = timeout
			.map(std::time::Duration::from_secs)
			.or_else(|| self.config.run.timeout());
		FileResolver::new().with_default_timeout(timeout)
	}
}

fn resolve_root(args: &MdceCli) -> PathBuf {
	let root = args
		.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
	root.canonicalize().unwrap_or(root)
}

fn load_workspace(args: &MdceCli) -> Result<Workspace, Box<dyn std::error::Error>> {
	let root = resolve_root(args);
	let config = MdceConfig::load(&root)?.unwrap_or_default();

	let mut options = DiscoveryOptions::from_config(Some(&config));
	if args.no_recursive {
		options.recursive = false;
	}

	let mut roots: Vec<PathBuf> = args
		.file
		.iter()
		.chain(&args.dir)
		.map(|path| root.join(path))
		.collect();
	if roots.is_empty() {
		roots.push(root.clone());
	}

	let documents = discover_documents(&root, &roots, &options)?;

	Ok(Workspace {
		root,
		config,
		documents,
	})
}

fn run_update(args: &MdceCli, update: &UpdateArgs) -> Result<(), Box<dyn std::error::Error>> {
	let workspace = load_workspace(args)?;
	let root = &workspace.root;
	let config = &workspace.config;

	if workspace.documents.is_empty() {
		println!("No documents found.");
		return Ok(());
	}

	let options = RewriteOptions {
		dry_run: update.dry_run,
		backup: update.backup || config.backup.enabled,
		backup_suffix: update
			.backup_suffix
			.clone()
			.unwrap_or_else(|| config.backup.suffix.clone()),
	};
	let resolver = workspace.resolver(update.timeout);
	let summary = process_documents(&workspace.documents, &options, &resolver);

	let runner = SystemCommandRunner;
	let repository = GitRepository::discover(root, &runner);
	let changed: Vec<PathBuf> = summary
		.changed()
		.map(|report| report.path.clone())
		.collect();

	if changed.is_empty() {
		if summary.is_ok() {
			println!("All documents are already up to date.");
		}
	} else {
		if update.dry_run {
			println!("Dry run: would update {} document(s):", changed.len());
		} else {
			println!("Updated {} document(s):", changed.len());
		}

		for path in &changed {
			let rel = make_relative(path, root);
			match repository.as_ref().map(|repo| repo.status(path)) {
				Some(Ok(status)) => println!("  {rel} ({})", status.label()),
				Some(Err(error)) => {
					tracing::warn!(%error, "could not read git status");
					println!("  {rel}");
				}
				None => println!("  {rel}"),
			}
		}
	}

	let failed = summary.failed_count();
	print_failures(summary, root);

	let commit = update.commit || config.git.commit;
	if commit && !update.dry_run && !changed.is_empty() {
		let repository = repository.ok_or_else(|| {
			MdceError::Git {
				reason: format!("{} is not inside a git repository", root.display()),
			}
		})?;
		let message = update
			.message
			.clone()
			.unwrap_or_else(|| config.git.message.clone());
		repository.commit(&changed, &message)?;
		println!("Committed {} document(s).", changed.len());
	}

	if failed > 0 {
		eprintln!(
			"{} {failed} document(s) could not be updated.",
			colored!("error:", red)
		);
		process::exit(EXIT_FAILURE);
	}

	Ok(())
}

fn run_check(
	args: &MdceCli,
	show_diff: bool,
	format: OutputFormat,
	timeout: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
	let workspace = load_workspace(args)?;
	let root = &workspace.root;
	let options = RewriteOptions {
		dry_run: true,
		..RewriteOptions::default()
	};
	let resolver = workspace.resolver(timeout);
	let summary = process_documents(&workspace.documents, &options, &resolver);

	let stale_count = summary.changed_count();
	let failed_count = summary.failed_count();

	if stale_count == 0 && failed_count == 0 {
		match format {
			OutputFormat::Json => {
				println!("{{\"ok\":true,\"stale\":[],\"errors\":[]}}");
			}
			OutputFormat::Github | OutputFormat::Text => {
				println!("Check passed: all documents are up to date.");
			}
		}
		return Ok(());
	}

	match format {
		OutputFormat::Json => {
			let mut stale_entries = Vec::new();
			let mut error_entries = Vec::new();
			for report in &summary.reports {
				let rel = make_relative(&report.path, root);
				match &report.outcome {
					DocumentOutcome::Changed {
						original,
						rewritten,
					} => {
						stale_entries.push(serde_json::json!({
							"file": rel,
							"line": first_changed_line(original, rewritten),
						}));
					}
					DocumentOutcome::Failed(error) => {
						error_entries.push(serde_json::json!({
							"file": rel,
							"line": error.line(),
							"message": error.to_string(),
						}));
					}
					DocumentOutcome::Unchanged => {}
				}
			}
			let output = serde_json::json!({
				"ok": false,
				"stale": stale_entries,
				"errors": error_entries,
			});
			println!("{output}");
		}
		OutputFormat::Github => {
			for report in &summary.reports {
				let rel = make_relative(&report.path, root);
				match &report.outcome {
					DocumentOutcome::Changed {
						original,
						rewritten,
					} => {
						println!(
							"::warning file={rel},line={}::Embedded code is out of date",
							first_changed_line(original, rewritten)
						);
					}
					DocumentOutcome::Failed(error) => {
						println!(
							"::error file={rel},line={}::{error}",
							error.line().unwrap_or(1)
						);
					}
					DocumentOutcome::Unchanged => {}
				}
			}
			eprintln!("{}", check_summary(stale_count, failed_count));
		}
		OutputFormat::Text => {
			eprintln!("Check failed.");
			eprintln!("  failed documents: {failed_count}");
			eprintln!("  stale documents: {stale_count}");

			if stale_count > 0 {
				eprintln!();
				eprintln!("Stale documents:");
				for report in summary.changed() {
					let rel = make_relative(&report.path, root);
					eprintln!("  {rel}");

					if show_diff {
						if let DocumentOutcome::Changed {
							original,
							rewritten,
						} = &report.outcome
						{
							print_diff(original, rewritten);
						}
					}
				}
			}

			if failed_count > 0 {
				eprintln!();
				eprintln!("Failed documents:");
				print_failures(summary, root);
			}

			eprintln!();
			eprintln!("{}", check_summary(stale_count, failed_count));
		}
	}

	if failed_count > 0 {
		process::exit(EXIT_FAILURE);
	}

	process::exit(EXIT_STALE);
}

fn check_summary(stale_count: usize, failed_count: usize) -> String {
	let mut parts = Vec::new();
	if failed_count > 0 {
		parts.push(format!("{failed_count} document(s) failed"));
	}
	if stale_count > 0 {
		parts.push(format!("{stale_count} document(s) are out of date"));
	}
	format!("{}. Run `mdce update` to fix.", parts.join(" and "))
}

fn run_list(args: &MdceCli, format: ListFormat) -> Result<(), Box<dyn std::error::Error>> {
	let workspace = load_workspace(args)?;
	let root = &workspace.root;

	let mut listed = Vec::new();
	let mut failures = Vec::new();
	for path in &workspace.documents {
		let content = std::fs::read_to_string(path)?;
		match Rewriter::directives(&content) {
			Ok(entries) => listed.push((path, entries)),
			Err(error) => failures.push((path, error)),
		}
	}

	let directive_count: usize = listed.iter().map(|(_, entries)| entries.len()).sum();

	match format {
		ListFormat::Json => {
			let directives: Vec<serde_json::Value> = listed
				.iter()
				.flat_map(|(path, entries)| {
					let rel = make_relative(path, root);
					entries.iter().map(move |entry| {
						let mut value = directive_json(&entry.directive);
						value["file"] = serde_json::Value::from(rel.clone());
						value["line"] = serde_json::Value::from(entry.line);
						value
					})
				})
				.collect();
			let errors: Vec<serde_json::Value> = failures
				.iter()
				.map(|(path, error)| {
					serde_json::json!({
						"file": make_relative(path, root),
						"line": error.line(),
						"message": error.to_string(),
					})
				})
				.collect();
			let output = serde_json::json!({
				"directives": directives,
				"errors": errors,
			});
			println!("{output}");
		}
		ListFormat::Text => {
			if directive_count == 0 && failures.is_empty() {
				println!("No directives found.");
				return Ok(());
			}

			for (path, entries) in &listed {
				if entries.is_empty() {
					continue;
				}

				println!("{}", colored!(make_relative(path, root), bold));
				for entry in entries {
					println!(
						"  {}:{} [{}] {}",
						make_relative(path, root),
						entry.line,
						entry.directive.mode_name(),
						entry.directive
					);
				}
			}

			println!(
				"\n{directive_count} directive(s) in {} document(s)",
				listed.iter().filter(|(_, entries)| !entries.is_empty()).count()
			);

			for (path, error) in &failures {
				eprintln!(
					"{} {}: {error}",
					colored!("error:", red),
					make_relative(path, root)
				);
			}
		}
	}

	if !failures.is_empty() {
		process::exit(EXIT_FAILURE);
	}

	Ok(())
}

fn directive_json(directive: &Directive) -> serde_json::Value {
	match directive {
		Directive::StaticSlice(slice) => {
			serde_json::json!({
				"mode": directive.mode_name(),
				"target": slice.target,
				"start": slice.start,
				"end": slice.end,
				"indent": slice.indent.map(|unit| unit.to_string()),
			})
		}
		Directive::Run(run) => {
			serde_json::json!({
				"mode": directive.mode_name(),
				"target": run.target,
				"args": run.args,
				"timeout": run.timeout.map(|timeout| timeout.as_secs()),
			})
		}
	}
}

/// Print every failed document with its diagnostic.
fn print_failures(summary: RunSummary, root: &Path) {
	for report in summary.reports {
		let DocumentOutcome::Failed(error) = report.outcome else {
			continue;
		};

		eprintln!(
			"{} {}",
			colored!("failed:", yellow),
			make_relative(&report.path, root)
		);
		let report = miette::Report::new(error);
		eprintln!("{report:?}");
	}
}

/// The 1-indexed line of the first difference between two texts.
fn first_changed_line(current: &str, expected: &str) -> usize {
	current
		.lines()
		.zip(expected.lines())
		.position(|(left, right)| left != right)
		.unwrap_or_else(|| current.lines().count().min(expected.lines().count()))
		+ 1
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}

/// Make a path relative to root for display purposes.
fn make_relative(path: &Path, root: &Path) -> String {
	path.strip_prefix(root)
		.unwrap_or(path)
		.display()
		.to_string()
}
