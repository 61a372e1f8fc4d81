use std::path::Path;
use std::path::PathBuf;

use crate::MdceError;
use crate::MdceResult;
use crate::RewriteOptions;
use crate::RewriteStatus;
use crate::resolver::Resolve;
use crate::transaction::DocumentTransaction;

/// What happened to one document.
#[derive(Debug)]
#[allow(variant_size_differences)]
pub enum DocumentOutcome {
	Unchanged,
	Changed { original: String, rewritten: String },
	Failed(MdceError),
}

#[derive(Debug)]
pub struct DocumentReport {
	pub path: PathBuf,
	pub outcome: DocumentOutcome,
}

/// Outcomes for every processed document, in processing order.
#[derive(Debug, Default)]
pub struct RunSummary {
	pub reports: Vec<DocumentReport>,
}

impl RunSummary {
	pub fn changed(&self) -> impl Iterator<Item = &DocumentReport> {
		self.reports
			.iter()
			.filter(|report| matches!(report.outcome, DocumentOutcome::Changed { .. }))
	}

	pub fn unchanged(&self) -> impl Iterator<Item = &DocumentReport> {
		self.reports
			.iter()
			.filter(|report| matches!(report.outcome, DocumentOutcome::Unchanged))
	}

	/// Failed documents paired with their error.
	pub fn failed(&self) -> impl Iterator<Item = (&Path, &MdceError)> {
		self.reports.iter().filter_map(|report| {
			match &report.outcome {
				DocumentOutcome::Failed(error) => Some((report.path.as_path(), error)),
				_ => None,
			}
		})
	}

	pub fn changed_count(&self) -> usize {
		self.changed().count()
	}

	pub fn failed_count(&self) -> usize {
		self.failed().count()
	}

	/// Returns true when no document failed.
	pub fn is_ok(&self) -> bool {
		self.failed_count() == 0
	}
}

/// Rewrite each document in turn. A failure is recorded and the next
/// document is still processed.
pub fn process_documents(
	paths: &[PathBuf],
	options: &RewriteOptions,
	resolver: &dyn Resolve,
) -> RunSummary {
	let mut summary = RunSummary::default();

	for path in paths {
		tracing::debug!(path = %path.display(), "processing document");
		let outcome = match process_one(path, options, resolver) {
			Ok(outcome) => outcome,
			Err(error) => {
				tracing::warn!(path = %path.display(), %error, "document failed");
				DocumentOutcome::Failed(error)
			}
		};

		summary.reports.push(DocumentReport {
			path: path.clone(),
			outcome,
		});
	}

	summary
}

fn process_one(
	path: &Path,
	options: &RewriteOptions,
	resolver: &dyn Resolve,
) -> MdceResult<DocumentOutcome> {
	let transaction = DocumentTransaction::prepare(path, resolver)?;

	match transaction.commit(options)? {
		RewriteStatus::Unchanged => Ok(DocumentOutcome::Unchanged),
		RewriteStatus::Changed => {
			let (_, original, rewritten) = transaction.into_parts();
			Ok(DocumentOutcome::Changed {
				original,
				rewritten,
			})
		}
	}
}
