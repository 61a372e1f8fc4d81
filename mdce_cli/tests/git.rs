mod common;

use std::path::Path;
use std::process::Command;

use mdce_core::AnyEmptyResult;
use similar_asserts::assert_eq;

fn git_available() -> bool {
	Command::new("git").arg("--version").output().is_ok()
}

/// Run git in `dir` with an isolated configuration.
fn git(dir: &Path, args: &[&str]) -> std::io::Result<String> {
	let output = Command::new("git")
		.args(args)
		.current_dir(dir)
		.env("GIT_CONFIG_GLOBAL", "/dev/null")
		.env("GIT_CONFIG_NOSYSTEM", "1")
		.output()?;
	assert!(
		output.status.success(),
		"git {args:?} failed: {}",
		String::from_utf8_lossy(&output.stderr)
	);
	Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn mdce_in_git(dir: &Path) -> assert_cmd::Command {
	let mut cmd = common::mdce_cmd();
	cmd.env("GIT_CONFIG_GLOBAL", "/dev/null")
		.env("GIT_CONFIG_NOSYSTEM", "1")
		.env("GIT_AUTHOR_NAME", "mdce")
		.env("GIT_AUTHOR_EMAIL", "mdce@example.com")
		.env("GIT_COMMITTER_NAME", "mdce")
		.env("GIT_COMMITTER_EMAIL", "mdce@example.com");
	if let Some(parent) = dir.parent() {
		cmd.env("GIT_CEILING_DIRECTORIES", parent);
	}
	cmd
}

#[test]
fn update_commit_records_changed_documents() -> AnyEmptyResult {
	if !git_available() {
		return Ok(());
	}

	let tmp = tempfile::tempdir()?;
	common::project(tmp.path(), common::STALE_README)?;
	git(tmp.path(), &["init", "--quiet"])?;

	mdce_in_git(tmp.path())
		.arg("update")
		.arg("--commit")
		.arg("--message")
		.arg("docs: sync samples")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("README.md (untracked)"))
		.stdout(predicates::str::contains("Committed 1 document(s)."));

	let subject = git(tmp.path(), &["log", "-1", "--format=%s"])?;
	assert_eq!(subject.trim(), "docs: sync samples");
	let files = git(tmp.path(), &["show", "--name-only", "--format=", "HEAD"])?;
	assert_eq!(files.trim(), "README.md");

	Ok(())
}

#[test]
fn update_commit_outside_repository_fails() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::project(tmp.path(), common::STALE_README)?;

	mdce_in_git(tmp.path())
		.arg("update")
		.arg("--commit")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("not inside a git repository"));

	// The rewrite itself still lands before the commit step.
	let content = std::fs::read_to_string(tmp.path().join("README.md"))?;
	assert_eq!(content, common::FRESH_README);

	Ok(())
}
