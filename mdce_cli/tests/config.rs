mod common;

use mdce_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;
use rstest::rstest;
use similar_asserts::assert_eq;

#[rstest]
#[case::root("mdce.toml")]
#[case::dotfile(".mdce.toml")]
#[case::config_dir(".config/mdce.toml")]
fn config_document_patterns_are_used(#[case] location: &str) -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let config = tmp.path().join(location);
	if let Some(parent) = config.parent() {
		std::fs::create_dir_all(parent)?;
	}
	std::fs::write(&config, "[documents]\npatterns = [\"guide.md\"]\n")?;
	common::project(tmp.path(), common::STALE_README)?;
	std::fs::write(tmp.path().join("guide.md"), "```rust:src/lib.rs [1]\n```\n")?;

	common::mdce_cmd()
		.arg("update")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("guide.md"));

	let guide = std::fs::read_to_string(tmp.path().join("guide.md"))?;
	assert_eq!(guide, "```rust:src/lib.rs [1]\npub fn one() {}\n```\n");
	let readme = std::fs::read_to_string(tmp.path().join("README.md"))?;
	assert_eq!(readme, common::STALE_README);

	Ok(())
}

#[test]
fn config_backup_section_enables_backups() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("mdce.toml"),
		"[backup]\nenabled = true\nsuffix = \".old\"\n",
	)?;
	common::project(tmp.path(), common::STALE_README)?;

	common::mdce_cmd()
		.arg("update")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	let backup = std::fs::read_to_string(tmp.path().join("README.md.old"))?;
	assert_eq!(backup, common::STALE_README);

	Ok(())
}

#[test]
fn config_exclude_patterns_skip_documents() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("mdce.toml"),
		"[exclude]\npatterns = [\"vendor/\"]\n",
	)?;
	common::project(tmp.path(), common::FRESH_README)?;
	std::fs::create_dir_all(tmp.path().join("vendor"))?;
	std::fs::write(tmp.path().join("vendor/README.md"), "```rust:missing.rs\n```\n")?;

	common::mdce_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success();

	Ok(())
}

#[test]
fn invalid_config_is_a_setup_error() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("mdce.toml"), "recursive = \"yes\"\n")?;
	common::project(tmp.path(), common::FRESH_README)?;

	common::mdce_cmd()
		.arg("check")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.code(2)
		.stderr(predicates::str::contains("mdce.toml").or(predicates::str::contains("recursive")));

	Ok(())
}
