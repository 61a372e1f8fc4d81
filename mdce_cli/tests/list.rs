mod common;

use mdce_core::AnyEmptyResult;
use serde_json::Value;
use similar_asserts::assert_eq;

#[test]
fn list_shows_every_directive() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::project(tmp.path(), common::STALE_README)?;
	std::fs::create_dir_all(tmp.path().join("docs"))?;
	std::fs::write(
		tmp.path().join("docs/README.md"),
		"```text:run.sh --run --args \"a b\"\n```\n",
	)?;

	common::mdce_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("README.md:3 [slice] src/lib.rs"))
		.stdout(predicates::str::contains("docs/README.md:1 [run] run.sh"))
		.stdout(predicates::str::contains("2 directive(s) in 2 document(s)"));

	Ok(())
}

#[test]
fn list_without_directives() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("README.md"), "# Nothing here\n")?;

	common::mdce_cmd()
		.arg("list")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.stdout(predicates::str::contains("No directives found."));

	Ok(())
}

#[test]
fn list_json_describes_directives() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("README.md"),
		"```cpp:include/api.h --start 14 --end 17 --indent s2\n```\n\n```text:demo.sh --run \
		 --timeout 5\n```\n",
	)?;

	let output = common::mdce_cmd()
		.arg("list")
		.arg("--format")
		.arg("json")
		.arg("--path")
		.arg(tmp.path())
		.assert()
		.success()
		.get_output()
		.stdout
		.clone();

	let report: Value = serde_json::from_slice(&output)?;
	let slice = &report["directives"][0];
	assert_eq!(slice["file"], Value::from("README.md"));
	assert_eq!(slice["line"], Value::from(1));
	assert_eq!(slice["mode"], Value::from("slice"));
	assert_eq!(slice["target"], Value::from("include/api.h"));
	assert_eq!(slice["start"], Value::from(14));
	assert_eq!(slice["end"], Value::from(17));
	assert_eq!(slice["indent"], Value::from("s2"));

	let run = &report["directives"][1];
	assert_eq!(run["line"], Value::from(4));
	assert_eq!(run["mode"], Value::from("run"));
	assert_eq!(run["timeout"], Value::from(5));
	assert_eq!(run["args"], Value::Array(vec![]));

	Ok(())
}
