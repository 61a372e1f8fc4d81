#![allow(dead_code)]

use std::path::Path;

use assert_cmd::Command;
use insta_cmd::get_cargo_bin;

pub const LIB_RS: &str = "pub fn one() {}\npub fn two() {}\npub fn three() {}\n";

pub const STALE_README: &str = "# Demo\n\n```rust:src/lib.rs [2-3]\nold body\n```\n";

pub const FRESH_README: &str =
	"# Demo\n\n```rust:src/lib.rs [2-3]\npub fn two() {}\npub fn three() {}\n```\n";

pub fn mdce_cmd() -> Command {
	let mut cmd = Command::new(get_cargo_bin("mdce"));
	cmd.env("NO_COLOR", "1").env_remove("MDCE_LOG");
	cmd
}

/// A project with `src/lib.rs` and a `README.md` embedding two of its lines.
pub fn project(dir: &Path, readme: &str) -> std::io::Result<()> {
	std::fs::create_dir_all(dir.join("src"))?;
	std::fs::write(dir.join("src/lib.rs"), LIB_RS)?;
	std::fs::write(dir.join("README.md"), readme)
}
