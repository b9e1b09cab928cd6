#![allow(dead_code)]

use std::path::Path;
use std::path::PathBuf;

use assert_cmd::Command;

pub fn knit_cmd(dir: &Path) -> Command {
	let mut cmd = Command::new(env!("CARGO_BIN_EXE_knit"));
	cmd.current_dir(dir).env("NO_COLOR", "1").env_remove("RUST_LOG");
	cmd
}

pub fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
	let path = dir.join(name);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create_dir_all: {e}"));
	}
	std::fs::write(&path, content).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
	path
}

pub fn read(path: &Path) -> String {
	std::fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {e}", path.display()))
}

/// A Go file whose single block renders `name` from an inline JSON literal.
pub fn name_file(name: &str) -> String {
	format!(
		"package models\n\n// @knit input json`{{\"name\":\"{name}\"}}`\n// @knit template `const \
		 Name = \"{{{{ name }}}}\"`\n// @+knit\n// @!knit\n"
	)
}

pub fn generated_name_file(name: &str) -> String {
	name_file(name).replace("// @!knit", &format!("const Name = \"{name}\"\n// @!knit"))
}
