mod common;

use knit_core::AnyEmptyResult;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;

#[test]
fn regenerates_file_then_reports_unchanged() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let file = common::write(tmp.path(), "models.go", &common::name_file("one"));

	common::knit_cmd(tmp.path())
		.arg("--no-format")
		.arg("models.go")
		.assert()
		.success()
		.stdout(contains("Updated models.go"))
		.stdout(contains("1 updated, 0 unchanged, 0 failed"));
	assert_eq!(common::read(&file), common::generated_name_file("one"));

	common::knit_cmd(tmp.path())
		.arg("--no-format")
		.arg("--verbose")
		.arg("models.go")
		.assert()
		.success()
		.stdout(contains("Unchanged models.go"))
		.stdout(contains("0 updated, 1 unchanged, 0 failed"));
	assert_eq!(common::read(&file), common::generated_name_file("one"));

	Ok(())
}

#[test]
fn check_fails_without_writing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let file = common::write(tmp.path(), "models.go", &common::name_file("one"));

	common::knit_cmd(tmp.path())
		.args(["--no-format", "--check", "--diff", "models.go"])
		.assert()
		.code(1)
		.stdout(contains("Out of date models.go"))
		.stdout(contains("+const Name = \"one\""))
		.stdout(contains("1 out of date"));
	assert_eq!(common::read(&file), common::name_file("one"));

	Ok(())
}

#[test]
fn check_passes_when_up_to_date() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "models.go", &common::generated_name_file("one"));

	common::knit_cmd(tmp.path())
		.args(["--no-format", "--check", "models.go"])
		.assert()
		.success()
		.stdout(contains("0 out of date, 1 unchanged, 0 failed"));

	Ok(())
}

#[test]
fn glob_patterns_expand_recursively() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let first = common::write(tmp.path(), "src/a.go", &common::name_file("a"));
	let second = common::write(tmp.path(), "src/nested/b.go", &common::name_file("b"));
	let skipped = common::write(tmp.path(), "other/c.go", &common::name_file("c"));

	common::knit_cmd(tmp.path())
		.args(["--no-format", "--sequential", "src/**/*.go"])
		.assert()
		.success()
		.stdout(contains("2 updated"));

	assert_eq!(common::read(&first), common::generated_name_file("a"));
	assert_eq!(common::read(&second), common::generated_name_file("b"));
	assert_eq!(common::read(&skipped), common::name_file("c"));

	Ok(())
}

#[test]
fn failed_file_does_not_stop_others() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let broken_content = "// @knit input ./data.json\n// @knit template `x`\n// @+knit\n// @!knit\n";
	let broken = common::write(tmp.path(), "broken.go", broken_content);
	let good = common::write(tmp.path(), "good.go", &common::name_file("good"));

	common::knit_cmd(tmp.path())
		.args(["--no-format", "broken.go", "good.go"])
		.assert()
		.code(1)
		.stderr(contains("Failed broken.go").and(contains("no loader specified")))
		.stdout(contains("Updated good.go"))
		.stdout(contains("1 updated, 0 unchanged, 1 failed"));

	assert_eq!(common::read(&broken), broken_content);
	assert_eq!(common::read(&good), common::generated_name_file("good"));

	Ok(())
}

#[test]
fn unterminated_block_fails_the_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let content = "// @knit input json`{}`\n// @knit template `x`\n// @+knit\n";
	let file = common::write(tmp.path(), "a.go", content);

	common::knit_cmd(tmp.path())
		.args(["--no-format", "a.go"])
		.assert()
		.code(1)
		.stderr(contains("no matching end marker"));
	assert_eq!(common::read(&file), content);

	Ok(())
}

#[test]
fn relative_paths_resolve_from_working_directory() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), "schemas/x.json", r#"{"name": "root"}"#);
	let file = common::write(
		tmp.path(),
		"src/a.go",
		"// @knit input ./schemas/x.json\n// @knit loader json\n// @knit template `{{ name }}`\n// \
		 @+knit\n// @!knit\n",
	);

	common::knit_cmd(tmp.path())
		.args(["--no-format", "src/a.go"])
		.assert()
		.success()
		.stdout(contains("Updated src/a.go"));
	assert!(common::read(&file).contains("// @+knit\nroot\n// @!knit"));

	Ok(())
}

#[test]
fn files_without_blocks_are_left_alone() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(
		tmp.path(),
		"knit.toml",
		"[formatters.txt]\ncommand = \"tr\"\nargs = [\"a-z\", \"A-Z\"]\n",
	);
	let content = "package main\nfunc main() {}\n";
	let file = common::write(tmp.path(), "plain.txt", content);

	common::knit_cmd(tmp.path())
		.arg("plain.txt")
		.assert()
		.success()
		.stdout(contains("0 updated, 1 unchanged, 0 failed"));
	assert_eq!(common::read(&file), content);

	Ok(())
}

#[test]
fn environment_variables_expand_in_directive_values() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	let schema = common::write(tmp.path(), "schemas/x.yml", "test:\n  a: 1\n  c: 2\n");
	let file = common::write(
		tmp.path(),
		"models.go",
		"// @knit input $SCHEMA_FILE\n// @knit loader yml\n// @knit template `{% for key in test \
		 %}{{ key }} string\n{% endfor %}`\n// @+knit\n// @!knit\n",
	);

	common::knit_cmd(tmp.path())
		.env("SCHEMA_FILE", &schema)
		.args(["--no-format", "models.go"])
		.assert()
		.success();
	assert!(common::read(&file).contains("// @+knit\na string\nc string\n// @!knit"));

	Ok(())
}

#[test]
fn strict_env_rejects_unset_variables() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(
		tmp.path(),
		"models.go",
		"// @knit input $KNIT_TEST_UNSET_SCHEMA\n// @knit loader yml\n// @knit template `x`\n// \
		 @+knit\n// @!knit\n",
	);

	common::knit_cmd(tmp.path())
		.env_remove("KNIT_TEST_UNSET_SCHEMA")
		.args(["--no-format", "--strict-env", "models.go"])
		.assert()
		.code(1)
		.stderr(contains("KNIT_TEST_UNSET_SCHEMA"));

	Ok(())
}

#[test]
fn config_formatters_apply_by_extension() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(
		tmp.path(),
		"knit.toml",
		"parallel = false\n\n[formatters.txt]\ncommand = \"tr\"\nargs = [\"a-z\", \"A-Z\"]\n",
	);
	let file = common::write(tmp.path(), "notes.txt", &common::name_file("loud"));

	common::knit_cmd(tmp.path()).arg("notes.txt").assert().success();
	assert!(common::read(&file).contains("CONST NAME = \"LOUD\""));

	Ok(())
}

#[test]
fn invalid_config_is_a_usage_error() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	common::write(tmp.path(), ".knit.toml", "format = \"yes\"\n");
	common::write(tmp.path(), "a.go", &common::name_file("a"));

	common::knit_cmd(tmp.path())
		.arg("a.go")
		.assert()
		.code(2)
		.stderr(contains("knit::config_parse"));

	Ok(())
}

#[test]
fn missing_patterns_is_a_usage_error() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::knit_cmd(tmp.path())
		.assert()
		.code(2)
		.stderr(contains("no files or patterns given"));

	Ok(())
}

#[test]
fn diff_requires_check() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	common::knit_cmd(tmp.path())
		.args(["--diff", "a.go"])
		.assert()
		.code(2);

	Ok(())
}
