use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use globset::Glob;
use globset::GlobMatcher;
use ignore::WalkBuilder;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Regenerate annotated code blocks in place from schemas and templates.",
	long_about = "knit finds blocks between `@+knit` and `@!knit` markers, reads the `@knit` \
	              directives above each block, renders the named template against the loaded \
	              schema, and writes the result back between the markers.\n\nExamples:\n  knit \
	              models.go              Regenerate one file\n  knit 'src/**/*.rs'          \
	              Regenerate every matching file\n  knit --check 'src/**/*.rs'  Fail if anything \
	              is out of date\n  knit generate -l json -i schema.json -t model.tmpl",
	args_conflicts_with_subcommands = true
)]
#[allow(clippy::struct_excessive_bools)]
pub struct KnitCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Files or glob patterns to regenerate. Globs are matched against paths
	/// relative to the working directory and respect `.gitignore`.
	#[arg(value_name = "PATTERNS")]
	pub patterns: Vec<String>,

	/// Do not run the formatter for recognized file extensions.
	#[arg(long, default_value_t = false)]
	pub no_format: bool,

	/// Process files one at a time, in argument order.
	#[arg(long, default_value_t = false)]
	pub sequential: bool,

	/// Report files that would change without writing them. Exits with a
	/// non-zero status when any file is out of date.
	#[arg(long, default_value_t = false)]
	pub check: bool,

	/// Print a unified diff for each out of date file.
	#[arg(long, default_value_t = false, requires = "check")]
	pub diff: bool,

	/// Fail when a directive references an unset environment variable.
	#[arg(long, default_value_t = false)]
	pub strict_env: bool,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Render a template against a schema and print the result.
	///
	/// Nothing is written to disk. When `--loader` is omitted the loader is
	/// chosen from the input file extension.
	#[command(visible_alias = "gen")]
	Generate {
		/// Loader type: json, yaml, yml, graphql or openapi3.
		#[arg(long, short)]
		loader: Option<String>,

		/// Path to the schema input.
		#[arg(long, short)]
		input: PathBuf,

		/// Path to the template.
		#[arg(long, short)]
		template: PathBuf,

		/// Template variable exposed as `vars.NAME`. Can be repeated.
		#[arg(long = "var", value_name = "NAME=VALUE")]
		vars: Vec<String>,
	},
}

/// Turn command line patterns into a list of files under `root`.
///
/// A pattern naming an existing file is taken as is. Anything else is a glob
/// matched against every non-ignored file below `root`. Files keep the order
/// of the patterns that produced them; glob matches are sorted.
pub fn expand_patterns(root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>, globset::Error> {
	let mut matchers: Vec<(usize, GlobMatcher)> = Vec::new();
	let mut expanded: Vec<Vec<PathBuf>> = vec![Vec::new(); patterns.len()];

	for (index, pattern) in patterns.iter().enumerate() {
		let candidate = root.join(pattern);
		if candidate.is_file() {
			expanded[index].push(candidate);
		} else {
			matchers.push((index, Glob::new(pattern)?.compile_matcher()));
		}
	}

	if !matchers.is_empty() {
		for file in walk_files(root) {
			let Ok(relative) = file.strip_prefix(root) else {
				continue;
			};
			for (index, matcher) in &matchers {
				if matcher.is_match(relative) {
					expanded[*index].push(file.clone());
				}
			}
		}
	}

	for (index, files) in expanded.iter().enumerate() {
		if files.is_empty() {
			tracing::warn!(pattern = %patterns[index], "pattern matched no files");
		}
	}

	Ok(expanded.into_iter().flatten().collect())
}

fn walk_files(root: &Path) -> Vec<PathBuf> {
	let mut files: Vec<PathBuf> = WalkBuilder::new(root)
		.build()
		.filter_map(Result::ok)
		.filter(|entry| entry.file_type().is_some_and(|kind| kind.is_file()))
		.map(ignore::DirEntry::into_path)
		.collect();
	files.sort();
	files
}

/// Split a `NAME=VALUE` pair from `--var`.
pub fn parse_var(raw: &str) -> Option<(&str, &str)> {
	raw.split_once('=').filter(|(name, _)| !name.is_empty())
}
