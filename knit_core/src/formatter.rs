use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::process::Stdio;

use serde::Deserialize;
use serde::Serialize;

use crate::KnitError;
use crate::KnitResult;

/// An external command that reads source text on stdin and prints the
/// canonical form on stdout.
///
/// ```toml
/// [formatters.ts]
/// command = "prettier"
/// args = ["--parser", "typescript"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatterCommand {
	pub command: String,
	#[serde(default)]
	pub args: Vec<String>,
}

impl FormatterCommand {
	pub fn new<I, S>(command: impl Into<String>, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			command: command.into(),
			args: args.into_iter().map(Into::into).collect(),
		}
	}

	/// The full command line, for messages.
	pub fn display(&self) -> String {
		std::iter::once(self.command.as_str())
			.chain(self.args.iter().map(String::as_str))
			.collect::<Vec<_>>()
			.join(" ")
	}

	/// Pipe `text` through the command. `path` is only used for errors.
	pub fn run(&self, path: &Path, text: &str) -> KnitResult<String> {
		tracing::debug!(path = %path.display(), command = %self.display(), "formatting");

		let mut child = Command::new(&self.command)
			.args(&self.args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.spawn()
			.map_err(|e| self.error(path, e))?;

		let mut stdin = child
			.stdin
			.take()
			.ok_or_else(|| self.error(path, "stdin was not captured"))?;

		// stdin is written concurrently with reading stdout, otherwise a full
		// pipe deadlocks.
		let (output, written) = std::thread::scope(|scope| {
			let writer = scope.spawn(move || stdin.write_all(text.as_bytes()));
			let output = child.wait_with_output();
			(output, writer.join())
		});

		let output = output.map_err(|e| self.error(path, e))?;
		if !output.status.success() {
			let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
			let reason = if stderr.is_empty() {
				format!(
					"command exited with status {}",
					output
						.status
						.code()
						.map_or_else(|| "unknown".to_string(), |code| code.to_string())
				)
			} else {
				stderr
			};
			return Err(self.error(path, reason));
		}

		match written {
			Ok(Ok(())) => {}
			Ok(Err(e)) => return Err(self.error(path, e)),
			Err(_) => return Err(self.error(path, "stdin writer panicked")),
		}

		String::from_utf8(output.stdout).map_err(|e| self.error(path, e))
	}

	fn error(&self, path: &Path, reason: impl std::fmt::Display) -> KnitError {
		KnitError::Format {
			path: path.to_path_buf(),
			command: self.display(),
			reason: reason.to_string(),
		}
	}
}

/// Formatters keyed by file extension (without the dot).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formatters {
	by_extension: BTreeMap<String, FormatterCommand>,
}

impl Default for Formatters {
	fn default() -> Self {
		Self::builtin()
	}
}

impl Formatters {
	/// `rustfmt` for `.rs` files and `gofmt` for `.go` files.
	pub fn builtin() -> Self {
		let mut formatters = Self::empty();
		formatters.insert(
			"rs",
			FormatterCommand::new("rustfmt", ["--edition", "2024", "--emit", "stdout"]),
		);
		formatters.insert("go", FormatterCommand::new("gofmt", Vec::<String>::new()));
		formatters
	}

	pub fn empty() -> Self {
		Self {
			by_extension: BTreeMap::new(),
		}
	}

	/// Add or replace the formatter for `extension`.
	pub fn insert(&mut self, extension: impl Into<String>, command: FormatterCommand) {
		self.by_extension.insert(extension.into(), command);
	}

	pub fn get(&self, extension: &str) -> Option<&FormatterCommand> {
		self.by_extension.get(extension)
	}

	pub fn for_path(&self, path: &Path) -> Option<&FormatterCommand> {
		let extension = path.extension()?.to_str()?;
		self.get(extension)
	}

	pub fn extensions(&self) -> impl Iterator<Item = &str> {
		self.by_extension.keys().map(String::as_str)
	}

	/// Format `text` when `path` has a known extension. Unknown extensions
	/// return the text unchanged.
	pub fn format(&self, path: &Path, text: String) -> KnitResult<String> {
		match self.for_path(path) {
			Some(formatter) => formatter.run(path, &text),
			None => Ok(text),
		}
	}
}

impl Extend<(String, FormatterCommand)> for Formatters {
	fn extend<T: IntoIterator<Item = (String, FormatterCommand)>>(&mut self, iter: T) {
		self.by_extension.extend(iter);
	}
}

