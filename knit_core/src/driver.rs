use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use std::time::Instant;

use rayon::prelude::*;

use crate::EnvPolicy;
use crate::Formatters;
use crate::KnitError;
use crate::KnitResult;
use crate::splice;
use crate::splice_blocks;

/// Runtime options for a regeneration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnitOptions {
	/// Run the extension formatter over regenerated files.
	pub format: bool,
	/// Process files concurrently, one task per distinct path.
	pub parallel: bool,
	/// Compute results without writing anything.
	pub check: bool,
	pub env_policy: EnvPolicy,
	pub formatters: Formatters,
}

impl Default for KnitOptions {
	fn default() -> Self {
		Self {
			format: true,
			parallel: true,
			check: false,
			env_policy: EnvPolicy::default(),
			formatters: Formatters::builtin(),
		}
	}
}

/// The outcome of processing one file. Exactly one is reported per file.
#[derive(Debug)]
pub struct ProcessResult {
	pub path: PathBuf,
	/// The file changed on disk, or in check mode would have changed.
	pub modified: bool,
	/// Set when the file failed. A failed file is never written.
	pub error: Option<KnitError>,
	pub elapsed: Duration,
	/// The regenerated text, attached in check mode when it differs from the
	/// file on disk.
	pub output: Option<String>,
}

impl ProcessResult {
	pub fn is_ok(&self) -> bool {
		self.error.is_none()
	}
}

/// Drives regeneration of whole files.
///
/// Relative `input` and `template` paths in every file resolve against one
/// root directory, the working directory unless [`Knit::with_root`] sets it.
#[derive(Debug, Clone, Default)]
pub struct Knit {
	options: KnitOptions,
	root: Option<PathBuf>,
}

impl Knit {
	pub fn new(options: KnitOptions) -> Self {
		Self {
			options,
			root: None,
		}
	}

	#[must_use]
	pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
		self.root = Some(root.into());
		self
	}

	pub fn options(&self) -> &KnitOptions {
		&self.options
	}

	/// The directory relative paths resolve against.
	pub fn root(&self) -> KnitResult<PathBuf> {
		match &self.root {
			Some(root) => Ok(root.clone()),
			None => Ok(std::env::current_dir()?),
		}
	}

	/// Regenerate every block in `text` without touching the filesystem
	/// beyond reading referenced inputs and templates. Relative paths resolve
	/// against `base_dir`, or [`Knit::root`] when it is `None`.
	pub fn process_text(&self, text: &str, base_dir: Option<&Path>) -> KnitResult<String> {
		let base_dir = match base_dir {
			Some(dir) => dir.to_path_buf(),
			None => self.root()?,
		};

		splice(text, &base_dir, self.options.env_policy)
	}

	/// Read, regenerate, optionally format and conditionally write one file.
	/// A file without blocks is never formatted or written.
	pub fn process_file(&self, path: &Path) -> ProcessResult {
		let started = Instant::now();
		tracing::debug!(path = %path.display(), "processing file");

		let (modified, error, output) = match self.regenerate(path) {
			Ok(Regenerated { modified, output }) => (modified, None, output),
			Err(error) => {
				tracing::debug!(path = %path.display(), %error, "file failed");
				(false, Some(error), None)
			}
		};

		ProcessResult {
			path: path.to_path_buf(),
			modified,
			error,
			elapsed: started.elapsed(),
			output,
		}
	}

	/// Process every path and hand each result to `on_result` exactly once.
	///
	/// Duplicate paths are dropped, keeping the first occurrence. In parallel
	/// mode results arrive in completion order; otherwise in argument order.
	/// All work is finished when this returns.
	pub fn process_files<F>(&self, paths: &[PathBuf], on_result: F)
	where
		F: Fn(ProcessResult) + Sync + Send,
	{
		let paths = distinct_paths(paths);
		tracing::info!(files = paths.len(), parallel = self.options.parallel, "processing files");

		if self.options.parallel {
			paths
				.par_iter()
				.for_each(|path| on_result(self.process_file(path)));
		} else {
			for path in &paths {
				on_result(self.process_file(path));
			}
		}
	}

	/// Like [`Knit::process_files`] but collects the results in argument
	/// order.
	pub fn collect(&self, paths: &[PathBuf]) -> Vec<ProcessResult> {
		let paths = distinct_paths(paths);

		if self.options.parallel {
			paths.par_iter().map(|path| self.process_file(path)).collect()
		} else {
			paths.iter().map(|path| self.process_file(path)).collect()
		}
	}

	fn regenerate(&self, path: &Path) -> KnitResult<Regenerated> {
		let original = std::fs::read_to_string(path).map_err(|source| {
			KnitError::Read {
				path: path.to_path_buf(),
				source,
			}
		})?;

		let spliced = splice_blocks(&original, &self.root()?, self.options.env_policy)?;
		if spliced.blocks == 0 {
			tracing::debug!(path = %path.display(), "no blocks, leaving file as is");
			return Ok(Regenerated {
				modified: false,
				output: None,
			});
		}

		let mut text = spliced.text;
		if self.options.format {
			text = self.options.formatters.format(path, text)?;
		}

		let modified = fingerprint(&original) != fingerprint(&text);
		if !modified {
			tracing::debug!(path = %path.display(), "unchanged, skipping write");
			return Ok(Regenerated {
				modified,
				output: None,
			});
		}

		if self.options.check {
			return Ok(Regenerated {
				modified,
				output: Some(text),
			});
		}

		std::fs::write(path, &text).map_err(|source| {
			KnitError::Write {
				path: path.to_path_buf(),
				source,
			}
		})?;
		tracing::info!(path = %path.display(), "updated");

		Ok(Regenerated {
			modified,
			output: None,
		})
	}
}

struct Regenerated {
	modified: bool,
	output: Option<String>,
}

/// 64-bit content hash used to decide whether a file needs writing.
pub fn fingerprint(text: &str) -> u64 {
	let mut hasher = DefaultHasher::new();
	text.hash(&mut hasher);
	hasher.finish()
}

/// Drop paths that point at an already listed file, keeping argument order.
fn distinct_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
	let mut seen = HashSet::new();
	paths
		.iter()
		.filter(|path| {
			let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
			seen.insert(key)
		})
		.cloned()
		.collect()
}
