use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::EnvPolicy;
use crate::FormatterCommand;
use crate::Formatters;
use crate::KnitError;
use crate::KnitOptions;
use crate::KnitResult;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = ["knit.toml", ".knit.toml", ".config/knit.toml"];

/// Configuration loaded from a `knit.toml` file.
///
/// ```toml
/// format = true
/// parallel = false
/// strict_env = true
///
/// [formatters.ts]
/// command = "prettier"
/// args = ["--parser", "typescript"]
/// ```
///
/// Entries under `[formatters]` replace the built-in formatter for the same
/// extension and add new ones for any other extension.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct KnitConfig {
	/// Run the extension formatter over regenerated files.
	#[serde(default = "default_true")]
	pub format: bool,
	/// Process files concurrently.
	#[serde(default = "default_true")]
	pub parallel: bool,
	/// Fail on unset environment variables instead of expanding them to the
	/// empty string.
	#[serde(default)]
	pub strict_env: bool,
	#[serde(default)]
	pub formatters: BTreeMap<String, FormatterCommand>,
}

impl Default for KnitConfig {
	fn default() -> Self {
		Self {
			format: true,
			parallel: true,
			strict_env: false,
			formatters: BTreeMap::new(),
		}
	}
}

fn default_true() -> bool {
	true
}

impl KnitConfig {
	/// Resolve the config path from known discovery candidates.
	#[must_use]
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if no config file exists.
	pub fn load(root: &Path) -> KnitResult<Option<KnitConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		tracing::debug!(path = %config_path.display(), "loading config");
		let content = std::fs::read_to_string(&config_path)?;
		Self::parse(&content).map(Some)
	}

	pub fn parse(content: &str) -> KnitResult<KnitConfig> {
		toml::from_str(content).map_err(|e| KnitError::ConfigParse(e.to_string()))
	}

	/// Runtime options for the driver. `check` always starts disabled.
	pub fn options(&self) -> KnitOptions {
		let mut formatters = Formatters::builtin();
		formatters.extend(self.formatters.clone());

		KnitOptions {
			format: self.format,
			parallel: self.parallel,
			check: false,
			env_policy: if self.strict_env {
				EnvPolicy::Strict
			} else {
				EnvPolicy::Empty
			},
			formatters,
		}
	}
}
