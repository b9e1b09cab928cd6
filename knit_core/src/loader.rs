use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde_json::Value;

use crate::KnitError;
use crate::KnitResult;
use crate::graphql;
use crate::openapi;

/// A schema loader. The set of loaders is closed; each variant turns raw
/// input bytes into a generic [`Value`] that templates can traverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Loader {
	Json,
	Yaml,
	Graphql,
	OpenApi3,
}

/// Loader type tokens recognized in `@knit loader` directives. Lookups are
/// case sensitive. The table is fixed at compile time.
pub const LOADERS: &[(&str, Loader)] = &[
	("json", Loader::Json),
	("yaml", Loader::Yaml),
	("yml", Loader::Yaml),
	("graphql", Loader::Graphql),
	("openapi3", Loader::OpenApi3),
];

impl Loader {
	/// Look up a loader by its type token.
	pub fn resolve(name: &str) -> KnitResult<Self> {
		LOADERS
			.iter()
			.find(|(token, _)| *token == name)
			.map(|(_, loader)| *loader)
			.ok_or_else(|| KnitError::UnknownLoader(name.to_string()))
	}

	/// Guess a loader from a file extension. Used only by callers that take a
	/// bare input path, never by the directive pipeline.
	pub fn from_extension(path: &Path) -> Option<Self> {
		let extension = path.extension()?.to_str()?.to_ascii_lowercase();
		match extension.as_str() {
			"json" => Some(Self::Json),
			"yaml" | "yml" => Some(Self::Yaml),
			"graphql" | "graphqls" | "gql" => Some(Self::Graphql),
			_ => None,
		}
	}

	pub fn name(self) -> &'static str {
		match self {
			Self::Json => "json",
			Self::Yaml => "yaml",
			Self::Graphql => "graphql",
			Self::OpenApi3 => "openapi3",
		}
	}

	/// Decode `bytes` into a template value.
	pub fn load(self, bytes: &[u8]) -> KnitResult<Value> {
		tracing::debug!(loader = self.name(), bytes = bytes.len(), "loading input");

		match self {
			Self::Json => serde_json::from_slice(bytes).map_err(|e| self.error(e)),
			Self::Yaml => serde_yaml_ng::from_slice(bytes).map_err(|e| self.error(e)),
			Self::Graphql => {
				let source = std::str::from_utf8(bytes).map_err(|e| self.error(e))?;
				graphql::load_schema(source).map_err(|reason| self.error(reason))
			}
			Self::OpenApi3 => openapi::load_document(bytes).map_err(|reason| self.error(reason)),
		}
	}

	fn error(self, reason: impl fmt::Display) -> KnitError {
		KnitError::Load {
			loader: self.name().to_string(),
			reason: reason.to_string(),
		}
	}
}

impl fmt::Display for Loader {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

impl FromStr for Loader {
	type Err = KnitError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::resolve(s)
	}
}
