use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum KnitError {
	#[error(transparent)]
	#[diagnostic(code(knit::io_error))]
	Io(#[from] std::io::Error),

	#[error("malformed directive at line {line}: {reason}")]
	#[diagnostic(
		code(knit::directive_parse),
		help("directives have the shape `@knit <kind> <value>` optionally followed by a `literal`")
	)]
	DirectiveParse { line: usize, reason: String },

	#[error("unknown directive kind `{kind}` at line {line}")]
	#[diagnostic(
		code(knit::unknown_directive),
		help("available directive kinds: input, loader, template, variable")
	)]
	UnknownDirective { kind: String, line: usize },

	#[error("environment variable `{name}` is not set")]
	#[diagnostic(
		code(knit::unresolved_env_var),
		help("export the variable or disable strict environment expansion")
	)]
	UnresolvedEnvVar { name: String },

	#[error("unknown loader type: `{0}`")]
	#[diagnostic(
		code(knit::unknown_loader),
		help("available loaders: json, yaml, yml, graphql, openapi3")
	)]
	UnknownLoader(String),

	#[error("no loader specified")]
	#[diagnostic(
		code(knit::missing_loader),
		help("add `@knit loader <type>` or give the input literal a loader type: `@knit input json`...``")
	)]
	MissingLoader,

	#[error("missing {missing}")]
	#[diagnostic(code(knit::validation))]
	Validation { missing: String },

	#[error("failed to load input file `{path}`: {source}")]
	#[diagnostic(code(knit::input_load))]
	InputLoad {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to load template file `{path}`: {source}")]
	#[diagnostic(code(knit::template_load))]
	TemplateLoad {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse template: {0}")]
	#[diagnostic(code(knit::template_parse))]
	TemplateParse(String),

	#[error("`{loader}` loader failed: {reason}")]
	#[diagnostic(code(knit::load))]
	Load { loader: String, reason: String },

	#[error("template rendering failed: {0}")]
	#[diagnostic(code(knit::render))]
	Render(String),

	#[error("begin marker at line {line} has no matching end marker")]
	#[diagnostic(
		code(knit::unterminated_block),
		help("close the block with an `@!knit` marker before the next `@+knit`")
	)]
	UnterminatedBlock { line: usize },

	#[error("block {index} (line {line}): {source}")]
	#[diagnostic(code(knit::block))]
	Block {
		index: usize,
		line: usize,
		#[source]
		source: Box<KnitError>,
	},

	#[error("failed to format `{path}` with `{command}`: {reason}")]
	#[diagnostic(
		code(knit::format),
		help("fix the template output or run with `--no-format` to inspect it")
	)]
	Format {
		path: PathBuf,
		command: String,
		reason: String,
	},

	#[error("failed to read `{path}`: {source}")]
	#[diagnostic(code(knit::read))]
	Read {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to write `{path}`: {source}")]
	#[diagnostic(code(knit::write))]
	Write {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(knit::config_parse),
		help("check that knit.toml is valid TOML with top level flags and/or [formatters] tables")
	)]
	ConfigParse(String),
}

impl KnitError {
	/// Strip any `Block` context wrappers and return the underlying error.
	pub fn root(&self) -> &KnitError {
		match self {
			Self::Block { source, .. } => source.root(),
			other => other,
		}
	}

	pub(crate) fn in_block(self, index: usize, line: usize) -> Self {
		Self::Block {
			index,
			line,
			source: Box::new(self),
		}
	}
}

pub type KnitResult<T> = Result<T, KnitError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
