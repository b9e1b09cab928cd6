use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;

use minijinja::Environment;
use minijinja::UndefinedBehavior;
use minijinja::Value;

use crate::Directive;
use crate::DirectiveKind;
use crate::KnitError;
use crate::KnitResult;
use crate::Loader;
use crate::filters;

const TEMPLATE_NAME: &str = "knit";

/// Where an input or template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
	/// A file on disk, already resolved against the base directory.
	Path(PathBuf),
	/// An inline literal taken from the directive itself.
	Literal(String),
}

/// Everything needed to generate one block: a loader, an input, a template
/// and any template variables. Built fresh for every block and never shared.
#[derive(Debug, Clone)]
pub struct GenerationContext {
	loader: Loader,
	input: Source,
	template: Source,
	variables: BTreeMap<String, String>,
}

impl GenerationContext {
	/// Assemble a context from parsed directives. Later directives of the
	/// same kind replace earlier ones. Relative paths are resolved against
	/// `base_dir`.
	///
	/// An explicit `loader` directive always wins. Without one, the short
	/// value of a literal `input` directive names the loader.
	pub fn build(directives: &[Directive], base_dir: &Path) -> KnitResult<Self> {
		let mut explicit_loader: Option<&str> = None;
		let mut inferred_loader: Option<&str> = None;
		let mut input: Option<Source> = None;
		let mut template: Option<Source> = None;
		let mut variables = BTreeMap::new();

		for directive in directives {
			match directive.kind {
				DirectiveKind::Input => {
					if let Some(literal) = &directive.literal {
						input = Some(Source::Literal(literal.clone()));
						inferred_loader = Some(directive.value.as_str()).filter(|v| !v.is_empty());
					} else {
						input = resolve_path(base_dir, &directive.value);
						inferred_loader = None;
					}
				}
				DirectiveKind::Loader => {
					explicit_loader = Some(directive.value.as_str()).filter(|v| !v.is_empty());
				}
				DirectiveKind::Template => {
					template = match &directive.literal {
						Some(literal) => Some(Source::Literal(literal.clone())),
						None => resolve_path(base_dir, &directive.value),
					};
				}
				DirectiveKind::Variable => {
					let (name, value) = variable_binding(directive)?;
					variables.insert(name, value);
				}
			}
		}

		let loader = match explicit_loader.or(inferred_loader) {
			Some(token) => Loader::resolve(token)?,
			None => return Err(KnitError::MissingLoader),
		};

		let input = input.ok_or_else(|| {
			KnitError::Validation {
				missing: "input".to_string(),
			}
		})?;

		let template = template.ok_or_else(|| {
			KnitError::Validation {
				missing: "template".to_string(),
			}
		})?;

		Ok(Self {
			loader,
			input,
			template,
			variables,
		})
	}

	/// A context from already resolved parts, for callers that do not read
	/// directives.
	pub fn new(loader: Loader, input: Source, template: Source) -> Self {
		Self {
			loader,
			input,
			template,
			variables: BTreeMap::new(),
		}
	}

	#[must_use]
	pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.variables.insert(name.into(), value.into());
		self
	}

	pub fn loader(&self) -> Loader {
		self.loader
	}

	pub fn input(&self) -> &Source {
		&self.input
	}

	pub fn template(&self) -> &Source {
		&self.template
	}

	pub fn variables(&self) -> &BTreeMap<String, String> {
		&self.variables
	}

	/// Load the input, parse the template and render it against the loaded
	/// value.
	pub fn generate(&self) -> KnitResult<String> {
		let input: Cow<'_, [u8]> = match &self.input {
			Source::Literal(literal) => Cow::Borrowed(literal.as_bytes()),
			Source::Path(path) => {
				Cow::Owned(std::fs::read(path).map_err(|source| {
					KnitError::InputLoad {
						path: path.clone(),
						source,
					}
				})?)
			}
		};

		let template_source: Cow<'_, str> = match &self.template {
			Source::Literal(literal) => Cow::Borrowed(literal.as_str()),
			Source::Path(path) => {
				Cow::Owned(std::fs::read_to_string(path).map_err(|source| {
					KnitError::TemplateLoad {
						path: path.clone(),
						source,
					}
				})?)
			}
		};

		let mut env = Environment::new();
		env.set_keep_trailing_newline(true);
		env.set_undefined_behavior(UndefinedBehavior::Strict);
		filters::register(&mut env);
		env.add_template(TEMPLATE_NAME, &template_source)
			.map_err(|e| KnitError::TemplateParse(e.to_string()))?;

		let data = self.loader.load(&input)?;
		tracing::debug!(loader = %self.loader, "rendering template");

		let context = if data.is_object() {
			Value::from_serialize(&data)
		} else {
			minijinja::context! {}
		};
		env.add_global("data", Value::from_serialize(&data));
		env.add_global("vars", Value::from_serialize(&self.variables));

		let template = env
			.get_template(TEMPLATE_NAME)
			.map_err(|e| KnitError::TemplateParse(e.to_string()))?;

		template
			.render(context)
			.map_err(|e| KnitError::Render(e.to_string()))
	}
}

/// Build a context from `directives` and render it in one step.
pub fn generate(directives: &[Directive], base_dir: &Path) -> KnitResult<String> {
	GenerationContext::build(directives, base_dir)?.generate()
}

fn resolve_path(base_dir: &Path, value: &str) -> Option<Source> {
	if value.is_empty() {
		return None;
	}

	Some(Source::Path(base_dir.join(value)))
}

fn variable_binding(directive: &Directive) -> KnitResult<(String, String)> {
	if let Some(literal) = &directive.literal {
		if directive.value.is_empty() {
			return Err(KnitError::Validation {
				missing: "variable name".to_string(),
			});
		}
		return Ok((directive.value.clone(), literal.clone()));
	}

	match directive.value.split_once('=') {
		Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
		_ => {
			Err(KnitError::Validation {
				missing: format!("value for variable `{}`", directive.value),
			})
		}
	}
}
