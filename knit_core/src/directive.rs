use std::fmt;
use std::str::FromStr;

use crate::KnitError;
use crate::KnitResult;
use crate::lexer::Lexeme;
use crate::lexer::LineTable;
use crate::lexer::RawToken;
use crate::lexer::tokenize;

/// Token that introduces a directive.
pub const ANNOTATION_OPT: &str = "@knit";
/// Token that opens a generated block.
pub const ANNOTATION_BEG: &str = "@+knit";
/// Token that closes a generated block.
pub const ANNOTATION_END: &str = "@!knit";

/// The kind of a directive, written as the first word after `@knit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
	/// Where the schema data comes from: a file path or a literal.
	Input,
	/// Which loader turns the input bytes into a value.
	Loader,
	/// The template to render: a file path or a literal.
	Template,
	/// A named value exposed to the template under `vars`.
	Variable,
}

impl fmt::Display for DirectiveKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Self::Input => "input",
			Self::Loader => "loader",
			Self::Template => "template",
			Self::Variable => "variable",
		};
		f.write_str(name)
	}
}

impl FromStr for DirectiveKind {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"input" => Ok(Self::Input),
			"loader" => Ok(Self::Loader),
			"template" => Ok(Self::Template),
			"variable" => Ok(Self::Variable),
			_ => Err(()),
		}
	}
}

/// A single `@knit <kind> <value>` declaration, with an optional backtick
/// literal attached directly to the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
	pub kind: DirectiveKind,
	/// The short inline argument, with environment variables expanded.
	pub value: String,
	/// The literal payload with escaped backticks resolved.
	pub literal: Option<String>,
	/// 1-indexed line of the `@knit` marker.
	pub line: usize,
}

impl Directive {
	pub fn new(kind: DirectiveKind, value: impl Into<String>) -> Self {
		Self {
			kind,
			value: value.into(),
			literal: None,
			line: 0,
		}
	}

	#[must_use]
	pub fn with_literal(mut self, literal: impl Into<String>) -> Self {
		self.literal = Some(literal.into());
		self
	}

	#[must_use]
	pub fn at_line(mut self, line: usize) -> Self {
		self.line = line;
		self
	}
}

/// What to do with a `$NAME` reference whose variable is not set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnvPolicy {
	/// Substitute the empty string and log a warning.
	#[default]
	Empty,
	/// Fail the block with [`KnitError::UnresolvedEnvVar`].
	Strict,
}

/// Parse every directive found in `text`, in source order.
///
/// Text that does not start with the `@knit` marker followed by whitespace is
/// ignored, so directives can sit inside any comment syntax.
pub fn parse_directives(text: &str, env: EnvPolicy) -> KnitResult<Vec<Directive>> {
	parse_directives_at(text, 1, env)
}

/// Like [`parse_directives`] for a slice of a larger file whose first line is
/// `first_line`, so reported lines match the file.
pub(crate) fn parse_directives_at(
	text: &str,
	first_line: usize,
	env: EnvPolicy,
) -> KnitResult<Vec<Directive>> {
	DirectiveWalker::new(text, first_line, env).walk()
}

/// Replace every escaped backtick in a literal with a plain backtick.
pub fn resolve_escapes(literal: &str) -> String {
	literal.replace("\\`", "`")
}

/// Expand `$NAME` and `${NAME}` references using the process environment.
pub fn expand_env(value: &str, policy: EnvPolicy) -> KnitResult<String> {
	expand_env_with(value, policy, |name| std::env::var(name).ok())
}

/// Expand `$NAME` and `${NAME}` references using `lookup`.
pub fn expand_env_with<F>(value: &str, policy: EnvPolicy, lookup: F) -> KnitResult<String>
where
	F: Fn(&str) -> Option<String>,
{
	let expanded = shellexpand::env_with_context(value, |name| {
		match lookup(name) {
			Some(resolved) => Ok(Some(resolved)),
			None if policy == EnvPolicy::Strict => Err(()),
			None => {
				tracing::warn!(name, "environment variable is not set, expanding to empty string");
				Ok(Some(String::new()))
			}
		}
	})
	.map_err(|e| {
		KnitError::UnresolvedEnvVar {
			name: e.var_name,
		}
	})?;

	Ok(expanded.into_owned())
}

struct DirectiveWalker<'a> {
	source: &'a str,
	lexemes: Vec<Lexeme>,
	cursor: usize,
	lines: LineTable,
	first_line: usize,
	env: EnvPolicy,
}

impl<'a> DirectiveWalker<'a> {
	fn new(source: &'a str, first_line: usize, env: EnvPolicy) -> Self {
		Self {
			source,
			lexemes: tokenize(source),
			cursor: 0,
			lines: LineTable::new(source),
			first_line,
			env,
		}
	}

	fn peek(&self) -> Option<&Lexeme> {
		self.lexemes.get(self.cursor)
	}

	fn peek_is(&self, token: RawToken) -> bool {
		self.peek().is_some_and(|lexeme| lexeme.is(token))
	}

	fn walk(mut self) -> KnitResult<Vec<Directive>> {
		let mut directives = Vec::new();

		while let Some(lexeme) = self.peek() {
			if !lexeme.is(RawToken::Marker) {
				self.cursor += 1;
				continue;
			}

			let line = self.lines.line_of(lexeme.span.start) + self.first_line - 1;
			self.cursor += 1;

			// `@knitting` or `@knit:` are plain text, not directives.
			if !self.peek_is(RawToken::Whitespace) {
				continue;
			}
			self.cursor += 1;

			directives.push(self.directive(line)?);
		}

		Ok(directives)
	}

	fn directive(&mut self, line: usize) -> KnitResult<Directive> {
		let source = self.source;
		let kind_text = match self.peek() {
			Some(lexeme) if lexeme.is(RawToken::Word) => &source[lexeme.span.clone()],
			_ => {
				return Err(KnitError::DirectiveParse {
					line,
					reason: "expected a directive kind after `@knit`".to_string(),
				});
			}
		};
		let kind = kind_text
			.parse::<DirectiveKind>()
			.map_err(|()| {
				KnitError::UnknownDirective {
					kind: kind_text.to_string(),
					line,
				}
			})?;
		self.cursor += 1;

		if self.peek_is(RawToken::Whitespace) {
			self.cursor += 1;
		}

		let value_start = self.peek().map_or(source.len(), |l| l.span.start);
		while self.peek().is_some_and(|lexeme| !lexeme.ends_value()) {
			self.cursor += 1;
		}
		let value_end = self.peek().map_or(source.len(), |l| l.span.start);
		let raw_value = &source[value_start..value_end];

		let literal = if self.peek_is(RawToken::Backtick) {
			self.cursor += 1;
			Some(self.literal(line)?)
		} else {
			None
		};

		let value = if raw_value.is_empty() {
			String::new()
		} else {
			expand_env(raw_value, self.env)?
		};

		Ok(Directive {
			kind,
			value,
			literal,
			line,
		})
	}

	/// Consume a literal whose opening backtick was already consumed. Escaped
	/// backticks never terminate the literal.
	fn literal(&mut self, line: usize) -> KnitResult<String> {
		let source = self.source;
		let start = self.peek().map_or(source.len(), |l| l.span.start);

		while let Some(lexeme) = self.peek() {
			if lexeme.is(RawToken::Backtick) {
				let raw = &source[start..lexeme.span.start];
				self.cursor += 1;
				return Ok(resolve_escapes(raw));
			}
			self.cursor += 1;
		}

		Err(KnitError::DirectiveParse {
			line,
			reason: "unterminated literal, expected a closing backtick".to_string(),
		})
	}
}
