use std::ops::Range;

use logos::Logos;

/// Raw tokens produced by logos for the directive header of a block. Any
/// byte sequence that does not match a token surfaces as an `Err(())` entry
/// and is treated as opaque text by the directive walker.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RawToken {
	#[token("@knit")]
	Marker,
	#[token("\\`")]
	EscapedBacktick,
	#[token("`")]
	Backtick,
	#[token("\n")]
	Newline,
	#[regex(r"[ \t\r]+")]
	Whitespace,
	#[regex(r"[a-zA-Z0-9_]+")]
	Word,
}

/// A lexed token with its byte span in the source. `None` marks text that is
/// not part of the directive grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Lexeme {
	pub token: Option<RawToken>,
	pub span: Range<usize>,
}

impl Lexeme {
	pub fn is(&self, token: RawToken) -> bool {
		self.token == Some(token)
	}

	/// True for tokens that end a bareword directive value.
	pub fn ends_value(&self) -> bool {
		matches!(
			self.token,
			Some(RawToken::Whitespace | RawToken::Newline | RawToken::Backtick)
		)
	}
}

pub(crate) fn tokenize(source: &str) -> Vec<Lexeme> {
	RawToken::lexer(source)
		.spanned()
		.map(|(result, span)| {
			Lexeme {
				token: result.ok(),
				span,
			}
		})
		.collect()
}

/// Pre-computed table of line-start byte offsets so that error positions can
/// be reported as 1-indexed lines.
pub(crate) struct LineTable {
	line_starts: Vec<usize>,
}

impl LineTable {
	pub fn new(content: &str) -> Self {
		let mut line_starts = vec![0];
		for (i, byte) in content.bytes().enumerate() {
			if byte == b'\n' {
				line_starts.push(i + 1);
			}
		}
		Self { line_starts }
	}

	pub fn line_of(&self, offset: usize) -> usize {
		match self.line_starts.binary_search(&offset) {
			Ok(exact) => exact + 1,
			Err(insert) => insert,
		}
	}
}
