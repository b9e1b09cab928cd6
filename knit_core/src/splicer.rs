use std::path::Path;

use crate::ANNOTATION_BEG;
use crate::ANNOTATION_END;
use crate::EnvPolicy;
use crate::GenerationContext;
use crate::KnitError;
use crate::KnitResult;
use crate::directive::parse_directives_at;
use crate::lexer::LineTable;

/// A file after splicing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spliced {
	pub text: String,
	/// Blocks regenerated. When zero, `text` is the input unchanged.
	pub blocks: usize,
}

/// Regenerate every block in `text` and return the reassembled file.
///
/// Relative `input` and `template` paths resolve against `base_dir`.
pub fn splice(text: &str, base_dir: &Path, env: EnvPolicy) -> KnitResult<String> {
	splice_blocks(text, base_dir, env).map(|spliced| spliced.text)
}

/// Like [`splice`] but also reports how many blocks were regenerated.
///
/// The file is split after each end marker. A segment without a begin marker
/// is copied through untouched. For a segment with one, the directives are
/// read from the text before the begin marker, the generator runs, and the
/// old body is replaced with the fresh output. Blocks are handled strictly in
/// file order and never see each other's output.
pub fn splice_blocks(text: &str, base_dir: &Path, env: EnvPolicy) -> KnitResult<Spliced> {
	let lines = LineTable::new(text);
	let mut output = String::with_capacity(text.len());
	let mut index = 0;

	for (start, segment) in segments(text) {
		let Some(begin) = segment.find(ANNOTATION_BEG) else {
			output.push_str(segment);
			continue;
		};

		index += 1;
		let line = lines.line_of(start + begin);
		let block = BlockSpan::locate(segment, begin).ok_or(KnitError::UnterminatedBlock { line })?;

		let generated = render_block(block.header, lines.line_of(start), base_dir, env)
			.map_err(|error| error.in_block(index, line))?;
		tracing::debug!(index, line, bytes = generated.len(), "regenerated block");

		output.push_str(&segment[..block.opening_end]);
		output.push('\n');
		output.push_str(&normalize_body(&generated));
		output.push_str(block.end_prefix);
		output.push_str(ANNOTATION_END);
	}

	Ok(Spliced {
		text: output,
		blocks: index,
	})
}

/// Split `text` after every end marker, keeping the marker on the preceding
/// segment. Each segment is returned with its byte offset in `text`.
fn segments(text: &str) -> Vec<(usize, &str)> {
	let mut segments = Vec::new();
	let mut start = 0;

	for (offset, marker) in text.match_indices(ANNOTATION_END) {
		let end = offset + marker.len();
		segments.push((start, &text[start..end]));
		start = end;
	}

	if start < text.len() {
		segments.push((start, &text[start..]));
	}

	segments
}

/// The parts of a segment that survive regeneration.
struct BlockSpan<'a> {
	/// Text before the begin marker. Directives are read from here.
	header: &'a str,
	/// Offset just past the rest of the begin-marker line.
	opening_end: usize,
	/// Whatever precedes the end marker on its own line, e.g. `// `.
	end_prefix: &'a str,
}

impl<'a> BlockSpan<'a> {
	/// Returns `None` when the segment has no end marker or opens a second
	/// block before closing the first.
	fn locate(segment: &'a str, begin: usize) -> Option<Self> {
		let body_start = begin + ANNOTATION_BEG.len();
		let body = segment[body_start..].strip_suffix(ANNOTATION_END)?;
		if body.contains(ANNOTATION_BEG) {
			return None;
		}

		let remainder = body.find('\n').unwrap_or(body.len());
		let after_opening = &body[remainder..];
		let end_prefix = after_opening
			.rfind('\n')
			.map_or("", |newline| &after_opening[newline + 1..]);

		Some(Self {
			header: &segment[..begin],
			opening_end: body_start + remainder,
			end_prefix,
		})
	}
}

fn render_block(header: &str, first_line: usize, base_dir: &Path, env: EnvPolicy) -> KnitResult<String> {
	let directives = parse_directives_at(header, first_line, env)?;
	tracing::trace!(count = directives.len(), "parsed block directives");
	GenerationContext::build(&directives, base_dir)?.generate()
}

/// Make generated text end in exactly one newline so the end marker always
/// starts its own line. A trailing whitespace-only line is dropped and blank
/// output stays empty.
pub(crate) fn normalize_body(generated: &str) -> String {
	let mut body = generated;
	if let Some(newline) = body.rfind('\n') {
		if body[newline + 1..].trim().is_empty() {
			body = &body[..newline];
		}
	}
	let body = body.trim_end_matches(['\n', '\r']);

	if body.trim().is_empty() {
		return String::new();
	}

	format!("{body}\n")
}
