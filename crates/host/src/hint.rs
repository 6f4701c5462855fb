//! Contextual hint for elaborations with no bound location.
//!
//! When the compiler cannot attach an elaboration to a span, the host
//! renders a window of source around the click instead: common leading
//! indentation stripped, lines numbered, and a caret line pointing at the
//! requested column. Presentation only; compiler state is untouched.

use lucid_primitives::{Location, MissingHint};

use crate::external::EditorText;

/// Lines of context above and below the requested line.
pub const HINT_MARGIN: usize = 5;

/// Builds the fallback hint for an elaboration request at `request`.
///
/// Line numbers are window-relative and space-padded right-aligned to two
/// columns (` 0`, ` 1`, …), not zero-padded, matching the renderer output
/// this text is displayed in.
#[must_use]
pub fn missing_hint<T: EditorText + ?Sized>(text: &T, request: Location) -> MissingHint {
	let line = request.line as usize;
	let ch = request.ch as usize;

	let min_line = line.saturating_sub(HINT_MARGIN);
	let max_line = (line + HINT_MARGIN).min(text.line_count().saturating_sub(1));
	let mut lines: Vec<String> = (min_line..=max_line)
		.map(|i| text.line(i).unwrap_or_default().to_owned())
		.collect();

	// Common indentation is measured over non-blank lines only; blank
	// lines neither contribute nor get rewritten.
	let indentation = lines
		.iter()
		.filter(|l| !is_blank(l))
		.map(|l| leading_spaces(l))
		.min()
		.unwrap_or(0);
	if indentation > 0 {
		for l in lines.iter_mut().filter(|l| !is_blank(l)) {
			*l = l.split_off(indentation);
		}
	}

	for (i, l) in lines.iter_mut().enumerate() {
		*l = format!("{i:>2} | {l}");
	}

	let caret_column = ch.saturating_sub(indentation);
	lines.insert(line - min_line + 1, format!("   | {}\u{2191}", " ".repeat(caret_column)));

	MissingHint {
		code: lines.join("\n"),
		location: Location::new((line - min_line) as u32, caret_column as u32),
	}
}

fn is_blank(line: &str) -> bool {
	line.chars().all(|c| c == ' ')
}

fn leading_spaces(line: &str) -> usize {
	line.chars().take_while(|&c| c == ' ').count()
}
