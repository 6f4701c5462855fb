//! Boundary layer between compiler-native and editor coordinates.
//!
//! The compiler emits 1-based line numbers; the editor side is 0-based.
//! Every crossing goes through this module so the subtract/add-one never
//! leaks anywhere else. Columns are 0-based on both sides.

use lucid_primitives::{Location, Span};

/// Number of `u32` fields one exploration span occupies in the transfer
/// buffer: start line, start column, end line, end column.
pub const FIELDS_PER_SPAN: usize = 4;

/// Converts compiler-native bounds (1-based lines) into an editor span.
#[must_use]
pub fn span_from_native(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Span {
	Span::new(
		Location::new(start_line.saturating_sub(1), start_column),
		Location::new(end_line.saturating_sub(1), end_column),
	)
}

/// Converts an editor location into compiler-native `(line, column)`.
#[must_use]
pub fn location_to_native(location: Location) -> (u32, u32) {
	(location.line + 1, location.ch)
}

/// Decodes the first `written` span quadruples from an exploration
/// transfer buffer.
pub fn decode_spans(buffer: &[u32], written: usize) -> impl Iterator<Item = Span> + '_ {
	buffer
		.chunks_exact(FIELDS_PER_SPAN)
		.take(written)
		.map(|q| span_from_native(q[0], q[1], q[2], q[3]))
}
