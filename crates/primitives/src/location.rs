//! Cursor locations and source spans.

use serde::{Deserialize, Serialize};

/// A cursor position in the editor buffer.
///
/// Both fields are 0-based. Ordering is lexicographic by `(line, ch)`,
/// which the derived `Ord` provides through field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
	/// 0-based line index.
	pub line: u32,
	/// 0-based column index.
	pub ch: u32,
}

impl Location {
	/// Creates a location from line and column indices.
	#[must_use]
	pub const fn new(line: u32, ch: u32) -> Self {
		Self { line, ch }
	}
}

/// A region of the buffer between two locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
	/// Start of the region.
	pub start: Location,
	/// End of the region.
	pub end: Location,
}

impl Span {
	/// Creates a span from start and end locations.
	#[must_use]
	pub const fn new(start: Location, end: Location) -> Self {
		Self { start, end }
	}

	/// Returns true when `location` falls inside this span, boundaries included.
	#[must_use]
	pub fn contains(&self, location: Location) -> bool {
		within_range(location, self.start, self.end)
	}
}

/// Inclusive containment test under lexicographic `(line, ch)` order.
///
/// `location` is within `[start, end]` when it is not before `start` and not
/// after `end`; both boundary points count as inside.
#[must_use]
pub fn within_range(location: Location, start: Location, end: Location) -> bool {
	start <= location && location <= end
}
