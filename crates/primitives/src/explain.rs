//! Explanation payloads and the missing-location fallback hint.

use serde::{Deserialize, Serialize};

use crate::location::{Location, Span};

/// A click-triggered elaboration bound to a source span.
///
/// Hover explanations carry only the span; the detailed fields below are
/// produced for elaborations alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elaboration {
	/// Span the elaboration applies to.
	pub location: Span,
	/// Short title for the explained construct.
	pub title: String,
	/// Detailed explanation text.
	pub elaboration: String,
	/// Optional reference into the book.
	pub book: Option<String>,
	/// Optional keyword for further lookup.
	pub keyword: Option<String>,
}

/// Presentation fallback when an elaboration resolves to no bound location.
///
/// Holds a rendered context window around the requested location: dedented
/// source lines prefixed with window-relative line numbers, plus a caret
/// line under the requested column. Purely cosmetic; the compiler state is
/// unaffected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingHint {
	/// The rendered context window.
	pub code: String,
	/// Requested location adjusted into window coordinates.
	pub location: Location,
}
