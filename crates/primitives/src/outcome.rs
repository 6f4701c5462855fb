//! Compile outcome state and errors.

use serde::{Deserialize, Serialize};

use crate::location::Span;

/// Outcome of the latest compile for the current source buffer.
///
/// Reset to [`CompilationState::Pending`] on every edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompilationState {
	/// No compile response for the current generation yet.
	#[default]
	Pending,
	/// The latest compile succeeded.
	Success,
	/// The latest compile failed; see the accompanying [`CompileError`].
	Error,
}

/// A compile failure with a precise source span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileError {
	/// Region the compiler blames for the failure.
	pub span: Span,
	/// Human-readable error message.
	pub msg: String,
	/// Whether the error covers a whole block rather than an inline token.
	pub is_block: bool,
}
