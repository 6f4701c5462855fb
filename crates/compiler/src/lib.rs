//! The compiler as an opaque native capability.
//!
//! The compiler itself lives behind [`Compiler`] and [`CompilerSession`];
//! this crate defines only the contract the workers require from it, plus
//! [`SessionSlot`], the owned free-then-replace holder that enforces the
//! one-live-session-per-worker invariant.
//!
//! All coordinates on this boundary are compiler-native: 1-based lines,
//! 0-based columns. Conversion is the caller's job (see `lucid-protocol`).

#![warn(missing_docs)]

pub mod session;

pub use session::{SessionId, SessionSlot};

use thiserror::Error;

/// Failure to instantiate the compiler module.
///
/// Fatal to the worker's usefulness: there is no automatic restart, the
/// affected worker stays unusable until a full reload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("compiler module load failed: {reason}")]
pub struct LoadError {
	/// What the native loader reported.
	pub reason: String,
}

/// A compile failure as the compiler reports it, with 1-based line numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
	/// Error message.
	pub msg: String,
	/// 1-based start line.
	pub start_line: u32,
	/// 0-based start column.
	pub start_column: u32,
	/// 1-based end line.
	pub end_line: u32,
	/// 0-based end column.
	pub end_column: u32,
	/// Whether the error covers a whole block.
	pub is_block: bool,
}

/// What the compiler knows about a location, with 1-based line numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeExplanation {
	/// 1-based start line.
	pub start_line: u32,
	/// 0-based start column.
	pub start_column: u32,
	/// 1-based end line.
	pub end_line: u32,
	/// 0-based end column.
	pub end_column: u32,
	/// Short title for the construct.
	pub title: String,
	/// Detailed elaboration text.
	pub elaboration: String,
	/// Optional book reference.
	pub book: Option<String>,
	/// Optional lookup keyword.
	pub keyword: Option<String>,
}

/// Result of compiling one source buffer.
///
/// A session is produced by successful and failed compiles alike; a failed
/// compile simply carries the error alongside it.
#[derive(Debug)]
pub struct CompileOutcome<S> {
	/// Compiler-held state for the compiled source.
	pub session: S,
	/// Failure details when the compile did not succeed.
	pub error: Option<NativeError>,
}

/// The native compiler capability owned by one worker.
pub trait Compiler: Send + 'static {
	/// Opaque compiled-module handle. Cheap to clone so the primary can
	/// hand it to the secondary without re-instantiating native code.
	type Module: Clone + Send + Sync + 'static;
	/// Session type produced by [`Compiler::compile`].
	type Session: CompilerSession;

	/// Instantiates the compiler, either fresh (`None`) or from an already
	/// compiled module handed over by another worker.
	fn load(&mut self, module: Option<Self::Module>) -> Result<Self::Module, LoadError>;

	/// Compiles `source` into a new session.
	fn compile(&mut self, source: &str) -> CompileOutcome<Self::Session>;
}

/// Compiler-held state for the currently compiled source.
///
/// Owned exclusively by its worker; never crosses the message boundary.
/// Release is explicit via [`CompilerSession::free`] since the compiler has
/// its own unmanaged session lifetime.
pub trait CompilerSession: Send + 'static {
	/// Explains the construct at a compiler-native position.
	fn explain(&mut self, line: u32, column: u32) -> Option<NativeExplanation>;

	/// Writes up to `buffer.len() / 4` newly discovered span quadruples
	/// into `buffer` and returns how many spans were written. Returning 0
	/// means the exploration is exhausted.
	fn explore(&mut self, buffer: &mut [u32]) -> usize;

	/// Releases the native session.
	fn free(self);
}
