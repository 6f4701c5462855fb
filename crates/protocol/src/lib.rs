//! Typed message contracts between the host coordinator and compiler workers.
//!
//! All traffic is asynchronous and fire-and-forget from the sender's
//! perspective: requests flow host → worker, events flow worker → host, and
//! delivery is ordered per sender/receiver pair. Worker outcomes are always
//! delivered as events, never as failures thrown across the boundary.
//!
//! `M` is the opaque compiled-module handle the primary worker hands to the
//! secondary so the native module is instantiated only once.

#![warn(missing_docs)]

pub mod wire;

use lucid_primitives::{CompileError, Elaboration, Location, Span};

/// Which of the two workers a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkerRole {
	/// Handles interactive requests: compile, explain, elaborate.
	Primary,
	/// Runs the background exhaustive exploration.
	Secondary,
}

/// Request sent from the host to a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerRequest<M> {
	/// Instantiate the compiler module. `module` is `None` on the primary
	/// (fresh instantiation) and carries the primary's compiled module on
	/// the secondary.
	Load {
		/// Pre-compiled module handle, if one is available.
		module: Option<M>,
	},
	/// Compile the given source, replacing the worker's current session.
	Compile {
		/// Full source text to compile.
		source: String,
	},
	/// Explain the construct at a location. Ignored by the secondary.
	Explain {
		/// 0-based cursor position.
		location: Location,
	},
	/// Elaborate on the construct at a location. Ignored by the secondary.
	Elaborate {
		/// 0-based cursor position.
		location: Location,
	},
	/// Release the current session without starting a new compile.
	/// Meaningful only on the secondary, where it abandons a running
	/// exploration.
	StopCompilation,
}

/// Event sent from a worker back to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerEvent<M> {
	/// The worker finished loading and echoes its compiled module handle.
	Ready {
		/// Module handle the host can seed the secondary with.
		module: M,
	},
	/// The latest compile succeeded.
	Compiled,
	/// The latest compile failed.
	CompileFailed {
		/// Failure details with a 0-based span.
		error: CompileError,
	},
	/// Response to [`WorkerRequest::Explain`].
	Explanation {
		/// Span the explanation binds to, or `None` when unresolved.
		location: Option<Span>,
	},
	/// Response to [`WorkerRequest::Elaborate`].
	Elaboration {
		/// Bound elaboration, or `None` when the compiler reports no
		/// location for the request.
		result: Option<Elaboration>,
	},
	/// Final result of a background exploration run (secondary only).
	Exploration {
		/// Deduplicated spans in discovery order.
		spans: Vec<Span>,
	},
}
