//! Two-stage debounce for pointer-driven explain requests.
//!
//! Stage one is a fixed quiet window: pointer movement only produces a
//! request once the pointer has rested for the window. Stage two gates on
//! the compiler rather than the clock: after a request goes out the gate
//! stays closed until the worker reports completion. Movement while closed
//! overwrites a single queued slot, and the most recent queued position is
//! dispatched immediately on completion. Together the two stages bound the
//! request rate under continuous movement while guaranteeing the latest
//! position is always eventually requested.
//!
//! A position is a cache hit (no request) when it equals the last requested
//! position or falls inside the span of the current explanation.

use std::time::{Duration, Instant};

use lucid_primitives::{Location, Span};

/// Quiet window before a rested pointer position is requested.
pub const HOVER_DEBOUNCE: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
	/// No request outstanding, no movement pending.
	Open,
	/// Movement observed; fires once the window elapses.
	Pending { location: Location, due: Instant },
	/// Request outstanding; at most one position queued behind it.
	Closed { queued: Option<Location> },
}

/// Explicit state machine replacing the usual closure-captured debounce.
#[derive(Debug)]
pub struct HoverExplainer {
	window: Duration,
	gate: Gate,
	last_requested: Option<Location>,
}

impl Default for HoverExplainer {
	fn default() -> Self {
		Self::new(HOVER_DEBOUNCE)
	}
}

impl HoverExplainer {
	/// Creates a gate with the given quiet window.
	#[must_use]
	pub fn new(window: Duration) -> Self {
		Self { window, gate: Gate::Open, last_requested: None }
	}

	/// Records pointer movement at `now`.
	pub fn pointer_moved(&mut self, location: Location, now: Instant) {
		match self.gate {
			Gate::Open | Gate::Pending { .. } => {
				self.gate = Gate::Pending { location, due: now + self.window };
			}
			Gate::Closed { .. } => {
				self.gate = Gate::Closed { queued: Some(location) };
			}
		}
	}

	/// Returns a location to request when the quiet window has elapsed.
	///
	/// Cache hits resolve here without a request and reopen the gate.
	pub fn poll(&mut self, now: Instant, explanation: Option<&Span>) -> Option<Location> {
		let Gate::Pending { location, due } = self.gate else {
			return None;
		};
		if now < due {
			return None;
		}
		self.dispatch(location, explanation)
	}

	/// Signals that the compiler finished the outstanding request.
	///
	/// A queued position is dispatched immediately; otherwise the gate
	/// reopens.
	pub fn response_done(&mut self, explanation: Option<&Span>) -> Option<Location> {
		match self.gate {
			Gate::Closed { queued: Some(location) } => self.dispatch(location, explanation),
			Gate::Closed { queued: None } => {
				self.gate = Gate::Open;
				None
			}
			// A stray completion (e.g. after a reset) leaves the gate alone.
			Gate::Open | Gate::Pending { .. } => None,
		}
	}

	/// Forgets all gate state, e.g. on an edit.
	pub fn reset(&mut self) {
		self.gate = Gate::Open;
		self.last_requested = None;
	}

	/// Deadline of the pending movement, for driving the host timer.
	#[must_use]
	pub fn next_due(&self) -> Option<Instant> {
		match self.gate {
			Gate::Pending { due, .. } => Some(due),
			_ => None,
		}
	}

	fn dispatch(&mut self, location: Location, explanation: Option<&Span>) -> Option<Location> {
		if self.is_cache_hit(location, explanation) {
			self.gate = Gate::Open;
			return None;
		}
		self.last_requested = Some(location);
		self.gate = Gate::Closed { queued: None };
		Some(location)
	}

	fn is_cache_hit(&self, location: Location, explanation: Option<&Span>) -> bool {
		if self.last_requested == Some(location) {
			return true;
		}
		explanation.is_some_and(|span| span.contains(location))
	}
}
