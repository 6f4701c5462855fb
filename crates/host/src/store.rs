//! Host-side reactive state.
//!
//! One mutable state object, mutated only through [`Store::update`]; every
//! update runs the subscribers with a read-only snapshot. Render consumers
//! subscribe and read slices; they never mutate.

use lucid_primitives::{CompilationState, CompileError, Elaboration, MissingHint, Span};

/// Compile-derived interactive state. Reset wholesale on every edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompilationView {
	/// Outcome of the latest compile.
	pub state: CompilationState,
	/// Error of the latest failed compile.
	pub error: Option<CompileError>,
	/// Hover explanation span.
	pub explanation: Option<Span>,
	/// Click-triggered elaboration.
	pub elaboration: Option<Elaboration>,
	/// Fallback hint when an elaboration had no bound location.
	pub missing: Option<MissingHint>,
	/// Completed exploration result for the current generation.
	pub exploration: Option<Vec<Span>>,
}

/// The whole render-visible host state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostState {
	/// Compile-derived interactive state.
	pub compilation: CompilationView,
	/// Whether the source buffer is empty or whitespace-only.
	pub empty: bool,
}

/// Callback invoked with a read-only snapshot after every update.
pub type Subscriber = Box<dyn Fn(&HostState) + Send>;

/// Single-owner state store with a pure notification pass.
#[derive(Default)]
pub struct Store {
	state: HostState,
	subscribers: Vec<Subscriber>,
}

impl std::fmt::Debug for Store {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Store")
			.field("state", &self.state)
			.field("subscribers", &self.subscribers.len())
			.finish()
	}
}

impl Store {
	/// Creates an empty store.
	#[must_use]
	pub fn new() -> Self {
		Self::default()
	}

	/// Registers a render consumer.
	pub fn subscribe(&mut self, subscriber: impl Fn(&HostState) + Send + 'static) {
		self.subscribers.push(Box::new(subscriber));
	}

	/// Applies `patch` to the state, then notifies every subscriber.
	pub fn update(&mut self, patch: impl FnOnce(&mut HostState)) {
		patch(&mut self.state);
		for subscriber in &self.subscribers {
			subscriber(&self.state);
		}
	}

	/// Read-only view of the current state.
	#[must_use]
	pub fn state(&self) -> &HostState {
		&self.state
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};

	use super::*;

	#[test]
	fn update_notifies_every_subscriber_with_the_new_state() {
		let seen = Arc::new(AtomicUsize::new(0));
		let mut store = Store::new();
		for _ in 0..3 {
			let seen = Arc::clone(&seen);
			store.subscribe(move |state| {
				if state.empty {
					seen.fetch_add(1, Ordering::SeqCst);
				}
			});
		}

		store.update(|state| state.empty = true);
		assert_eq!(seen.load(Ordering::SeqCst), 3);
		assert!(store.state().empty);
	}

	#[test]
	fn compilation_view_defaults_to_pending() {
		let store = Store::new();
		assert_eq!(store.state().compilation.state, CompilationState::Pending);
		assert!(store.state().compilation.error.is_none());
	}
}
