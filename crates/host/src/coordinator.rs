//! Generation-tracked request coordination.
//!
//! Every edit advances a monotonic generation; interactive requests are
//! stamped with the generation live when they were issued, and every
//! response handler checks staleness before touching visible state. Stale
//! responses are superseded work, not failures: they are dropped silently.
//!
//! Neither explanation nor elaboration responses carry a correlation token
//! of their own, so both are matched positionally against FIFOs of issued
//! requests (responses arrive in request order on the ordered channel).
//! For explain there is at most one request in flight at a time, so a
//! single remembered generation suffices. Clicks can stack up: responses
//! drain the elaboration FIFO in order, and only the newest click's
//! response is applied; issuing a later click invalidates the earlier
//! one, so its response surfaces nothing.

use std::collections::VecDeque;
use std::time::Instant;

use lucid_primitives::{CompilationState, CompileError, Elaboration, Location, Span};
use tracing::{debug, error};

use crate::external::DurableStore;
use crate::hint::missing_hint;
use crate::hover::HoverExplainer;
use crate::schedule::CompileScheduler;
use crate::store::{CompilationView, Store};

/// Durable-store key the source buffer is persisted under.
pub const SOURCE_KEY: &str = "code";

/// Outbound effect the coordinator wants dispatched to a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
	/// Compile on the primary worker.
	CompilePrimary {
		/// Source to compile.
		source: String,
	},
	/// Compile on the secondary worker to restart exploration.
	CompileSecondary {
		/// Source to compile; matches the primary's successful compile.
		source: String,
	},
	/// Abandon the secondary's running exploration.
	StopSecondary,
	/// Hover explain on the primary worker.
	Explain {
		/// Position to explain.
		location: Location,
	},
	/// Click elaboration on the primary worker.
	Elaborate {
		/// Position to elaborate.
		location: Location,
	},
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingElaboration {
	generation: u64,
	location: Location,
}

/// Host-side coordination core.
pub struct Coordinator<P: DurableStore> {
	generation: u64,
	source: String,
	scheduler: CompileScheduler,
	hover: HoverExplainer,
	store: Store,
	persist: P,
	/// Generations of compiles sent but unanswered, in send order.
	inflight_compiles: VecDeque<u64>,
	/// Generation of the outstanding explain request, if any.
	inflight_explain: Option<u64>,
	/// Outstanding elaboration requests, in click order. Only the last
	/// entry's response may be applied.
	pending_elaborations: VecDeque<PendingElaboration>,
	/// Generation whose successful compile was dispatched to the secondary.
	exploration_generation: Option<u64>,
	/// Source of the most recent primary compile dispatch.
	dispatched_source: Option<String>,
}

impl<P: DurableStore> Coordinator<P> {
	/// Creates a coordinator persisting through `persist`.
	#[must_use]
	pub fn new(persist: P) -> Self {
		Self {
			generation: 0,
			source: String::new(),
			scheduler: CompileScheduler::default(),
			hover: HoverExplainer::default(),
			store: Store::new(),
			persist,
			inflight_compiles: VecDeque::new(),
			inflight_explain: None,
			pending_elaborations: VecDeque::new(),
			exploration_generation: None,
			dispatched_source: None,
		}
	}

	/// Current generation.
	#[must_use]
	pub fn generation(&self) -> u64 {
		self.generation
	}

	/// True when a response issued under `generation` has been superseded.
	#[must_use]
	pub fn is_stale(&self, generation: u64) -> bool {
		generation != self.generation
	}

	/// The reactive store, for subscriptions.
	pub fn store_mut(&mut self) -> &mut Store {
		&mut self.store
	}

	/// Read-only view of the store.
	#[must_use]
	pub fn store(&self) -> &Store {
		&self.store
	}

	/// Source text persisted by an earlier run, if any.
	#[must_use]
	pub fn restore_source(&self) -> Option<String> {
		self.persist.get(SOURCE_KEY)
	}

	/// Registers an edit: advances the generation, resets compile-derived
	/// state, persists the source, and schedules a compile.
	///
	/// Blank (whitespace-only) sources short-circuit to `Success` without
	/// involving a worker.
	pub fn begin_edit(&mut self, source: String, now: Instant) -> u64 {
		self.generation += 1;
		let empty = source.trim().is_empty();

		self.persist.set(SOURCE_KEY, &source);
		self.hover.reset();
		self.store.update(|state| {
			state.compilation = CompilationView::default();
			if empty {
				state.compilation.state = CompilationState::Success;
			}
			state.empty = empty;
		});

		if empty {
			self.scheduler.cancel();
		} else {
			self.scheduler.request(source.clone(), now);
		}
		self.source = source;
		self.generation
	}

	/// Marks the primary worker ready to accept compiles.
	pub fn mark_primary_ready(&mut self) {
		self.scheduler.mark_ready();
	}

	/// Records pointer movement for the hover explainer.
	///
	/// Ignored unless the current source compiled successfully, and once a
	/// completed exploration is on screen (its marks answer hovers without
	/// the compiler).
	pub fn pointer_moved(&mut self, location: Location, now: Instant) {
		let compilation = &self.store.state().compilation;
		if compilation.state != CompilationState::Success || self.store.state().empty {
			return;
		}
		if compilation.exploration.is_some() {
			return;
		}
		self.hover.pointer_moved(location, now);
	}

	/// Issues a single-shot elaboration request for a click.
	pub fn click(&mut self, location: Location) -> Option<Command> {
		let state = self.store.state();
		if state.compilation.state != CompilationState::Success || state.empty {
			return None;
		}
		// Supersedes any outstanding click; earlier responses drain the
		// queue without being applied.
		self.pending_elaborations.push_back(PendingElaboration { generation: self.generation, location });
		Some(Command::Elaborate { location })
	}

	/// Drains requests that became due by `now`.
	pub fn poll(&mut self, now: Instant) -> Vec<Command> {
		let mut commands = Vec::new();

		if let Some(source) = self.scheduler.poll_due(now) {
			self.inflight_compiles.push_back(self.generation);
			self.dispatched_source = Some(source.clone());
			commands.push(Command::CompilePrimary { source });
		}

		if self.store.state().compilation.state == CompilationState::Success {
			let explanation = self.store.state().compilation.explanation;
			if let Some(location) = self.hover.poll(now, explanation.as_ref()) {
				self.inflight_explain = Some(self.generation);
				commands.push(Command::Explain { location });
			}
		}

		commands
	}

	/// Earliest deadline of any pending debounce, for the host timer.
	#[must_use]
	pub fn next_due(&self) -> Option<Instant> {
		match (self.scheduler.next_due(), self.hover.next_due()) {
			(Some(a), Some(b)) => Some(a.min(b)),
			(a, b) => a.or(b),
		}
	}

	/// Handles a compile success from the primary.
	pub fn on_compiled(&mut self) -> Vec<Command> {
		let Some(generation) = self.inflight_compiles.pop_front() else {
			error!("compile response with no compile in flight");
			return Vec::new();
		};
		if self.is_stale(generation) {
			debug!(generation, "discarding stale compile success");
			return Vec::new();
		}

		self.store.update(|state| {
			state.compilation = CompilationView { state: CompilationState::Success, ..CompilationView::default() };
		});

		// Re-trigger exploration for the freshly compiled source.
		self.exploration_generation = Some(generation);
		match &self.dispatched_source {
			Some(source) => vec![Command::CompileSecondary { source: source.clone() }],
			None => Vec::new(),
		}
	}

	/// Handles a compile failure from the primary.
	pub fn on_compile_failed(&mut self, error: CompileError) -> Vec<Command> {
		let Some(generation) = self.inflight_compiles.pop_front() else {
			error!("compile response with no compile in flight");
			return Vec::new();
		};
		if self.is_stale(generation) {
			debug!(generation, "discarding stale compile error");
			return Vec::new();
		}

		self.store.update(|state| {
			state.compilation = CompilationView {
				state: CompilationState::Error,
				error: Some(error),
				..CompilationView::default()
			};
		});

		// Whatever the secondary is exploring belongs to a source that no
		// longer compiles.
		vec![Command::StopSecondary]
	}

	/// Handles an explanation response from the primary.
	pub fn on_explanation(&mut self, location: Option<Span>) -> Vec<Command> {
		let Some(generation) = self.inflight_explain.take() else {
			debug!("explanation response with no explain in flight");
			return Vec::new();
		};
		if self.is_stale(generation) {
			debug!(generation, "discarding stale explanation");
			return Vec::new();
		}

		self.store.update(|state| state.compilation.explanation = location);

		// The compiler reported completion: this is what re-arms the hover
		// gate, unless exploration marks have taken over hover duty.
		if self.store.state().compilation.exploration.is_none() {
			let explanation = self.store.state().compilation.explanation;
			if let Some(next) = self.hover.response_done(explanation.as_ref()) {
				self.inflight_explain = Some(self.generation);
				return vec![Command::Explain { location: next }];
			}
		}
		Vec::new()
	}

	/// Handles an elaboration response from the primary.
	///
	/// Responses arrive in click order; one that does not belong to the
	/// newest click was superseded and is dropped.
	pub fn on_elaboration(&mut self, result: Option<Elaboration>) {
		let Some(pending) = self.pending_elaborations.pop_front() else {
			debug!("elaboration response with no elaboration in flight");
			return;
		};
		if !self.pending_elaborations.is_empty() {
			debug!("discarding elaboration superseded by a newer click");
			return;
		}
		if self.is_stale(pending.generation) {
			debug!(generation = pending.generation, "discarding stale elaboration");
			return;
		}

		match result {
			Some(elaboration) => self.store.update(|state| {
				state.compilation.elaboration = Some(elaboration);
				state.compilation.missing = None;
			}),
			None => {
				let hint = missing_hint(self.source.as_str(), pending.location);
				self.store.update(|state| {
					state.compilation.elaboration = None;
					state.compilation.missing = Some(hint);
				});
			}
		}
	}

	/// Handles the exploration result from the secondary.
	pub fn on_exploration(&mut self, spans: Vec<Span>) {
		let Some(generation) = self.exploration_generation else {
			debug!("exploration result with no exploration dispatched");
			return;
		};
		if self.is_stale(generation) {
			debug!(generation, "discarding stale exploration result");
			return;
		}
		self.store.update(|state| state.compilation.exploration = Some(spans));
	}
}
