//! Chunked, cooperative exploration of applicable rule spans.
//!
//! One [`ExplorationRun`] accumulates the result of driving a compiler
//! session through repeated bounded `explore` calls. Each call fills a
//! reusable transfer buffer with raw span quadruples; the run decodes them,
//! drops duplicates, and keeps novel spans in discovery order. The caller
//! runs exactly one [`ExplorationRun::step`] per scheduling turn so the
//! worker stays responsive between batches.

use std::collections::HashMap;
use std::time::Instant;

use lucid_compiler::{CompilerSession, SessionId};
use lucid_primitives::Span;
use lucid_protocol::wire;
use tracing::debug;

/// Batch capacity of the transfer buffer, in spans.
pub const BATCH_SPANS: usize = 500;

/// Outcome of one exploration step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplorationProgress {
	/// The batch produced entries; more may follow.
	Streaming,
	/// The compiler wrote nothing; the run is exhausted.
	Completed,
}

/// Accumulator for one exploration run over a single session.
#[derive(Debug)]
pub struct ExplorationRun {
	session: SessionId,
	buffer: Vec<u32>,
	spans: Vec<Span>,
	by_start_line: HashMap<u32, Vec<Span>>,
	started: Instant,
}

impl ExplorationRun {
	/// Starts a run bound to the session identified by `session`.
	#[must_use]
	pub fn new(session: SessionId) -> Self {
		Self {
			session,
			buffer: vec![0; BATCH_SPANS * wire::FIELDS_PER_SPAN],
			spans: Vec::new(),
			by_start_line: HashMap::new(),
			started: Instant::now(),
		}
	}

	/// Identity of the session this run iterates over.
	#[must_use]
	pub fn session(&self) -> SessionId {
		self.session
	}

	/// Drains one batch from `session` into the accumulator.
	pub fn step(&mut self, session: &mut impl CompilerSession) -> ExplorationProgress {
		let written = session.explore(&mut self.buffer);
		if written == 0 {
			return ExplorationProgress::Completed;
		}
		let decoded: Vec<Span> = wire::decode_spans(&self.buffer, written).collect();
		for span in decoded {
			self.insert(span);
		}
		ExplorationProgress::Streaming
	}

	/// Spans accumulated so far, in discovery order.
	#[must_use]
	pub fn spans(&self) -> &[Span] {
		&self.spans
	}

	/// Consumes the run and returns the deduplicated result sequence.
	#[must_use]
	pub fn finish(self) -> Vec<Span> {
		debug!(
			spans = self.spans.len(),
			elapsed_ms = self.started.elapsed().as_millis() as u64,
			"exploration complete"
		);
		self.spans
	}

	/// Appends `span` unless an equal span was already seen.
	///
	/// Duplicate checks go through a per-start-line bucket so each batch
	/// entry compares against a handful of candidates, not the whole run.
	fn insert(&mut self, span: Span) {
		let bucket = self.by_start_line.entry(span.start.line).or_default();
		if bucket.contains(&span) {
			return;
		}
		bucket.push(span);
		self.spans.push(span);
	}
}
