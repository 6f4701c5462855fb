//! Compile request debouncing.
//!
//! Collapses the high-frequency edit stream into a low-frequency compile
//! stream: requests landing inside the quiet window coalesce into one that
//! always carries the most recent source. Before the worker signals
//! readiness nothing fires, but the pending slot keeps tracking the latest
//! source so exactly one compile goes out the moment readiness arrives.
//!
//! The scheduler is a polled state machine: callers feed it edits with a
//! timestamp and ask [`CompileScheduler::poll_due`] what to send now, the
//! same way the rest of the host drives its timers.

use std::time::{Duration, Instant};

/// Quiet window for coalescing compile requests.
pub const COMPILE_DEBOUNCE: Duration = Duration::from_millis(128);

#[derive(Debug)]
struct PendingCompile {
	source: String,
	due: Instant,
}

/// Debounce/coalesce state machine for compile requests.
#[derive(Debug)]
pub struct CompileScheduler {
	window: Duration,
	pending: Option<PendingCompile>,
	worker_ready: bool,
}

impl Default for CompileScheduler {
	fn default() -> Self {
		Self::new(COMPILE_DEBOUNCE)
	}
}

impl CompileScheduler {
	/// Creates a scheduler with the given quiet window.
	#[must_use]
	pub fn new(window: Duration) -> Self {
		Self { window, pending: None, worker_ready: false }
	}

	/// Records a compile trigger, replacing any pending one.
	pub fn request(&mut self, source: String, now: Instant) {
		self.pending = Some(PendingCompile { source, due: now + self.window });
	}

	/// Drops the pending compile, if any.
	pub fn cancel(&mut self) {
		self.pending = None;
	}

	/// Marks the worker as ready to accept compiles.
	pub fn mark_ready(&mut self) {
		self.worker_ready = true;
	}

	/// Returns the source to compile when a request is due, consuming it.
	pub fn poll_due(&mut self, now: Instant) -> Option<String> {
		if !self.worker_ready {
			return None;
		}
		if self.pending.as_ref().is_some_and(|p| p.due <= now) {
			return self.pending.take().map(|p| p.source);
		}
		None
	}

	/// Deadline of the pending compile, for driving the host timer.
	#[must_use]
	pub fn next_due(&self) -> Option<Instant> {
		if !self.worker_ready {
			return None;
		}
		self.pending.as_ref().map(|p| p.due)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const WINDOW: Duration = Duration::from_millis(128);

	#[test]
	fn rapid_triggers_coalesce_into_one_request_with_last_source() {
		let mut scheduler = CompileScheduler::new(WINDOW);
		scheduler.mark_ready();
		let start = Instant::now();

		scheduler.request("a".into(), start);
		scheduler.request("ab".into(), start + Duration::from_millis(40));
		scheduler.request("abc".into(), start + Duration::from_millis(80));

		// Nothing is due inside the window measured from the last trigger.
		assert_eq!(scheduler.poll_due(start + Duration::from_millis(120)), None);
		assert_eq!(scheduler.poll_due(start + Duration::from_millis(208)), Some("abc".into()));
		// Consumed: polling again yields nothing.
		assert_eq!(scheduler.poll_due(start + Duration::from_secs(10)), None);
	}

	#[test]
	fn nothing_fires_before_worker_readiness() {
		let mut scheduler = CompileScheduler::new(WINDOW);
		let start = Instant::now();

		scheduler.request("a".into(), start);
		scheduler.request("ab".into(), start + Duration::from_millis(10));
		assert_eq!(scheduler.poll_due(start + Duration::from_secs(5)), None);
		assert_eq!(scheduler.next_due(), None);

		// Readiness releases exactly one compile, with the latest source.
		scheduler.mark_ready();
		assert_eq!(scheduler.poll_due(start + Duration::from_secs(5)), Some("ab".into()));
		assert_eq!(scheduler.poll_due(start + Duration::from_secs(6)), None);
	}

	#[test]
	fn cancel_discards_the_pending_compile() {
		let mut scheduler = CompileScheduler::new(WINDOW);
		scheduler.mark_ready();
		let start = Instant::now();

		scheduler.request("a".into(), start);
		scheduler.cancel();
		assert_eq!(scheduler.poll_due(start + WINDOW + WINDOW), None);
	}

	#[test]
	fn next_due_reports_the_pending_deadline() {
		let mut scheduler = CompileScheduler::new(WINDOW);
		scheduler.mark_ready();
		let start = Instant::now();

		assert_eq!(scheduler.next_due(), None);
		scheduler.request("a".into(), start);
		assert_eq!(scheduler.next_due(), Some(start + WINDOW));
	}
}
