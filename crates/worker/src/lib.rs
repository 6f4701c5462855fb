//! Compiler worker run loop.
//!
//! Each worker owns one [`Compiler`] instance and at most one live session,
//! and talks to the host exclusively through ordered channels: requests in,
//! events out. The primary worker answers interactive requests; the
//! secondary runs the background exploration, one chunk per scheduling turn,
//! so it keeps servicing messages between batches.
//!
//! Cancellation is cooperative. A compile frees and replaces the session;
//! an exploration loop still holding the old [`SessionId`] notices the
//! identity mismatch on its next turn and stops without reporting.

#![warn(missing_docs)]

pub mod exploration;

use lucid_compiler::{Compiler, CompilerSession, NativeError, NativeExplanation, SessionSlot};
use lucid_primitives::{CompileError, Elaboration, Location, Span};
use lucid_protocol::{WorkerEvent, WorkerRequest, WorkerRole, wire};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, error, warn};

use crate::exploration::{ExplorationProgress, ExplorationRun};

/// Error returned when sending to a worker whose task has exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{role:?} worker is no longer running")]
pub struct WorkerGone {
	/// Role of the unreachable worker.
	pub role: WorkerRole,
}

/// Host-side handle to one spawned worker.
#[derive(Debug)]
pub struct WorkerHandle<M> {
	role: WorkerRole,
	requests: mpsc::UnboundedSender<WorkerRequest<M>>,
	task: tokio::task::JoinHandle<()>,
}

impl<M> WorkerHandle<M> {
	/// Role this handle talks to.
	#[must_use]
	pub fn role(&self) -> WorkerRole {
		self.role
	}

	/// Queues a request for the worker. Fire-and-forget; any outcome comes
	/// back as a [`WorkerEvent`] on the shared event channel.
	pub fn send(&self, request: WorkerRequest<M>) -> Result<(), WorkerGone> {
		self.requests.send(request).map_err(|_| WorkerGone { role: self.role })
	}

	/// Closes the request channel and waits for the worker task to drain
	/// and exit.
	pub async fn join(self) {
		drop(self.requests);
		if self.task.await.is_err() {
			error!(role = ?self.role, "worker task panicked");
		}
	}
}

/// Spawns a worker task for `role` driving `compiler`.
///
/// Events are delivered on `events` tagged with the worker's role. The
/// worker exits when the request channel closes or the event channel's
/// receiver is dropped.
pub fn spawn<C: Compiler>(
	role: WorkerRole,
	compiler: C,
	events: mpsc::UnboundedSender<(WorkerRole, WorkerEvent<C::Module>)>,
) -> WorkerHandle<C::Module> {
	let (tx, rx) = mpsc::unbounded_channel();
	let worker = Worker {
		role,
		compiler,
		loaded: false,
		sessions: SessionSlot::new(),
		exploration: None,
		events,
		requests: rx,
	};
	let task = tokio::spawn(worker.run());
	WorkerHandle { role, requests: tx, task }
}

/// Whether the run loop keeps going after handling a message.
enum Flow {
	Continue,
	Shutdown,
}

struct Worker<C: Compiler> {
	role: WorkerRole,
	compiler: C,
	loaded: bool,
	sessions: SessionSlot<C::Session>,
	exploration: Option<ExplorationRun>,
	events: mpsc::UnboundedSender<(WorkerRole, WorkerEvent<C::Module>)>,
	requests: mpsc::UnboundedReceiver<WorkerRequest<C::Module>>,
}

impl<C: Compiler> Worker<C> {
	async fn run(mut self) {
		loop {
			if self.exploration.is_some() {
				// Drain any queued message before the next batch so a
				// superseding compile or stop is seen between chunks.
				match self.requests.try_recv() {
					Ok(request) => {
						if let Flow::Shutdown = self.handle(request) {
							break;
						}
					}
					Err(TryRecvError::Empty) => {
						if let Flow::Shutdown = self.exploration_step() {
							break;
						}
						tokio::task::yield_now().await;
					}
					Err(TryRecvError::Disconnected) => break,
				}
			} else {
				match self.requests.recv().await {
					Some(request) => {
						if let Flow::Shutdown = self.handle(request) {
							break;
						}
					}
					None => break,
				}
			}
		}
		self.sessions.release();
	}

	fn handle(&mut self, request: WorkerRequest<C::Module>) -> Flow {
		match request {
			WorkerRequest::Load { module } => self.load(module),
			WorkerRequest::Compile { source } => self.compile(&source),
			WorkerRequest::Explain { location } => self.explain(location),
			WorkerRequest::Elaborate { location } => self.elaborate(location),
			WorkerRequest::StopCompilation => self.stop_compilation(),
		}
	}

	fn load(&mut self, module: Option<C::Module>) -> Flow {
		match self.compiler.load(module) {
			Ok(module) => {
				self.loaded = true;
				self.emit(WorkerEvent::Ready { module })
			}
			Err(err) => {
				// Fatal to this worker; it stays unusable, no restart.
				error!(role = ?self.role, error = %err, "compiler module load failed");
				Flow::Continue
			}
		}
	}

	fn compile(&mut self, source: &str) -> Flow {
		if !self.loaded {
			warn!(role = ?self.role, "compile requested before module load");
			return Flow::Continue;
		}

		let outcome = self.compiler.compile(source);
		let error = outcome.error.map(compile_error_from_native);
		let session = self.sessions.install(outcome.session);

		match self.role {
			WorkerRole::Primary => match error {
				None => self.emit(WorkerEvent::Compiled),
				Some(error) => self.emit(WorkerEvent::CompileFailed { error }),
			},
			WorkerRole::Secondary => {
				// A failed compile leaves nothing to explore; any previous
				// run is already stale via the session swap above.
				if error.is_none() {
					self.exploration = Some(ExplorationRun::new(session));
				}
				Flow::Continue
			}
		}
	}

	fn explain(&mut self, location: Location) -> Flow {
		if self.role == WorkerRole::Secondary {
			debug!("secondary worker ignoring explain request");
			return Flow::Continue;
		}
		let location = self.query(location).map(|e| explanation_span(&e));
		self.emit(WorkerEvent::Explanation { location })
	}

	fn elaborate(&mut self, location: Location) -> Flow {
		if self.role == WorkerRole::Secondary {
			debug!("secondary worker ignoring elaborate request");
			return Flow::Continue;
		}
		let result = self.query(location).map(|native| Elaboration {
			location: explanation_span(&native),
			title: native.title,
			elaboration: native.elaboration,
			book: native.book,
			keyword: native.keyword,
		});
		self.emit(WorkerEvent::Elaboration { result })
	}

	fn stop_compilation(&mut self) -> Flow {
		if self.role == WorkerRole::Secondary {
			self.exploration = None;
			self.sessions.release();
		} else {
			debug!("primary worker ignoring stop-compilation request");
		}
		Flow::Continue
	}

	/// Asks the current session about an editor location, converting into
	/// compiler-native coordinates at the boundary.
	fn query(&mut self, location: Location) -> Option<NativeExplanation> {
		let (line, column) = wire::location_to_native(location);
		let (_, session) = self.sessions.current_mut()?;
		session.explain(line, column)
	}

	fn exploration_step(&mut self) -> Flow {
		let Some(run) = self.exploration.as_mut() else {
			return Flow::Continue;
		};
		let Some(session) = self.sessions.session_mut(run.session()) else {
			// The session this run iterates over was replaced or released;
			// terminate without reporting.
			debug!("exploration superseded, dropping run");
			self.exploration = None;
			return Flow::Continue;
		};
		match run.step(session) {
			ExplorationProgress::Streaming => Flow::Continue,
			ExplorationProgress::Completed => match self.exploration.take() {
				Some(run) => self.emit(WorkerEvent::Exploration { spans: run.finish() }),
				None => Flow::Continue,
			},
		}
	}

	fn emit(&mut self, event: WorkerEvent<C::Module>) -> Flow {
		if self.events.send((self.role, event)).is_err() {
			return Flow::Shutdown;
		}
		Flow::Continue
	}
}

fn compile_error_from_native(native: NativeError) -> CompileError {
	CompileError {
		span: wire::span_from_native(native.start_line, native.start_column, native.end_line, native.end_column),
		msg: native.msg,
		is_block: native.is_block,
	}
}

fn explanation_span(native: &NativeExplanation) -> Span {
	wire::span_from_native(native.start_line, native.start_column, native.end_line, native.end_column)
}

#[cfg(test)]
mod tests;
