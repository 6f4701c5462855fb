//! Async event pump tying the coordinator to the worker topology.
//!
//! One loop owns everything: editor input arrives on a channel, worker
//! events arrive on the topology's shared channel, and a timer wakes the
//! loop at the coordinator's earliest debounce deadline. After every wake
//! the coordinator is polled and any due commands are dispatched.

use std::time::Instant;

use lucid_compiler::Compiler;
use lucid_primitives::Location;
use lucid_protocol::{WorkerEvent, WorkerRequest, WorkerRole};
use lucid_worker::WorkerGone;
use tokio::sync::mpsc;
use tokio::time::sleep_until;
use tracing::{debug, error};

use crate::coordinator::{Command, Coordinator};
use crate::external::DurableStore;
use crate::topology::WorkerTopology;

/// Editor-side input to the host loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiInput {
	/// The source buffer changed.
	Edit {
		/// Full new source text.
		source: String,
	},
	/// The pointer rested over a position.
	PointerMoved {
		/// Pointer position.
		location: Location,
	},
	/// The user clicked a position.
	Click {
		/// Clicked position.
		location: Location,
	},
}

/// The host event loop: coordinator, topology, and the input channel.
pub struct HostLoop<C: Compiler, F: FnMut() -> C, P: DurableStore> {
	coordinator: Coordinator<P>,
	topology: WorkerTopology<C>,
	factory: F,
	inputs: mpsc::UnboundedReceiver<UiInput>,
}

impl<C: Compiler, F: FnMut() -> C, P: DurableStore> HostLoop<C, F, P> {
	/// Starts the primary worker and returns the loop plus the input sender.
	pub fn new(mut factory: F, persist: P) -> Result<(Self, mpsc::UnboundedSender<UiInput>), WorkerGone> {
		let topology = WorkerTopology::start(&mut factory)?;
		let (inputs_tx, inputs) = mpsc::unbounded_channel();
		let host = Self { coordinator: Coordinator::new(persist), topology, factory, inputs };
		Ok((host, inputs_tx))
	}

	/// The coordinator, for store subscriptions and persisted-source restore.
	pub fn coordinator_mut(&mut self) -> &mut Coordinator<P> {
		&mut self.coordinator
	}

	/// Runs until the input channel closes, then shuts the workers down.
	pub async fn run(mut self) {
		loop {
			let deadline = self.coordinator.next_due();
			tokio::select! {
				input = self.inputs.recv() => match input {
					Some(input) => self.apply_input(input),
					None => break,
				},
				event = self.topology.recv() => match event {
					Some((role, event)) => self.apply_event(role, event),
					None => break,
				},
				() = sleep_at(deadline) => {}
			}
			for command in self.coordinator.poll(Instant::now()) {
				self.dispatch(command);
			}
		}
		self.topology.shutdown().await;
	}

	fn apply_input(&mut self, input: UiInput) {
		match input {
			UiInput::Edit { source } => {
				self.coordinator.begin_edit(source, Instant::now());
			}
			UiInput::PointerMoved { location } => {
				self.coordinator.pointer_moved(location, Instant::now());
			}
			UiInput::Click { location } => {
				if let Some(command) = self.coordinator.click(location) {
					self.dispatch(command);
				}
			}
		}
	}

	fn apply_event(&mut self, role: WorkerRole, event: WorkerEvent<C::Module>) {
		match (role, event) {
			(WorkerRole::Primary, WorkerEvent::Ready { module }) => {
				if let Err(err) = self.topology.seed_secondary(&mut self.factory, module) {
					error!(error = %err, "failed to seed the secondary worker");
				}
				self.coordinator.mark_primary_ready();
			}
			(WorkerRole::Secondary, WorkerEvent::Ready { .. }) => {
				debug!("secondary worker ready");
			}
			(WorkerRole::Primary, WorkerEvent::Compiled) => {
				for command in self.coordinator.on_compiled() {
					self.dispatch(command);
				}
			}
			(WorkerRole::Primary, WorkerEvent::CompileFailed { error }) => {
				for command in self.coordinator.on_compile_failed(error) {
					self.dispatch(command);
				}
			}
			(WorkerRole::Primary, WorkerEvent::Explanation { location }) => {
				for command in self.coordinator.on_explanation(location) {
					self.dispatch(command);
				}
			}
			(WorkerRole::Primary, WorkerEvent::Elaboration { result }) => {
				self.coordinator.on_elaboration(result);
			}
			(WorkerRole::Secondary, WorkerEvent::Exploration { spans }) => {
				self.coordinator.on_exploration(spans);
			}
			(role, _) => {
				error!(?role, "unexpected worker event");
			}
		}
	}

	fn dispatch(&mut self, command: Command) {
		let sent = match command {
			Command::CompilePrimary { source } => {
				self.topology.send_primary(WorkerRequest::Compile { source })
			}
			Command::CompileSecondary { source } => {
				self.topology.send_secondary(WorkerRequest::Compile { source })
			}
			Command::StopSecondary => self.topology.send_secondary(WorkerRequest::StopCompilation),
			Command::Explain { location } => self.topology.send_primary(WorkerRequest::Explain { location }),
			Command::Elaborate { location } => {
				self.topology.send_primary(WorkerRequest::Elaborate { location })
			}
		};
		if let Err(err) = sent {
			error!(error = %err, "dropping command for an exited worker");
		}
	}
}

/// Sleeps until `deadline`, or forever when there is none.
async fn sleep_at(deadline: Option<Instant>) {
	match deadline {
		Some(deadline) => sleep_until(deadline.into()).await,
		None => std::future::pending().await,
	}
}
