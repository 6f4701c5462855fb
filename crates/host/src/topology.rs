//! Two-worker topology management.
//!
//! The primary worker loads its compiler module from scratch; once it
//! reports [`WorkerEvent::Ready`] the compiled module is handed to a
//! freshly spawned secondary, which seeds its own load from it instead of
//! repeating the expensive bootstrap. Both workers report on one shared
//! event channel, tagged with their role.

use lucid_compiler::Compiler;
use lucid_protocol::{WorkerEvent, WorkerRequest, WorkerRole};
use lucid_worker::{WorkerGone, WorkerHandle, spawn};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Owns both worker handles and the shared event channel.
pub struct WorkerTopology<C: Compiler> {
	events_rx: mpsc::UnboundedReceiver<(WorkerRole, WorkerEvent<C::Module>)>,
	primary: WorkerHandle<C::Module>,
	secondary: Option<WorkerHandle<C::Module>>,
	events_tx: mpsc::UnboundedSender<(WorkerRole, WorkerEvent<C::Module>)>,
}

impl<C: Compiler> WorkerTopology<C> {
	/// Spawns the primary worker and starts its module load.
	///
	/// The secondary is not spawned until [`WorkerTopology::seed_secondary`]
	/// receives the primary's compiled module.
	pub fn start(factory: &mut impl FnMut() -> C) -> Result<Self, WorkerGone> {
		let (events_tx, events_rx) = mpsc::unbounded_channel();
		let primary = spawn(WorkerRole::Primary, factory(), events_tx.clone());
		primary.send(WorkerRequest::Load { module: None })?;
		Ok(Self { events_rx, primary, secondary: None, events_tx })
	}

	/// Spawns the secondary worker, seeding it with the primary's module.
	pub fn seed_secondary(
		&mut self,
		factory: &mut impl FnMut() -> C,
		module: C::Module,
	) -> Result<(), WorkerGone> {
		if self.secondary.is_some() {
			warn!("secondary worker already running, ignoring reseed");
			return Ok(());
		}
		info!("seeding secondary worker from the primary's module");
		let secondary = spawn(WorkerRole::Secondary, factory(), self.events_tx.clone());
		secondary.send(WorkerRequest::Load { module: Some(module) })?;
		self.secondary = Some(secondary);
		Ok(())
	}

	/// Sends a request to the primary worker.
	pub fn send_primary(&self, request: WorkerRequest<C::Module>) -> Result<(), WorkerGone> {
		self.primary.send(request)
	}

	/// Sends a request to the secondary worker.
	///
	/// Dropped with a warning when the secondary has not been seeded yet;
	/// exploration simply starts with the next successful compile.
	pub fn send_secondary(&self, request: WorkerRequest<C::Module>) -> Result<(), WorkerGone> {
		match &self.secondary {
			Some(secondary) => secondary.send(request),
			None => {
				warn!("secondary worker not seeded yet, dropping request");
				Ok(())
			}
		}
	}

	/// Receives the next event from either worker.
	pub async fn recv(&mut self) -> Option<(WorkerRole, WorkerEvent<C::Module>)> {
		self.events_rx.recv().await
	}

	/// Shuts both workers down and waits for their tasks to exit.
	pub async fn shutdown(self) {
		self.primary.join().await;
		if let Some(secondary) = self.secondary {
			secondary.join().await;
		}
	}
}
