//! Free-then-replace session ownership.

use crate::CompilerSession;

/// Structural identity of one installed session.
///
/// Monotonically increasing per slot. A loop that captured the id of the
/// session it iterates over can detect that a newer compile replaced it and
/// stop on its next turn; this is the only cancellation mechanism for
/// in-flight native work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

/// Holder for the at-most-one live session of a worker.
///
/// Installing a session always frees the previous one first. There is no
/// implicit release on drop; callers release explicitly so the native
/// session lifetime stays visible.
#[derive(Debug)]
pub struct SessionSlot<S: CompilerSession> {
	next_id: u64,
	current: Option<(SessionId, S)>,
}

impl<S: CompilerSession> Default for SessionSlot<S> {
	fn default() -> Self {
		Self::new()
	}
}

impl<S: CompilerSession> SessionSlot<S> {
	/// Creates an empty slot.
	#[must_use]
	pub fn new() -> Self {
		Self { next_id: 0, current: None }
	}

	/// Frees the previous session, if any, and installs `session`.
	pub fn install(&mut self, session: S) -> SessionId {
		self.release();
		let id = SessionId(self.next_id);
		self.next_id += 1;
		self.current = Some((id, session));
		id
	}

	/// Frees the current session, leaving the slot empty.
	pub fn release(&mut self) {
		if let Some((_, session)) = self.current.take() {
			session.free();
		}
	}

	/// Returns the identity of the current session, if one is installed.
	#[must_use]
	pub fn current_id(&self) -> Option<SessionId> {
		self.current.as_ref().map(|(id, _)| *id)
	}

	/// Returns the current session when `id` still identifies it.
	///
	/// `None` means the session was replaced or released since `id` was
	/// captured; callers treat that as cooperative cancellation.
	pub fn session_mut(&mut self, id: SessionId) -> Option<&mut S> {
		match &mut self.current {
			Some((current, session)) if *current == id => Some(session),
			_ => None,
		}
	}

	/// Returns the current session and its identity.
	pub fn current_mut(&mut self) -> Option<(SessionId, &mut S)> {
		self.current.as_mut().map(|(id, session)| (*id, &mut *session))
	}
}
