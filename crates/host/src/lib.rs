//! Editing-surface host: coordinates the editor with two compiler workers.
//!
//! The host owns the generation counter that makes concurrency safe: every
//! edit advances it, every worker response is checked against it, and
//! anything stale is dropped before it can touch visible state. Around that
//! core sit the debouncers (compile and hover), the reactive store the
//! renderer subscribes to, the two-worker topology with its compiled-module
//! handoff, and the async pump that ties them all together.

#![warn(missing_docs)]

pub mod coordinator;
pub mod external;
pub mod hint;
pub mod hover;
pub mod pump;
pub mod schedule;
pub mod store;
pub mod topology;

pub use coordinator::{Command, Coordinator, SOURCE_KEY};
pub use external::{DurableStore, EditorText, MemoryStore};
pub use hint::{HINT_MARGIN, missing_hint};
pub use hover::{HOVER_DEBOUNCE, HoverExplainer};
pub use pump::{HostLoop, UiInput};
pub use schedule::{COMPILE_DEBOUNCE, CompileScheduler};
pub use store::{CompilationView, HostState, Store, Subscriber};
pub use topology::WorkerTopology;
