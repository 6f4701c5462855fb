use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lucid_compiler::{CompileOutcome, LoadError};
use tokio::time::timeout;

use super::*;

const QUIET: Duration = Duration::from_millis(50);
const WAIT: Duration = Duration::from_secs(1);

#[derive(Default)]
struct FakeCompiler {
	fail_load: bool,
	compiles: VecDeque<ScriptedCompile>,
	loads: Arc<Mutex<Vec<Option<u64>>>>,
	freed: Arc<AtomicUsize>,
}

#[derive(Default)]
struct ScriptedCompile {
	error: Option<NativeError>,
	explanation: Option<NativeExplanation>,
	batches: VecDeque<Vec<[u32; 4]>>,
	endless_batch: Option<Vec<[u32; 4]>>,
}

struct FakeSession {
	explanation: Option<NativeExplanation>,
	batches: VecDeque<Vec<[u32; 4]>>,
	endless_batch: Option<Vec<[u32; 4]>>,
	freed: Arc<AtomicUsize>,
}

impl Compiler for FakeCompiler {
	type Module = u64;
	type Session = FakeSession;

	fn load(&mut self, module: Option<u64>) -> Result<u64, LoadError> {
		if self.fail_load {
			return Err(LoadError { reason: "scripted failure".into() });
		}
		self.loads.lock().unwrap().push(module);
		Ok(module.unwrap_or(7))
	}

	fn compile(&mut self, _source: &str) -> CompileOutcome<FakeSession> {
		let scripted = self.compiles.pop_front().unwrap_or_default();
		CompileOutcome {
			session: FakeSession {
				explanation: scripted.explanation,
				batches: scripted.batches,
				endless_batch: scripted.endless_batch,
				freed: Arc::clone(&self.freed),
			},
			error: scripted.error,
		}
	}
}

impl CompilerSession for FakeSession {
	fn explain(&mut self, _line: u32, _column: u32) -> Option<NativeExplanation> {
		self.explanation.clone()
	}

	fn explore(&mut self, buffer: &mut [u32]) -> usize {
		let batch = match self.batches.pop_front() {
			Some(batch) => batch,
			None => match &self.endless_batch {
				Some(batch) => batch.clone(),
				None => return 0,
			},
		};
		for (i, quad) in batch.iter().enumerate() {
			buffer[i * 4..i * 4 + 4].copy_from_slice(quad);
		}
		batch.len()
	}

	fn free(self) {
		self.freed.fetch_add(1, Ordering::SeqCst);
	}
}

type Events = mpsc::UnboundedReceiver<(WorkerRole, WorkerEvent<u64>)>;

fn span(start_line: u32, start_ch: u32, end_line: u32, end_ch: u32) -> Span {
	Span::new(Location::new(start_line, start_ch), Location::new(end_line, end_ch))
}

async fn next_event(events: &mut Events) -> (WorkerRole, WorkerEvent<u64>) {
	timeout(WAIT, events.recv())
		.await
		.expect("expected an event before timeout")
		.expect("event channel closed")
}

async fn assert_quiet(events: &mut Events) {
	assert!(timeout(QUIET, events.recv()).await.is_err(), "expected no event");
}

#[tokio::test]
async fn primary_load_reports_ready_with_module() {
	let (tx, mut events) = mpsc::unbounded_channel();
	let worker = spawn(WorkerRole::Primary, FakeCompiler::default(), tx);

	worker.send(WorkerRequest::Load { module: None }).unwrap();
	assert_eq!(next_event(&mut events).await, (WorkerRole::Primary, WorkerEvent::Ready { module: 7 }));
	worker.join().await;
}

#[tokio::test]
async fn seeded_load_reuses_the_handed_over_module() {
	let loads = Arc::new(Mutex::new(Vec::new()));
	let compiler = FakeCompiler { loads: Arc::clone(&loads), ..Default::default() };
	let (tx, mut events) = mpsc::unbounded_channel();
	let worker = spawn(WorkerRole::Secondary, compiler, tx);

	worker.send(WorkerRequest::Load { module: Some(7) }).unwrap();
	assert_eq!(next_event(&mut events).await, (WorkerRole::Secondary, WorkerEvent::Ready { module: 7 }));
	assert_eq!(loads.lock().unwrap().as_slice(), &[Some(7)]);
	worker.join().await;
}

#[tokio::test]
async fn load_failure_leaves_the_worker_unusable() {
	let compiler = FakeCompiler { fail_load: true, ..Default::default() };
	let (tx, mut events) = mpsc::unbounded_channel();
	let worker = spawn(WorkerRole::Primary, compiler, tx);

	worker.send(WorkerRequest::Load { module: None }).unwrap();
	worker.send(WorkerRequest::Compile { source: "fn f() {}".into() }).unwrap();
	assert_quiet(&mut events).await;
	worker.join().await;
}

#[tokio::test]
async fn compile_before_load_is_ignored() {
	let (tx, mut events) = mpsc::unbounded_channel();
	let worker = spawn(WorkerRole::Primary, FakeCompiler::default(), tx);

	worker.send(WorkerRequest::Compile { source: "fn f() {}".into() }).unwrap();
	worker.send(WorkerRequest::Load { module: None }).unwrap();
	// The only event is the Ready from the load; the early compile left
	// no trace.
	assert_eq!(next_event(&mut events).await, (WorkerRole::Primary, WorkerEvent::Ready { module: 7 }));
	assert_quiet(&mut events).await;
	worker.join().await;
}

#[tokio::test]
async fn primary_compile_reports_success_and_failure() {
	let compiler = FakeCompiler {
		compiles: VecDeque::from([
			ScriptedCompile::default(),
			ScriptedCompile {
				error: Some(NativeError {
					msg: "unbalanced delimiter".into(),
					start_line: 1,
					start_column: 8,
					end_line: 1,
					end_column: 8,
					is_block: true,
				}),
				..Default::default()
			},
		]),
		..Default::default()
	};
	let (tx, mut events) = mpsc::unbounded_channel();
	let worker = spawn(WorkerRole::Primary, compiler, tx);

	worker.send(WorkerRequest::Load { module: None }).unwrap();
	let _ = next_event(&mut events).await;

	worker.send(WorkerRequest::Compile { source: "fn f() {}".into() }).unwrap();
	assert_eq!(next_event(&mut events).await, (WorkerRole::Primary, WorkerEvent::Compiled));

	worker.send(WorkerRequest::Compile { source: "fn f() {".into() }).unwrap();
	assert_eq!(
		next_event(&mut events).await,
		(
			WorkerRole::Primary,
			WorkerEvent::CompileFailed {
				error: CompileError {
					span: span(0, 8, 0, 8),
					msg: "unbalanced delimiter".into(),
					is_block: true,
				},
			},
		)
	);
	worker.join().await;
}

#[tokio::test]
async fn explain_without_a_session_reports_unbound() {
	let (tx, mut events) = mpsc::unbounded_channel();
	let worker = spawn(WorkerRole::Primary, FakeCompiler::default(), tx);

	worker.send(WorkerRequest::Load { module: None }).unwrap();
	let _ = next_event(&mut events).await;

	worker.send(WorkerRequest::Explain { location: Location::new(0, 0) }).unwrap();
	assert_eq!(next_event(&mut events).await, (WorkerRole::Primary, WorkerEvent::Explanation { location: None }));
	worker.join().await;
}

#[tokio::test]
async fn explain_and_elaborate_convert_native_coordinates() {
	let native = NativeExplanation {
		start_line: 3,
		start_column: 1,
		end_line: 3,
		end_column: 5,
		title: "let binding".into(),
		elaboration: "introduces a new binding".into(),
		book: Some("ch03-01".into()),
		keyword: None,
	};
	let compiler = FakeCompiler {
		compiles: VecDeque::from([ScriptedCompile { explanation: Some(native), ..Default::default() }]),
		..Default::default()
	};
	let (tx, mut events) = mpsc::unbounded_channel();
	let worker = spawn(WorkerRole::Primary, compiler, tx);

	worker.send(WorkerRequest::Load { module: None }).unwrap();
	let _ = next_event(&mut events).await;
	worker.send(WorkerRequest::Compile { source: "let x = 1;".into() }).unwrap();
	let _ = next_event(&mut events).await;

	worker.send(WorkerRequest::Explain { location: Location::new(2, 2) }).unwrap();
	assert_eq!(
		next_event(&mut events).await,
		(WorkerRole::Primary, WorkerEvent::Explanation { location: Some(span(2, 1, 2, 5)) })
	);

	worker.send(WorkerRequest::Elaborate { location: Location::new(2, 2) }).unwrap();
	assert_eq!(
		next_event(&mut events).await,
		(
			WorkerRole::Primary,
			WorkerEvent::Elaboration {
				result: Some(Elaboration {
					location: span(2, 1, 2, 5),
					title: "let binding".into(),
					elaboration: "introduces a new binding".into(),
					book: Some("ch03-01".into()),
					keyword: None,
				}),
			},
		)
	);
	worker.join().await;
}

#[tokio::test]
async fn secondary_ignores_interactive_requests_and_streams_exploration() {
	let compiler = FakeCompiler {
		compiles: VecDeque::from([ScriptedCompile {
			batches: VecDeque::from([vec![[1, 0, 1, 2], [1, 0, 1, 2], [2, 1, 2, 4]]]),
			..Default::default()
		}]),
		..Default::default()
	};
	let (tx, mut events) = mpsc::unbounded_channel();
	let worker = spawn(WorkerRole::Secondary, compiler, tx);

	worker.send(WorkerRequest::Load { module: Some(9) }).unwrap();
	let _ = next_event(&mut events).await;

	worker.send(WorkerRequest::Explain { location: Location::new(0, 0) }).unwrap();
	worker.send(WorkerRequest::Elaborate { location: Location::new(0, 0) }).unwrap();
	worker.send(WorkerRequest::Compile { source: "fn f() {}".into() }).unwrap();

	assert_eq!(
		next_event(&mut events).await,
		(
			WorkerRole::Secondary,
			WorkerEvent::Exploration { spans: vec![span(0, 0, 0, 2), span(1, 1, 1, 4)] },
		)
	);
	assert_quiet(&mut events).await;
	worker.join().await;
}

#[tokio::test]
async fn failed_compile_on_secondary_starts_no_exploration() {
	let compiler = FakeCompiler {
		compiles: VecDeque::from([ScriptedCompile {
			error: Some(NativeError {
				msg: "nope".into(),
				start_line: 1,
				start_column: 0,
				end_line: 1,
				end_column: 1,
				is_block: false,
			}),
			batches: VecDeque::from([vec![[1, 0, 1, 2]]]),
			..Default::default()
		}]),
		..Default::default()
	};
	let (tx, mut events) = mpsc::unbounded_channel();
	let worker = spawn(WorkerRole::Secondary, compiler, tx);

	worker.send(WorkerRequest::Load { module: Some(9) }).unwrap();
	let _ = next_event(&mut events).await;
	worker.send(WorkerRequest::Compile { source: "fn f() {".into() }).unwrap();
	assert_quiet(&mut events).await;
	worker.join().await;
}

#[tokio::test]
async fn new_compile_supersedes_a_running_exploration() {
	let compiler = FakeCompiler {
		compiles: VecDeque::from([
			ScriptedCompile {
				endless_batch: Some(vec![[1, 0, 1, 1]]),
				..Default::default()
			},
			ScriptedCompile {
				batches: VecDeque::from([vec![[2, 0, 2, 2]]]),
				..Default::default()
			},
		]),
		..Default::default()
	};
	let (tx, mut events) = mpsc::unbounded_channel();
	let worker = spawn(WorkerRole::Secondary, compiler, tx);

	worker.send(WorkerRequest::Load { module: Some(9) }).unwrap();
	let _ = next_event(&mut events).await;

	// First compile explores endlessly and can never complete on its own.
	worker.send(WorkerRequest::Compile { source: "loop {}".into() }).unwrap();
	// The superseding compile swaps the session; only the second run may
	// ever report.
	worker.send(WorkerRequest::Compile { source: "fn f() {}".into() }).unwrap();

	assert_eq!(
		next_event(&mut events).await,
		(WorkerRole::Secondary, WorkerEvent::Exploration { spans: vec![span(1, 0, 1, 2)] })
	);
	assert_quiet(&mut events).await;
	worker.join().await;
}

#[tokio::test]
async fn stop_compilation_frees_the_session_and_abandons_exploration() {
	let freed = Arc::new(AtomicUsize::new(0));
	let compiler = FakeCompiler {
		freed: Arc::clone(&freed),
		compiles: VecDeque::from([
			ScriptedCompile {
				endless_batch: Some(vec![[1, 0, 1, 1]]),
				..Default::default()
			},
			ScriptedCompile::default(),
		]),
		..Default::default()
	};
	let (tx, mut events) = mpsc::unbounded_channel();
	let worker = spawn(WorkerRole::Secondary, compiler, tx);

	worker.send(WorkerRequest::Load { module: Some(9) }).unwrap();
	let _ = next_event(&mut events).await;

	worker.send(WorkerRequest::Compile { source: "loop {}".into() }).unwrap();
	worker.send(WorkerRequest::StopCompilation).unwrap();
	assert_quiet(&mut events).await;

	// The released session is freed; a later compile starts cleanly.
	assert_eq!(freed.load(Ordering::SeqCst), 1);
	worker.send(WorkerRequest::Compile { source: "fn f() {}".into() }).unwrap();
	assert_eq!(
		next_event(&mut events).await,
		(WorkerRole::Secondary, WorkerEvent::Exploration { spans: vec![] })
	);

	worker.join().await;
	assert_eq!(freed.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn primary_ignores_stop_compilation() {
	let compiler = FakeCompiler {
		compiles: VecDeque::from([ScriptedCompile::default()]),
		..Default::default()
	};
	let (tx, mut events) = mpsc::unbounded_channel();
	let worker = spawn(WorkerRole::Primary, compiler, tx);

	worker.send(WorkerRequest::Load { module: None }).unwrap();
	let _ = next_event(&mut events).await;
	worker.send(WorkerRequest::Compile { source: "fn f() {}".into() }).unwrap();
	let _ = next_event(&mut events).await;

	worker.send(WorkerRequest::StopCompilation).unwrap();
	// The primary's session survives; explain still answers.
	worker.send(WorkerRequest::Explain { location: Location::new(0, 0) }).unwrap();
	assert_eq!(next_event(&mut events).await, (WorkerRole::Primary, WorkerEvent::Explanation { location: None }));
	worker.join().await;
}
