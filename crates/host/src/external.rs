//! Contracts for external collaborators.
//!
//! The editor widget and the durable store live outside the coordination
//! core; these traits are the only surface the core consumes.

/// Line-oriented read access to the editor buffer.
pub trait EditorText {
	/// Number of lines in the buffer.
	fn line_count(&self) -> usize;
	/// Text of line `index`, without its trailing newline.
	fn line(&self, index: usize) -> Option<&str>;
}

impl EditorText for str {
	fn line_count(&self) -> usize {
		self.lines().count()
	}

	fn line(&self, index: usize) -> Option<&str> {
		self.lines().nth(index)
	}
}

/// Best-effort key/value persistence. Not transactional; failures are
/// swallowed by implementations.
pub trait DurableStore {
	/// Reads a previously stored value.
	fn get(&self, key: &str) -> Option<String>;
	/// Stores a value, replacing any previous one.
	fn set(&mut self, key: &str, value: &str);
}

/// In-memory [`DurableStore`] for tests and headless runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
	entries: std::collections::HashMap<String, String>,
}

impl DurableStore for MemoryStore {
	fn get(&self, key: &str) -> Option<String> {
		self.entries.get(key).cloned()
	}

	fn set(&mut self, key: &str, value: &str) {
		self.entries.insert(key.to_owned(), value.to_owned());
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn str_lines_are_indexed_without_newlines() {
		let text = "fn main() {\n    body\n}";
		assert_eq!(text.line_count(), 3);
		assert_eq!(text.line(1), Some("    body"));
		assert_eq!(text.line(3), None);
	}

	#[test]
	fn memory_store_round_trips() {
		let mut store = MemoryStore::default();
		assert_eq!(store.get("code"), None);
		store.set("code", "fn main() {}");
		assert_eq!(store.get("code").as_deref(), Some("fn main() {}"));
	}
}
