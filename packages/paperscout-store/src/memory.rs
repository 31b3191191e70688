use std::{collections::HashMap, sync::Mutex};

use serde_json::Value;

use crate::{CacheKind, CacheStore, Result};

/// Run-scoped cache. Entries live for the lifetime of the store and never
/// expire; a fresh store per run gives run-level deduplication without any
/// cross-run persistence.
#[derive(Debug, Default)]
pub struct MemoryStore {
	entries: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn slot(kind: CacheKind, key: &str) -> String {
		format!("{}:{key}", kind.as_str())
	}
}

impl CacheStore for MemoryStore {
	fn get(&self, kind: CacheKind, key: &str) -> Result<Option<Value>> {
		let entries = self.entries.lock().expect("cache lock poisoned");

		Ok(entries.get(&Self::slot(kind, key)).cloned())
	}

	fn put(&self, kind: CacheKind, key: &str, value: Value) -> Result<()> {
		let mut entries = self.entries.lock().expect("cache lock poisoned");

		entries.insert(Self::slot(kind, key), value);

		Ok(())
	}
}
