mod error;
mod file;
mod memory;

pub use error::{Error, Result};
pub use file::FileStore;
pub use memory::MemoryStore;

use serde_json::Value;

/// What a cached payload is, used to namespace keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheKind {
	Corpus,
	Synonyms,
	Rubric,
}

impl CacheKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Corpus => "corpus",
			Self::Synonyms => "synonyms",
			Self::Rubric => "rubric",
		}
	}
}

/// An injected key-value cache. Implementations must answer from local state
/// only; a cache read never reaches the network. A missing, expired, or
/// undecodable entry is a miss, not an error surfaced to the pipeline.
pub trait CacheStore
where
	Self: Send + Sync,
{
	fn get(&self, kind: CacheKind, key: &str) -> Result<Option<Value>>;
	fn put(&self, kind: CacheKind, key: &str, value: Value) -> Result<()>;
}

/// Stable fingerprint over ordered key material. Parts are length-prefixed so
/// that ("ab", "c") and ("a", "bc") never collide.
pub fn fingerprint(kind: CacheKind, parts: &[&str]) -> String {
	let mut hasher = blake3::Hasher::new();

	hasher.update(kind.as_str().as_bytes());

	for part in parts {
		hasher.update(&(part.len() as u64).to_le_bytes());
		hasher.update(part.as_bytes());
	}

	hasher.finalize().to_hex().to_string()
}

/// Short key prefix for log lines; full keys are noise.
pub fn key_prefix(key: &str) -> &str {
	&key[..key.len().min(12)]
}
