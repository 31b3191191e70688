use std::{
	fs,
	path::{Path, PathBuf},
	time::{Duration, SystemTime},
};

use serde_json::Value;

use crate::{CacheKind, CacheStore, Result};

/// On-disk cache with one JSON file per key. Freshness is judged from the
/// file's mtime against a fixed TTL; a stale or undecodable file reads as a
/// miss and is overwritten by the next put.
#[derive(Debug)]
pub struct FileStore {
	dir: PathBuf,
	ttl: Duration,
}

impl FileStore {
	pub fn new<P>(dir: P, ttl_hours: u64) -> Result<Self>
	where
		P: Into<PathBuf>,
	{
		let dir = dir.into();

		fs::create_dir_all(&dir)?;

		Ok(Self { dir, ttl: Duration::from_secs(ttl_hours * 3_600) })
	}

	fn path(&self, kind: CacheKind, key: &str) -> PathBuf {
		self.dir.join(format!("{}_{key}.json", kind.as_str()))
	}

	fn is_fresh(&self, path: &Path) -> bool {
		let Ok(meta) = path.metadata() else {
			return false;
		};
		let Ok(modified) = meta.modified() else {
			return false;
		};

		match SystemTime::now().duration_since(modified) {
			Ok(age) => age <= self.ttl,
			// Clock skew put the mtime in the future; treat it as fresh.
			Err(_) => true,
		}
	}
}

impl CacheStore for FileStore {
	fn get(&self, kind: CacheKind, key: &str) -> Result<Option<Value>> {
		let path = self.path(kind, key);

		if !self.is_fresh(&path) {
			return Ok(None);
		}

		let Ok(raw) = fs::read_to_string(&path) else {
			return Ok(None);
		};

		Ok(serde_json::from_str(&raw).ok())
	}

	fn put(&self, kind: CacheKind, key: &str, value: Value) -> Result<()> {
		let path = self.path(kind, key);
		let tmp = path.with_extension("json.tmp");

		fs::write(&tmp, serde_json::to_vec(&value)?)?;
		fs::rename(&tmp, &path)?;

		Ok(())
	}
}
