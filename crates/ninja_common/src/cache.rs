//! Local ephemeral XP cache.
//!
//! A last-resort record of a user's XP, read by the engine only when the
//! remote service is unreachable. Entries are keyed `xp_<userId>` and hold a
//! plain integer. Never authoritative.

use crate::error::{NinjaError, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// Key under which a user's XP is cached
pub fn cache_key(user_id: &str) -> String {
    format!("xp_{}", user_id)
}

/// Key-value store for fallback XP
pub trait XpCache: Send + Sync {
    /// Cached XP for a user, if any
    fn get(&self, user_id: &str) -> Result<Option<u64>>;

    /// Record XP for a user
    fn put(&self, user_id: &str, xp: u64) -> Result<()>;
}

// ============================================================================
// File cache
// ============================================================================

/// Cache backed by a single JSON object file: `{"xp_u1": 1200, ...}`
pub struct FileXpCache {
    path: PathBuf,
}

impl FileXpCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all entries. Values that aren't integers are skipped.
    pub fn entries(&self) -> Result<BTreeMap<String, u64>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(&content)
            .map_err(|e| NinjaError::Cache(format!("{}: {}", self.path.display(), e)))?;

        let mut entries = BTreeMap::new();
        for (key, value) in raw {
            match parse_entry(&value) {
                Some(xp) => {
                    entries.insert(key, xp);
                }
                None => warn!(%key, "skipping malformed xp cache entry"),
            }
        }
        Ok(entries)
    }

    fn write_entries(&self, entries: &BTreeMap<String, u64>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write-then-rename so a crash never leaves a half-written file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Accept integers and integer strings; stored values may come from older
/// clients that wrote strings.
fn parse_entry(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl XpCache for FileXpCache {
    fn get(&self, user_id: &str) -> Result<Option<u64>> {
        Ok(self.entries()?.get(&cache_key(user_id)).copied())
    }

    fn put(&self, user_id: &str, xp: u64) -> Result<()> {
        let mut entries = match self.entries() {
            Ok(entries) => entries,
            Err(NinjaError::Cache(msg)) => {
                warn!(error = %msg, "xp cache unreadable, starting fresh");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(cache_key(user_id), xp);
        self.write_entries(&entries)
    }
}

// ============================================================================
// Memory cache
// ============================================================================

/// In-process cache
#[derive(Debug, Default)]
pub struct MemoryXpCache {
    entries: Mutex<HashMap<String, u64>>,
}

impl MemoryXpCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache pre-seeded with one entry
    pub fn with_entry(user_id: &str, xp: u64) -> Self {
        let cache = Self::new();
        cache
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(cache_key(user_id), xp);
        cache
    }
}

impl XpCache for MemoryXpCache {
    fn get(&self, user_id: &str) -> Result<Option<u64>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(&cache_key(user_id)).copied())
    }

    fn put(&self, user_id: &str, xp: u64) -> Result<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(cache_key(user_id), xp);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cache_key() {
        assert_eq!(cache_key("u1"), "xp_u1");
    }

    #[test]
    fn test_memory_cache() {
        let cache = MemoryXpCache::with_entry("u1", 1200);
        assert_eq!(cache.get("u1").unwrap(), Some(1200));
        assert_eq!(cache.get("u2").unwrap(), None);
        cache.put("u2", 5).unwrap();
        assert_eq!(cache.get("u2").unwrap(), Some(5));
    }

    #[test]
    fn test_file_cache_missing_file() {
        let dir = TempDir::new().unwrap();
        let cache = FileXpCache::new(dir.path().join("xp_cache.json"));
        assert_eq!(cache.get("u1").unwrap(), None);
    }

    #[test]
    fn test_file_cache_put_get() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("xp_cache.json");
        let cache = FileXpCache::new(&path);

        cache.put("u1", 1200).unwrap();
        cache.put("u2", 40).unwrap();
        cache.put("u1", 1300).unwrap();

        assert_eq!(cache.get("u1").unwrap(), Some(1300));
        assert_eq!(cache.get("u2").unwrap(), Some(40));

        let on_disk: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["xp_u1"], 1300);
    }

    #[test]
    fn test_file_cache_tolerates_string_and_junk_values() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("xp_cache.json");
        fs::write(&path, r#"{"xp_u1": "1200", "xp_u2": "abc", "xp_u3": -5}"#).unwrap();

        let cache = FileXpCache::new(&path);
        assert_eq!(cache.get("u1").unwrap(), Some(1200));
        assert_eq!(cache.get("u2").unwrap(), None);
        assert_eq!(cache.get("u3").unwrap(), None);
    }

    #[test]
    fn test_file_cache_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("xp_cache.json");
        fs::write(&path, "not json").unwrap();

        let cache = FileXpCache::new(&path);
        assert!(matches!(cache.get("u1"), Err(NinjaError::Cache(_))));

        // A write replaces the corrupt file
        cache.put("u1", 7).unwrap();
        assert_eq!(cache.get("u1").unwrap(), Some(7));
    }
}
