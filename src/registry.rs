//! Job Registry
//!
//! Durable record of every job id this client has successfully submitted,
//! surviving restarts. The mapping is JobId -> JobId; the value is
//! redundant with the key, but the map shape lets the set of known jobs
//! be enumerated and linked to, and mirrors the persisted wire format.
//!
//! Persistence is an injected `RegistryStore`: the real store keeps the
//! serialized mapping under one named key in the state database, and an
//! in-memory stub stands in for tests. Corrupt or absent persisted data
//! loads as an empty registry, never an error.

use std::collections::BTreeMap;
use std::sync::Mutex;

use anyhow::Result;
use tracing::warn;

use crate::state::Database;
use crate::types::JobId;

/// The single durable key holding the registry mapping.
pub const REGISTRY_KEY: &str = "requestIds";

/// Load/save of the raw serialized registry mapping.
pub trait RegistryStore {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, raw: &str) -> Result<()>;
}

/// Store backed by the SQLite state database.
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl RegistryStore for SqliteStore {
    fn load(&self) -> Result<Option<String>> {
        self.db.get_kv(REGISTRY_KEY)
    }

    fn save(&self, raw: &str) -> Result<()> {
        self.db.set_kv(REGISTRY_KEY, raw)
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Default)]
pub struct MemoryStore {
    raw: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the store with a raw persisted value.
    pub fn with_raw(raw: &str) -> Self {
        Self {
            raw: Mutex::new(Some(raw.to_string())),
        }
    }
}

impl RegistryStore for MemoryStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.raw.lock().unwrap().clone())
    }

    fn save(&self, raw: &str) -> Result<()> {
        *self.raw.lock().unwrap() = Some(raw.to_string());
        Ok(())
    }
}

// A shared store handle works anywhere a store does.
impl<S: RegistryStore + ?Sized> RegistryStore for std::sync::Arc<S> {
    fn load(&self) -> Result<Option<String>> {
        (**self).load()
    }

    fn save(&self, raw: &str) -> Result<()> {
        (**self).save(raw)
    }
}

/// The persisted mapping of known job ids.
pub struct JobRegistry<S: RegistryStore> {
    ids: BTreeMap<JobId, JobId>,
    store: S,
}

impl<S: RegistryStore> JobRegistry<S> {
    /// Restore the registry from `store`. Absent or unparseable data
    /// yields an empty registry; this never fails the calling context.
    pub fn load(store: S) -> Self {
        let ids = match store.load() {
            Ok(Some(raw)) => match serde_json::from_str::<BTreeMap<JobId, JobId>>(&raw) {
                Ok(map) => map,
                Err(e) => {
                    warn!("persisted job registry is corrupt, starting empty: {e}");
                    BTreeMap::new()
                }
            },
            Ok(None) => BTreeMap::new(),
            Err(e) => {
                warn!("failed to read persisted job registry, starting empty: {e}");
                BTreeMap::new()
            }
        };
        Self { ids, store }
    }

    /// Idempotently add `id` and persist the whole mapping. Re-registering
    /// a known id is a no-op.
    pub fn register(&mut self, id: &str) -> Result<()> {
        if self.ids.contains_key(id) {
            return Ok(());
        }
        self.ids.insert(id.to_string(), id.to_string());
        let raw = serde_json::to_string(&self.ids)?;
        self.store.save(&raw)?;
        Ok(())
    }

    /// All known job ids, in a stable (lexicographic) order.
    pub fn list(&self) -> impl Iterator<Item = &str> {
        self.ids.keys().map(|k| k.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_empty_store() {
        let registry = JobRegistry::load(MemoryStore::new());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_register_persists_and_survives_reload() {
        let store = std::sync::Arc::new(MemoryStore::new());
        {
            let mut registry = JobRegistry::load(store.clone());
            registry.register("abc").unwrap();
        }
        let registry = JobRegistry::load(store);
        assert!(registry.contains("abc"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = JobRegistry::load(MemoryStore::new());
        registry.register("abc").unwrap();
        registry.register("abc").unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_corrupt_data_loads_empty() {
        let registry = JobRegistry::load(MemoryStore::with_raw("not json at all {{{"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_wrong_shape_loads_empty() {
        let registry = JobRegistry::load(MemoryStore::with_raw(r#"["a", "b"]"#));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_list_is_stable_and_restartable() {
        let mut registry = JobRegistry::load(MemoryStore::new());
        registry.register("b").unwrap();
        registry.register("a").unwrap();
        let first: Vec<&str> = registry.list().collect();
        let second: Vec<&str> = registry.list().collect();
        assert_eq!(first, vec!["a", "b"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_sqlite_store_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteStore::new(db);
        let mut registry = JobRegistry::load(store);
        registry.register("job-1").unwrap();
        assert!(registry.contains("job-1"));
    }
}
