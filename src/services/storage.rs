use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::PathBuf,
    sync::Mutex,
};

use anyhow::{anyhow, Context};
use serde_json::{Map, Value};

pub const VISIBILITY_KEY: &str = "widgetVisible";

pub trait KeyValueStore: Send + Sync {
    fn read(&self, key: &str) -> anyhow::Result<Option<Value>>;
    fn write(&self, key: &str, value: Value) -> anyhow::Result<()>;
}

/// Durable store: a single JSON object on disk, replaced on every write.
/// Reads and writes block, so keep them off the async executor.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn load(&self) -> anyhow::Result<Map<String, Value>> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(Map::new()),
            Ok(content) => serde_json::from_str(&content)
                .with_context(|| format!("Corrupt store file {}", self.path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
        }
    }
}

impl KeyValueStore for JsonFileStore {
    fn read(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("Store lock poisoned"))?;
        Ok(self.load()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: Value) -> anyhow::Result<()> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("Store lock poisoned"))?;
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value);

        // Write beside the target and rename over it so a crash never
        // leaves a truncated file behind
        let content = serde_json::to_string_pretty(&entries)?;
        let staging = self.staging_path();
        fs::write(&staging, content)
            .with_context(|| format!("Failed to write {}", staging.display()))?;
        fs::rename(&staging, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))
    }
}

/// In-process store. Keeps a log of every write it received.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Value>>,
    writes: Mutex<Vec<(String, Value)>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<(String, Value)> {
        self.writes
            .lock()
            .map(|writes| writes.clone())
            .unwrap_or_default()
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> anyhow::Result<Option<Value>> {
        let entries = self.entries.lock().map_err(|_| anyhow!("Store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: Value) -> anyhow::Result<()> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("Store lock poisoned"))?
            .insert(key.to_string(), value.clone());
        self.writes
            .lock()
            .map_err(|_| anyhow!("Store lock poisoned"))?
            .push((key.to_string(), value));
        Ok(())
    }
}

/// Last persisted visibility. Failures read as "never persisted".
pub fn read_visibility(store: &dyn KeyValueStore) -> Option<bool> {
    match store.read(VISIBILITY_KEY) {
        Ok(value) => value.and_then(|v| v.as_bool()),
        Err(e) => {
            log::error!("Failed to read widget visibility: {:?}", e);
            None
        }
    }
}

pub fn write_visibility(store: &dyn KeyValueStore, visible: bool) {
    if let Err(e) = store.write(VISIBILITY_KEY, Value::Bool(visible)) {
        log::error!("Failed to persist widget visibility {}: {:?}", visible, e);
    }
}
