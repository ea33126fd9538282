//! Versioned project chunk storage.
//!
//! Chunks are appended to a module's history and never overwritten, so every
//! saved version stays available for rollback.

pub mod json;

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::pipeline::record::now_millis;

pub use json::JsonFileStore;

pub type StoreData = BTreeMap<String, Project>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub created_at: i64,
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleHistory>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleHistory {
    /// Language given when the module was first stored.
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub versions: Vec<ChunkVersion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkVersion {
    pub chunk_id: u32,
    #[serde(default)]
    pub content: Option<String>,
    pub saved_at: i64,
}

/// Incoming chunk. Empty strings and a zero `chunk_id` count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSubmission {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub chunk_id: Option<u32>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredChunk {
    pub stored: bool,
    pub project: String,
    pub module: String,
    pub chunk_id: u32,
}

pub trait ProjectStore: Send + Sync {
    fn save_chunk(&self, chunk: ChunkSubmission) -> Result<StoredChunk, StorageError>;

    /// Snapshot of one project, `None` when it was never stored.
    fn project(&self, name: &str) -> Result<Option<Project>, StorageError>;

    fn clear_all(&self) -> Result<(), StorageError>;
}

fn required(value: Option<String>, field: &'static str) -> Result<String, StorageError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(StorageError::MissingField(field))
}

/// Append `chunk` to `data`, creating the project and module on first use.
pub(crate) fn append_chunk(
    data: &mut StoreData,
    chunk: ChunkSubmission,
) -> Result<StoredChunk, StorageError> {
    let project = required(chunk.project, "project")?;
    let module = required(chunk.module, "module")?;
    let chunk_id = chunk
        .chunk_id
        .filter(|id| *id != 0)
        .ok_or(StorageError::MissingField("chunk_id"))?;

    let now = now_millis();
    let history = data
        .entry(project.clone())
        .or_insert_with(|| Project {
            created_at: now,
            modules: BTreeMap::new(),
        })
        .modules
        .entry(module.clone())
        .or_insert_with(|| ModuleHistory {
            language: chunk.language.filter(|l| !l.is_empty()),
            versions: Vec::new(),
        });

    history.versions.push(ChunkVersion {
        chunk_id,
        content: chunk.content,
        saved_at: now,
    });

    tracing::debug!(
        project = project.as_str(),
        module = module.as_str(),
        chunk_id,
        versions = history.versions.len(),
        "chunk stored"
    );

    Ok(StoredChunk {
        stored: true,
        project,
        module,
        chunk_id,
    })
}

/// Process-local store, used by tests and as a scratch backend.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: Mutex<StoreData>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreData> {
        self.data
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl ProjectStore for InMemoryStore {
    fn save_chunk(&self, chunk: ChunkSubmission) -> Result<StoredChunk, StorageError> {
        append_chunk(&mut self.lock(), chunk)
    }

    fn project(&self, name: &str) -> Result<Option<Project>, StorageError> {
        Ok(self.lock().get(name).cloned())
    }

    fn clear_all(&self) -> Result<(), StorageError> {
        self.lock().clear();
        Ok(())
    }
}
