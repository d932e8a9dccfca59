//! Keyed storage for rendered chart artifacts.
//!
//! Artifacts are addressed by their logical chart name and every write
//! replaces the previous artifact under that name. Stores are shared between
//! the analyzer that writes charts and whatever serves them afterwards, so
//! both methods take `&self`.
//!
//! Concurrent analyses writing to the same store may interleave their
//! artifacts; no isolation between runs is provided.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::AnalysisError;

/// A keyed artifact store.
pub trait ArtifactStore: Send + Sync {
    /// Stores `bytes` under `name`, replacing any existing artifact.
    fn put(&self, name: &str, bytes: Vec<u8>) -> Result<(), AnalysisError>;

    /// Returns the artifact stored under `name`, if any.
    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, AnalysisError>;
}

/// In-memory store.
///
/// # Examples
///
/// ```
/// use u_capability::store::{ArtifactStore, MemoryStore};
///
/// let store = MemoryStore::new();
/// store.put("histogram", vec![1, 2, 3]).unwrap();
/// store.put("histogram", vec![4]).unwrap();
/// assert_eq!(store.get("histogram").unwrap(), Some(vec![4]));
/// assert_eq!(store.get("i_chart").unwrap(), None);
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    artifacts: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of all stored artifacts, sorted.
    pub fn names(&self) -> Vec<String> {
        let artifacts = self
            .artifacts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut names: Vec<String> = artifacts.keys().cloned().collect();
        names.sort();
        names
    }
}

impl ArtifactStore for MemoryStore {
    fn put(&self, name: &str, bytes: Vec<u8>) -> Result<(), AnalysisError> {
        self.artifacts
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(name.to_string(), bytes);
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, AnalysisError> {
        Ok(self
            .artifacts
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(name)
            .cloned())
    }
}

/// Directory-backed store writing `<root>/<name>.png`.
///
/// The root directory is created on first write.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path an artifact is stored at.
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.png"))
    }
}

impl ArtifactStore for DirStore {
    fn put(&self, name: &str, bytes: Vec<u8>) -> Result<(), AnalysisError> {
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(name);
        fs::write(&path, bytes)?;
        tracing::debug!(path = %path.display(), "wrote artifact");
        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<Vec<u8>>, AnalysisError> {
        match fs::read(self.path_for(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}
