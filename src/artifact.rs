//! Destinations for downloaded certificate material

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::errors::{Result, SslinkerError};

/// Receives downloaded files (root CA, leaf certificates, keys).
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Store `contents` under `file_name` and return where it ended up.
    async fn store(&self, file_name: &str, contents: &[u8]) -> Result<String>;
}

/// Replace characters that are not safe in file names on common platforms.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim_matches(|c| c == '.' || c == ' ');
    if trimmed.is_empty() {
        "download".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Writes artifacts into a directory, creating it on first use
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn store(&self, file_name: &str, contents: &[u8]) -> Result<String> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            SslinkerError::io(format!("Failed to create directory: {}", self.dir.display()), e)
        })?;

        let path = self.dir.join(sanitize_file_name(file_name));
        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| SslinkerError::io(format!("Failed to write {}", path.display()), e))?;

        tracing::debug!(path = %path.display(), bytes = contents.len(), "Stored artifact");
        Ok(path.display().to_string())
    }
}

/// Keeps artifacts in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored `(file name, contents)` pairs in arrival order
    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn store(&self, file_name: &str, contents: &[u8]) -> Result<String> {
        let mut files = self.files.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        files.push((file_name.to_string(), contents.to_vec()));
        Ok(format!("memory:{file_name}"))
    }
}
