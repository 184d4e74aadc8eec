// src/dedup.rs
//! Last-posted marker: one durable slot holding the dedup key of the last
//! announcement that actually went out.
//!
//! A missing, unreadable or blank marker reads as "nothing posted yet". A
//! crash between the temp write and the rename leaves the previous marker in
//! place, so the worst case is one repeated announcement after a restart.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tokio::{fs, io::AsyncWriteExt};

#[async_trait::async_trait]
pub trait DedupStore: Send + Sync {
    /// The committed key, trimmed; `None` when there is no usable marker.
    async fn last_posted(&self) -> Option<String>;

    /// Store `key` as the last successful announcement.
    async fn commit(&self, key: &str) -> Result<()>;

    async fn was_last_posted(&self, key: &str) -> bool {
        self.last_posted().await.as_deref() == Some(key)
    }
}

/// Marker kept as plain UTF-8 text in a single file.
#[derive(Debug, Clone)]
pub struct FileDedupStore {
    path: PathBuf,
}

impl FileDedupStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut s: OsString = self.path.clone().into_os_string();
        s.push(".tmp");
        PathBuf::from(s)
    }
}

#[async_trait::async_trait]
impl DedupStore for FileDedupStore {
    async fn last_posted(&self) -> Option<String> {
        let bytes = match fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "marker unreadable, treating as empty");
                return None;
            }
        };
        match String::from_utf8(bytes) {
            Ok(s) => {
                let key = s.trim();
                (!key.is_empty()).then(|| key.to_string())
            }
            Err(_) => {
                tracing::warn!(path = %self.path.display(), "marker is not UTF-8, treating as empty");
                None
            }
        }
    }

    async fn commit(&self, key: &str) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("creating marker dir {}", dir.display()))?;
        }

        let tmp = self.temp_path();
        let mut f = fs::File::create(&tmp)
            .await
            .with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(key.as_bytes())
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        f.sync_all().await.context("syncing marker")?;
        drop(f);

        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing marker {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), key, "marker committed");
        Ok(())
    }
}

/// Process-local marker for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryDedupStore {
    key: Mutex<Option<String>>,
}

impl MemoryDedupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_marker(key: &str) -> Self {
        Self {
            key: Mutex::new(Some(key.to_string())),
        }
    }
}

#[async_trait::async_trait]
impl DedupStore for MemoryDedupStore {
    async fn last_posted(&self) -> Option<String> {
        self.key
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    async fn commit(&self, key: &str) -> Result<()> {
        *self.key.lock().unwrap_or_else(|e| e.into_inner()) = Some(key.trim().to_string());
        Ok(())
    }
}
