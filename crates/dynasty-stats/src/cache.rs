// File snapshot cache for computed reports.
//
// A snapshot is fresh while its modification time is younger than the TTL.
// Missing, stale, unreadable or corrupt snapshots are all misses. Writes go
// to a sibling temp file that is renamed over the snapshot, so a reader sees
// either the old file or the new one. Each write gets its own temp name, so
// overlapping recomputes never share a temp file.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

static NEXT_WRITE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CacheError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SnapshotCache {
    path: PathBuf,
    ttl: Duration,
}

impl SnapshotCache {
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: path.into(),
            ttl,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A temp name unique to this process and this write.
    fn temp_path(&self) -> PathBuf {
        let write = NEXT_WRITE.fetch_add(1, Ordering::Relaxed);
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(format!(".{}.{write}.tmp", std::process::id()));
        PathBuf::from(tmp)
    }

    /// The cached value, if a fresh and readable snapshot exists.
    pub async fn lookup<T: DeserializeOwned>(&self) -> Option<T> {
        self.lookup_at(SystemTime::now()).await
    }

    /// Like [`lookup`](Self::lookup), judging freshness as of `now`.
    pub async fn lookup_at<T: DeserializeOwned>(&self, now: SystemTime) -> Option<T> {
        let path = self.path.display();
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(%path, "no snapshot found");
                return None;
            }
            Err(e) => {
                warn!(%path, "cannot stat snapshot: {e}");
                return None;
            }
        };
        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(e) => {
                warn!(%path, "snapshot has no modification time: {e}");
                return None;
            }
        };

        // A modification time in the future counts as brand new.
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        let age_hours = age.as_secs_f64() / 3600.0;
        if age >= self.ttl {
            info!(%path, age_hours = %format!("{age_hours:.2}"), "snapshot is stale");
            return None;
        }

        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) => {
                warn!(%path, "cannot read snapshot: {e}");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(value) => {
                info!(%path, age_hours = %format!("{age_hours:.2}"), "loaded snapshot");
                Some(value)
            }
            Err(e) => {
                warn!(%path, "ignoring corrupt snapshot: {e}");
                None
            }
        }
    }

    /// Atomically replace the snapshot with `value`.
    pub async fn store<T: Serialize>(&self, value: &T) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CacheError::io(parent, e))?;
        }
        let body = serde_json::to_string_pretty(value)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| CacheError::io(&tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CacheError::io(&self.path, e));
        }
        debug!(path = %self.path.display(), "snapshot written");
        Ok(())
    }

    /// Serve a fresh snapshot, or run `compute` and write its result back.
    ///
    /// `refresh` skips the read. A failed write is logged and the computed
    /// value is still returned; a failed computation is returned untouched
    /// and nothing is written.
    pub async fn get_or_compute<T, E, F, Fut>(&self, refresh: bool, compute: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.get_or_compute_at(SystemTime::now(), refresh, compute).await
    }

    pub async fn get_or_compute_at<T, E, F, Fut>(
        &self,
        now: SystemTime,
        refresh: bool,
        compute: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if refresh {
            info!(path = %self.path.display(), "refresh requested, bypassing snapshot");
        } else if let Some(value) = self.lookup_at(now).await {
            return Ok(value);
        }

        let value = compute().await?;
        if let Err(e) = self.store(&value).await {
            warn!("failed to write snapshot: {e}");
        }
        Ok(value)
    }
}
