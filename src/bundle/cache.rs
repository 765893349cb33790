//! Memoization of bundling results keyed by path and modification time.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use anyhow::{Context, Result};
use dashmap::DashMap;
use tokio::sync::OnceCell;

use super::{BundleOutput, Bundler};
use crate::debug;

/// A changed mtime is a different key; stale entries are superseded, never
/// evicted in place. The cache lives for one pipeline run and is discarded
/// with the process, so unbounded growth is accepted.
type BundleKey = (PathBuf, SystemTime);

/// Concurrency-safe cache in front of the [`Bundler`] capability.
///
/// The miss path is single-flight: concurrent `obtain` calls for the same
/// key share one in-progress bundling run instead of invoking the bundler
/// redundantly. A failed run leaves the entry empty so a later call retries.
pub struct BundleCache {
    bundler: Box<dyn Bundler>,
    entries: DashMap<BundleKey, Arc<OnceCell<Arc<BundleOutput>>>>,
}

impl BundleCache {
    pub fn new(bundler: Box<dyn Bundler>) -> Self {
        Self {
            bundler,
            entries: DashMap::new(),
        }
    }

    /// Bundled code for `entry`, reusing the cached result while the file's
    /// modification time is unchanged.
    ///
    /// Bundler failures propagate; it is the caller that decides whether to
    /// downgrade them.
    pub async fn obtain(&self, entry: &Path) -> Result<Arc<BundleOutput>> {
        let mtime = tokio::fs::metadata(entry)
            .await
            .and_then(|meta| meta.modified())
            .with_context(|| format!("failed to stat script {}", entry.display()))?;

        // Clone the cell out so the shard lock is not held across await
        let cell = self
            .entries
            .entry((entry.to_path_buf(), mtime))
            .or_default()
            .clone();

        let bundled = cell
            .get_or_try_init(|| async {
                debug!("bundle"; "cache miss for {}", entry.display());
                self.bundler.bundle(entry).await.map(Arc::new)
            })
            .await?;

        Ok(Arc::clone(bundled))
    }

    /// Number of stored keys (distinct path/mtime pairs).
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
