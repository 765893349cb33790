//! Script bundling capability and its mtime-keyed cache.
//!
//! Bundling proper is a consumed capability behind the [`Bundler`] trait:
//! fold an entry script and its local imports into one self-contained,
//! minified payload and report every file that contributed. The pipeline
//! only ever talks to the [`BundleCache`] in front of it.

mod cache;
mod minify;

pub use cache::BundleCache;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;

/// Self-contained bundle produced for one entry script.
#[derive(Debug, Clone)]
pub struct BundleOutput {
    /// Bundled, minified code with no external module references.
    pub code: String,
    /// Absolute paths of every file that contributed to the bundle.
    pub input_files: Vec<PathBuf>,
}

/// Capability that compiles an entry script plus its local imports into one
/// self-contained executable payload.
#[async_trait]
pub trait Bundler: Send + Sync {
    async fn bundle(&self, entry: &Path) -> Result<BundleOutput>;
}

/// Default bundler for already-bundled build outputs.
///
/// Upstream bundlers emit self-contained chunks, so this implementation
/// reads the entry as-is and minifies it; the entry is the only input file.
/// A real import-folding bundler plugs in through the same trait.
pub struct MinifyBundler;

#[async_trait]
impl Bundler for MinifyBundler {
    async fn bundle(&self, entry: &Path) -> Result<BundleOutput> {
        let source = tokio::fs::read_to_string(entry)
            .await
            .with_context(|| format!("failed to read script {}", entry.display()))?;

        let code = minify::minify_js(&source)
            .ok_or_else(|| anyhow!("script {} failed to parse", entry.display()))?;

        Ok(BundleOutput {
            code,
            input_files: vec![entry.to_path_buf()],
        })
    }
}
