//! Document discovery under the build output root.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::debug;

/// Recursively collect all `.html` documents below `root`.
///
/// A missing root is not an error: an upstream step may legitimately have
/// produced no markup output. A subdirectory vanishing mid-walk is skipped.
/// Any other read failure propagates. The order of the returned paths is
/// unspecified.
pub async fn find_html_files(root: &Path) -> Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    let mut at_root = true;

    while let Some(dir) = pending.pop() {
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if at_root {
                    debug!("scan"; "output root {} does not exist", dir.display());
                    return Ok(found);
                }
                // Removed while walking; nothing to collect there
                debug!("scan"; "directory {} vanished during scan", dir.display());
                continue;
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read directory {}", dir.display()));
            }
        };
        at_root = false;

        loop {
            let entry = entries
                .next_entry()
                .await
                .with_context(|| format!("failed to read directory {}", dir.display()))?;
            let Some(entry) = entry else { break };

            let path = entry.path();
            let file_type = entry
                .file_type()
                .await
                .with_context(|| format!("failed to stat {}", path.display()))?;

            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some("html")
            {
                found.push(path);
            }
        }
    }

    Ok(found)
}
