//! Removal of directories left empty after asset deletion.

use std::io::ErrorKind;
use std::path::Path;

/// Recursively delete every directory under `root` (root included) that is
/// empty once its children have been compacted.
///
/// Directories are collected breadth-first and visited deepest-first, so a
/// parent is re-read only after all of its descendants were handled.
/// Best-effort: failures become warnings and the walk continues with
/// siblings and ancestors. A missing root is a no-op.
pub async fn remove_empty_dirs(root: &Path) -> Vec<String> {
    let mut warnings = Vec::new();

    match tokio::fs::metadata(root).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => return warnings,
        Err(e) if e.kind() == ErrorKind::NotFound => return warnings,
        Err(e) => {
            warnings.push(format!(
                "could not stat directory {} for cleanup: {e}",
                root.display()
            ));
            return warnings;
        }
    }

    // Phase 1: collect the directory tree
    let mut dirs = vec![root.to_path_buf()];
    let mut cursor = 0;
    while cursor < dirs.len() {
        let dir = dirs[cursor].clone();
        cursor += 1;

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => {
                warnings.push(format!(
                    "could not read directory {} for cleanup: {e}",
                    dir.display()
                ));
                continue;
            }
        };

        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => match entry.file_type().await {
                    Ok(file_type) if file_type.is_dir() => dirs.push(entry.path()),
                    Ok(_) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => warnings.push(format!(
                        "could not stat entry {} during cleanup: {e}",
                        entry.path().display()
                    )),
                },
                Ok(None) => break,
                Err(e) => {
                    warnings.push(format!(
                        "could not read directory {} for cleanup: {e}",
                        dir.display()
                    ));
                    break;
                }
            }
        }
    }

    // Phase 2: deepest-first, delete what is now empty
    for dir in dirs.iter().rev() {
        match dir_is_empty(dir).await {
            Ok(Some(true)) => {
                if let Err(e) = tokio::fs::remove_dir(dir).await
                    && e.kind() != ErrorKind::NotFound
                {
                    warnings.push(format!(
                        "could not delete empty directory {}: {e}",
                        dir.display()
                    ));
                }
            }
            Ok(_) => {}
            Err(e) => warnings.push(format!(
                "could not read directory {} for cleanup: {e}",
                dir.display()
            )),
        }
    }

    warnings
}

/// `Ok(None)` when the directory no longer exists.
async fn dir_is_empty(dir: &Path) -> std::io::Result<Option<bool>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };
    Ok(Some(entries.next_entry().await?.is_none()))
}
