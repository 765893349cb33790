//! Cleanup steps: delete inlined assets and compact emptied directories.

use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::task::JoinSet;

use crate::compact;
use crate::step::{BuildContext, BuildResult, Step, StepOutcome, StepOutputs};
use crate::utils::plural_count;
use crate::{debug, log};

// ============================================================================
// Asset deletion
// ============================================================================

/// Deletes every successfully inlined asset file, plus the adjacent `.map`
/// file of `.js`/`.css` assets. Best-effort: failures become warnings; a
/// file already gone is silent (a concurrent process beat us to it).
pub struct DeleteAssetsStep;

#[async_trait]
impl Step for DeleteAssetsStep {
    fn name(&self) -> &'static str {
        "delete"
    }

    async fn run(&self, _ctx: &BuildContext, prior: &StepOutputs) -> Result<StepOutcome> {
        let inlined = prior
            .inlined_assets
            .as_ref()
            .context("inlined asset set missing")?;

        let mut result = BuildResult::success();
        if inlined.is_empty() {
            debug!("clean"; "no inlined assets to delete");
            return Ok(StepOutcome::new(result));
        }

        log!("clean"; "deleting {}", plural_count(inlined.len(), "inlined asset"));

        let mut targets: Vec<PathBuf> = inlined.iter().cloned().collect();
        targets.sort();

        let mut tasks = JoinSet::new();
        for path in targets {
            tasks.spawn(delete_asset(path));
        }

        let mut warnings = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            if let Ok(mut asset_warnings) = joined {
                warnings.append(&mut asset_warnings);
            }
        }
        warnings.sort();
        result.warnings = warnings;

        Ok(StepOutcome::new(result))
    }
}

/// Remove one asset file plus its adjacent source map.
async fn delete_asset(path: PathBuf) -> Vec<String> {
    let mut warnings = Vec::new();

    if let Err(e) = tokio::fs::remove_file(&path).await
        && e.kind() != ErrorKind::NotFound
    {
        warnings.push(format!(
            "could not delete inlined file {}: {e}",
            path.display()
        ));
    }

    let ext = path.extension().and_then(|e| e.to_str());
    if matches!(ext, Some("js") | Some("css")) {
        let mut map_path = path.into_os_string();
        map_path.push(".map");
        let map_path = PathBuf::from(map_path);
        if let Err(e) = tokio::fs::remove_file(&map_path).await
            && e.kind() != ErrorKind::NotFound
        {
            warnings.push(format!(
                "could not delete source map file {}: {e}",
                map_path.display()
            ));
        }
    }

    warnings
}

// ============================================================================
// Directory compaction
// ============================================================================

/// Removes directories left empty by asset deletion, the output root
/// included if everything below it is gone.
pub struct CompactStep;

#[async_trait]
impl Step for CompactStep {
    fn name(&self) -> &'static str {
        "compact"
    }

    async fn run(&self, ctx: &BuildContext, _prior: &StepOutputs) -> Result<StepOutcome> {
        debug!("clean"; "compacting empty directories under {}", ctx.output_root.display());

        let mut result = BuildResult::success();
        result.warnings = compact::remove_empty_dirs(&ctx.output_root).await;
        Ok(StepOutcome::new(result))
    }
}
