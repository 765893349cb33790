//! The pack pipeline: discover -> inline -> delete -> compact.
//!
//! Pipeline phases:
//! - **Discover** - enumerate HTML documents under the output root
//! - **Inline** - fan documents out to the inlining engine, settle-all
//! - **Delete** - remove inlined asset files and adjacent source maps
//! - **Compact** - remove directories the deletion left empty
//!
//! The delete and compact steps are only assembled when enabled; they run
//! strictly after the inline step's settle-all barrier, so no asset is ever
//! deleted while an inlining read may still be pending.

mod cleanup;
mod discover;
mod rewrite;

pub use cleanup::{CompactStep, DeleteAssetsStep};
pub use discover::DiscoverStep;
pub use rewrite::RewriteStep;

use std::sync::Arc;

use anyhow::{Result, bail};

use crate::bundle::{BundleCache, MinifyBundler};
use crate::config::PackConfig;
use crate::step::{BuildContext, BuildStatus, Orchestrator, Step};
use crate::utils::plural_count;
use crate::{debug, log};

/// Run the whole pipeline for one build output directory.
pub async fn run(config: Arc<PackConfig>) -> Result<()> {
    let ctx = BuildContext {
        output_root: config.output_dir(),
        config: Arc::clone(&config),
    };

    log!("pack"; "packing {}", ctx.output_root.display());

    let bundles = Arc::new(BundleCache::new(Box::new(MinifyBundler)));

    let mut steps: Vec<Box<dyn Step>> = vec![
        Box::new(DiscoverStep),
        Box::new(RewriteStep::new(bundles)),
    ];
    if config.clean.delete_inlined {
        steps.push(Box::new(DeleteAssetsStep));
        if config.clean.remove_empty_dirs {
            steps.push(Box::new(CompactStep));
        }
    } else {
        debug!("pack"; "asset deletion disabled, skipping cleanup steps");
    }

    let mut orchestrator = Orchestrator::new(steps);
    let result = orchestrator.run(&ctx).await;

    for warning in &result.warnings {
        log!("warn"; "{warning}");
    }

    match result.status {
        BuildStatus::Success => {
            log!(
                "pack";
                "done: {} rewritten",
                plural_count(result.emitted_files.len(), "document")
            );
            Ok(())
        }
        BuildStatus::Error => {
            if let Some(error) = &result.error {
                log!("error"; "{error:#}");
            }
            bail!("pack failed")
        }
    }
}
