//! Rewrite step: fan documents out to the inlining engine.

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rustc_hash::FxHashSet;
use tokio::task::JoinSet;

use crate::bundle::BundleCache;
use crate::inline::{InlineOutput, Inliner};
use crate::logger::ProgressLine;
use crate::step::{
    BuildContext, BuildResult, BuildStatus, Step, StepOutcome, StepOutput, StepOutputs,
};
use crate::utils::plural_count;
use crate::{debug, log};

pub struct RewriteStep {
    bundles: Arc<BundleCache>,
}

impl RewriteStep {
    pub fn new(bundles: Arc<BundleCache>) -> Self {
        Self { bundles }
    }
}

#[async_trait]
impl Step for RewriteStep {
    fn name(&self) -> &'static str {
        "inline"
    }

    async fn run(&self, ctx: &BuildContext, prior: &StepOutputs) -> Result<StepOutcome> {
        let documents = prior
            .documents
            .as_ref()
            .context("discovery output missing")?;

        let mut result = BuildResult::success();
        let mut inlined = FxHashSet::default();
        if documents.is_empty() {
            return Ok(StepOutcome::with_output(
                result,
                StepOutput::InlinedAssets(inlined),
            ));
        }

        log!(
            "pack";
            "inlining assets in {}",
            plural_count(documents.len(), "document")
        );
        let progress = ProgressLine::new(&[("html", documents.len())]);

        let inliner = Arc::new(Inliner::new(
            Arc::clone(&self.bundles),
            ctx.config.inline.clone(),
        ));

        let mut tasks = JoinSet::new();
        for document in documents.iter().cloned() {
            let inliner = Arc::clone(&inliner);
            let root = ctx.output_root.clone();
            tasks.spawn(async move {
                let outcome = rewrite_document(&inliner, &document, &root).await;
                (document, outcome)
            });
        }

        // Settle-all barrier: every document task finishes (and its asset
        // reads complete) before the cleanup steps may touch a file. A fatal
        // failure in one document is held until the barrier so that sibling
        // documents still run to completion.
        let mut fatal: Option<anyhow::Error> = None;
        while let Some(joined) = tasks.join_next().await {
            let Ok((document, outcome)) = joined else {
                continue;
            };
            match outcome {
                Ok(Some(output)) => {
                    progress.inc("html");
                    result.emitted_files.push(document);
                    result.warnings.extend(output.warnings);
                    inlined.extend(output.inlined_files);
                }
                Ok(None) => {
                    // Removed by a concurrent process; expected race
                    progress.inc("html");
                    debug!("pack"; "document {} vanished before rewrite", document.display());
                }
                Err(error) => {
                    if fatal.is_none() {
                        fatal = Some(error);
                    }
                }
            }
        }
        progress.finish();

        if let Some(error) = fatal {
            result.status = BuildStatus::Error;
            result.error = Some(error);
        }

        Ok(StepOutcome::with_output(
            result,
            StepOutput::InlinedAssets(inlined),
        ))
    }
}

/// Rewrite one document in place.
///
/// `Ok(None)` means the document no longer exists. Read failures of other
/// kinds, and write failures, are fatal to the step.
async fn rewrite_document(
    inliner: &Inliner,
    document: &Path,
    root: &Path,
) -> Result<Option<InlineOutput>> {
    let html = match tokio::fs::read_to_string(document).await {
        Ok(html) => html,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read document {}", document.display()));
        }
    };

    let output = inliner.inline_document(&html, root).await;

    tokio::fs::write(document, &output.html)
        .await
        .with_context(|| format!("failed to write rewritten document {}", document.display()))?;

    Ok(Some(output))
}
