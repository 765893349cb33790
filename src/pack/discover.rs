//! Discovery step: list the documents to rewrite.

use anyhow::Result;
use async_trait::async_trait;

use crate::debug;
use crate::scan;
use crate::step::{BuildContext, BuildResult, Step, StepOutcome, StepOutput, StepOutputs};
use crate::utils::plural_count;

pub struct DiscoverStep;

#[async_trait]
impl Step for DiscoverStep {
    fn name(&self) -> &'static str {
        "discover"
    }

    async fn run(&self, ctx: &BuildContext, _prior: &StepOutputs) -> Result<StepOutcome> {
        let documents = scan::find_html_files(&ctx.output_root).await?;
        debug!(
            "scan";
            "{} under {}",
            plural_count(documents.len(), "document"),
            ctx.output_root.display()
        );

        let mut result = BuildResult::success();
        if documents.is_empty() {
            result.push_warning(format!(
                "no HTML documents found in {}; skipping asset inlining",
                ctx.output_root.display()
            ));
        }

        Ok(StepOutcome::with_output(
            result,
            StepOutput::Documents(documents),
        ))
    }
}
