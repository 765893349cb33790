//! Build-step framework: sequential steps over one context, with
//! aggregated results and fail-fast semantics.
//!
//! Steps do not stash values in shared mutable state. Each step returns a
//! tagged [`StepOutput`] which the orchestrator records into a typed
//! [`StepOutputs`] accumulator; later steps read only the fields documented
//! as their inputs. [`BuildContext`] carries the fixed inputs of one run.

mod orchestrator;
#[cfg(test)]
mod tests;

pub use orchestrator::Orchestrator;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use rustc_hash::FxHashSet;

use crate::config::PackConfig;

// ============================================================================
// Build results
// ============================================================================

/// Outcome status of a step or of the whole pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuildStatus {
    #[default]
    Success,
    Error,
}

/// Outcome of a build step or of an entire pipeline run.
#[derive(Debug, Default)]
pub struct BuildResult {
    pub status: BuildStatus,
    /// Absolute paths produced or rewritten, in step order.
    pub emitted_files: Vec<PathBuf>,
    /// Non-fatal messages accumulated while running.
    pub warnings: Vec<String>,
    /// First fatal cause. Set exactly when `status` is `Error`.
    pub error: Option<anyhow::Error>,
}

impl BuildResult {
    /// A successful, empty result.
    pub fn success() -> Self {
        Self::default()
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn is_success(&self) -> bool {
        self.status == BuildStatus::Success
    }
}

// ============================================================================
// Step inputs and outputs
// ============================================================================

/// Fixed inputs shared by every step of one pipeline run.
///
/// Created once per invocation and discarded afterwards; steps never
/// mutate it.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Root of the upstream build output; documents and assets live below it.
    pub output_root: PathBuf,
    pub config: Arc<PackConfig>,
}

/// Value a step hands to the steps after it.
#[derive(Debug, Default)]
pub enum StepOutput {
    #[default]
    None,
    /// Documents discovered under the output root.
    Documents(Vec<PathBuf>),
    /// Union of asset paths embedded across all rewritten documents.
    InlinedAssets(FxHashSet<PathBuf>),
}

/// Typed accumulator of prior step outputs.
///
/// Each field is written by exactly one step per run.
#[derive(Debug, Default)]
pub struct StepOutputs {
    pub documents: Option<Vec<PathBuf>>,
    pub inlined_assets: Option<FxHashSet<PathBuf>>,
}

impl StepOutputs {
    pub(crate) fn record(&mut self, output: StepOutput) {
        match output {
            StepOutput::None => {}
            StepOutput::Documents(documents) => {
                debug_assert!(self.documents.is_none(), "documents recorded twice");
                self.documents = Some(documents);
            }
            StepOutput::InlinedAssets(assets) => {
                debug_assert!(self.inlined_assets.is_none(), "inlined assets recorded twice");
                self.inlined_assets = Some(assets);
            }
        }
    }
}

/// Result and output of one completed step.
#[derive(Debug)]
pub struct StepOutcome {
    pub result: BuildResult,
    pub output: StepOutput,
}

impl StepOutcome {
    pub fn new(result: BuildResult) -> Self {
        Self {
            result,
            output: StepOutput::None,
        }
    }

    pub fn with_output(result: BuildResult, output: StepOutput) -> Self {
        Self { result, output }
    }
}

/// A unit of work in the pack pipeline.
#[async_trait]
pub trait Step: Send + Sync {
    /// Step name used in logs and synthesized errors.
    fn name(&self) -> &'static str;

    /// Execute against the run context and the outputs of prior steps.
    ///
    /// Returning `Err` or a result with `status == Error` aborts the
    /// remaining steps.
    async fn run(&self, ctx: &BuildContext, prior: &StepOutputs) -> Result<StepOutcome>;
}
