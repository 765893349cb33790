use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use super::*;
use crate::config::PackConfig;

fn make_ctx() -> BuildContext {
    BuildContext {
        output_root: PathBuf::from("/tmp/out"),
        config: Arc::new(PackConfig::default()),
    }
}

/// Step that succeeds with fixed files and warnings.
struct OkStep {
    name: &'static str,
    files: Vec<&'static str>,
    warnings: Vec<&'static str>,
    ran: Arc<AtomicBool>,
}

impl OkStep {
    fn new(name: &'static str, files: Vec<&'static str>, warnings: Vec<&'static str>) -> Self {
        Self {
            name,
            files,
            warnings,
            ran: Arc::new(AtomicBool::new(false)),
        }
    }
}

#[async_trait]
impl Step for OkStep {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&self, _ctx: &BuildContext, _prior: &StepOutputs) -> Result<StepOutcome> {
        self.ran.store(true, Ordering::SeqCst);
        let mut result = BuildResult::success();
        result.emitted_files = self.files.iter().map(PathBuf::from).collect();
        result.warnings = self.warnings.iter().map(|w| (*w).to_string()).collect();
        Ok(StepOutcome::new(result))
    }
}

/// Step that fails, either via Err or via an error-status result.
struct FailStep {
    name: &'static str,
    with_cause: bool,
}

#[async_trait]
impl Step for FailStep {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn run(&self, _ctx: &BuildContext, _prior: &StepOutputs) -> Result<StepOutcome> {
        if self.with_cause {
            Err(anyhow!("disk on fire"))
        } else {
            // Error status without a cause: the orchestrator synthesizes one
            let result = BuildResult {
                status: BuildStatus::Error,
                ..BuildResult::default()
            };
            Ok(StepOutcome::new(result))
        }
    }
}

/// Step that records a typed output for later steps.
struct EmitDocsStep(Vec<&'static str>);

#[async_trait]
impl Step for EmitDocsStep {
    fn name(&self) -> &'static str {
        "emit-docs"
    }

    async fn run(&self, _ctx: &BuildContext, _prior: &StepOutputs) -> Result<StepOutcome> {
        let docs = self.0.iter().map(PathBuf::from).collect();
        Ok(StepOutcome::with_output(
            BuildResult::success(),
            StepOutput::Documents(docs),
        ))
    }
}

/// Step that asserts it sees the documents recorded by a prior step.
struct ReadDocsStep;

#[async_trait]
impl Step for ReadDocsStep {
    fn name(&self) -> &'static str {
        "read-docs"
    }

    async fn run(&self, _ctx: &BuildContext, prior: &StepOutputs) -> Result<StepOutcome> {
        let docs = prior
            .documents
            .as_ref()
            .ok_or_else(|| anyhow!("documents missing"))?;
        assert_eq!(docs.len(), 2);
        Ok(StepOutcome::new(BuildResult::success()))
    }
}

#[tokio::test]
async fn test_success_aggregation_in_step_order() {
    let steps: Vec<Box<dyn Step>> = vec![
        Box::new(OkStep::new("one", vec!["/a.html"], vec!["w1"])),
        Box::new(OkStep::new("two", vec!["/b.html", "/c.html"], vec![])),
        Box::new(OkStep::new("three", vec![], vec!["w2"])),
    ];
    let mut orchestrator = Orchestrator::new(steps);
    let result = orchestrator.run(&make_ctx()).await;

    assert!(result.is_success());
    assert!(result.error.is_none());
    assert_eq!(
        result.emitted_files,
        vec![
            PathBuf::from("/a.html"),
            PathBuf::from("/b.html"),
            PathBuf::from("/c.html")
        ]
    );
    assert_eq!(result.warnings, vec!["w1", "w2"]);
}

#[tokio::test]
async fn test_fail_fast_skips_remaining_steps() {
    let third = OkStep::new("three", vec!["/never.html"], vec!["never"]);
    let third_ran = Arc::clone(&third.ran);

    let steps: Vec<Box<dyn Step>> = vec![
        Box::new(OkStep::new("one", vec!["/a.html"], vec!["w1"])),
        Box::new(FailStep {
            name: "two",
            with_cause: true,
        }),
        Box::new(third),
    ];
    let mut orchestrator = Orchestrator::new(steps);
    let result = orchestrator.run(&make_ctx()).await;

    assert_eq!(result.status, BuildStatus::Error);
    // Only step one's files and warnings aggregate
    assert_eq!(result.emitted_files, vec![PathBuf::from("/a.html")]);
    assert_eq!(result.warnings, vec!["w1"]);
    let error = result.error.as_ref().unwrap();
    assert!(format!("{error:#}").contains("disk on fire"));
    // Step three never executed
    assert!(!third_ran.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_error_status_without_cause_is_synthesized() {
    let steps: Vec<Box<dyn Step>> = vec![Box::new(FailStep {
        name: "broken",
        with_cause: false,
    })];
    let mut orchestrator = Orchestrator::new(steps);
    let result = orchestrator.run(&make_ctx()).await;

    assert_eq!(result.status, BuildStatus::Error);
    let error = result.error.as_ref().unwrap();
    assert!(error.to_string().contains("broken"));
}

#[tokio::test]
async fn test_outputs_thread_between_steps() {
    let steps: Vec<Box<dyn Step>> = vec![
        Box::new(EmitDocsStep(vec!["/a.html", "/b.html"])),
        Box::new(ReadDocsStep),
    ];
    let mut orchestrator = Orchestrator::new(steps);
    let result = orchestrator.run(&make_ctx()).await;
    assert!(result.is_success());
}

#[tokio::test]
async fn test_terminal_state_is_final() {
    let first = OkStep::new("one", vec!["/a.html"], vec![]);
    let ran = Arc::clone(&first.ran);

    let mut orchestrator = Orchestrator::new(vec![Box::new(first) as Box<dyn Step>]);
    assert!(orchestrator.last_result().is_none());

    orchestrator.run(&make_ctx()).await;
    assert!(orchestrator.last_result().is_some());

    ran.store(false, Ordering::SeqCst);
    let result = orchestrator.run(&make_ctx()).await;
    // Second run does not re-execute the step
    assert!(!ran.load(Ordering::SeqCst));
    assert_eq!(result.emitted_files, vec![PathBuf::from("/a.html")]);
}
