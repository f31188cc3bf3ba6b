//! Stage runners.
//!
//! The set of stages is closed, so dispatch is a single exhaustive `match` over
//! [`StageKind`]. Every runner receives the stage configuration, the report to
//! fill (already carrying the header), the shared working directory, and the
//! stage's own subdirectory.

use std::path::Path;

use crate::errors::HarnessResult;
use crate::fixture::{StageConfig, StageKind};
use crate::orchestrator::HarnessContext;
use crate::report::OutputReport;
use crate::staging::WorkingDirectory;

pub mod compile;
pub mod model_checker;
pub mod runtime_harness;

/// Runs one stage, appending its output to `report`.
pub fn run_stage(
    kind: StageKind,
    ctx: &mut HarnessContext,
    config: &StageConfig,
    report: &mut OutputReport,
    work: &WorkingDirectory,
    stage_dir: &Path,
) -> HarnessResult<()> {
    match kind {
        StageKind::Compile => compile::run(ctx, config, report, work, stage_dir),
        // Not checked yet; the golden reference is the bare header.
        StageKind::ProtocolStub => Ok(()),
        StageKind::RuntimeHarness => runtime_harness::run(ctx, config, report, work, stage_dir),
        StageKind::ModelChecker => model_checker::run(ctx, config, report, work, stage_dir),
    }
}
