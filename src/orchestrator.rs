//! Test-case orchestration: stage the fixture once, then run and compare every
//! configured stage in order.
//!
//! A mismatch in one stage is recorded and the remaining stages still run.
//! Fatal harness errors (missing sources, unlaunchable tools, failed harness
//! builds) propagate and end the test case.

use std::path::{Path, PathBuf};

use crate::compiler::Compiler;
use crate::config::HarnessConfig;
use crate::errors::{HarnessError, HarnessResult};
use crate::fixture::{FixtureDescriptor, StageKind};
use crate::golden::{self, Comparison, CORRECT_OUTPUT_FILE_NAME};
use crate::profiler::Profiler;
use crate::report::OutputReport;
use crate::stages::run_stage;
use crate::staging::{delete_files, stage_fixture, WorkingDirectory};

// ============================================================================
// HARNESS CONTEXT - Collaborators shared by every test case of a run
// ============================================================================

/// Everything a run needs, constructed once at suite start and passed
/// explicitly to each test case.
pub struct HarnessContext {
    pub config: HarnessConfig,
    pub compiler: Box<dyn Compiler>,
    pub profiler: Profiler,
}

impl HarnessContext {
    pub fn new(config: HarnessConfig, compiler: Box<dyn Compiler>) -> Self {
        Self {
            config,
            compiler,
            profiler: Profiler::new(),
        }
    }
}

// ============================================================================
// OUTCOMES
// ============================================================================

#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub kind: StageKind,
    pub description: String,
    pub comparison: Comparison,
}

impl StageOutcome {
    pub fn passed(&self) -> bool {
        self.comparison.is_match()
    }
}

/// Per-stage results of one test case. Every configured stage appears.
#[derive(Debug, Clone)]
pub struct CaseOutcome {
    pub fixture: PathBuf,
    pub working_dir: WorkingDirectory,
    pub stages: Vec<StageOutcome>,
}

impl CaseOutcome {
    pub fn passed(&self) -> bool {
        self.stages.iter().all(StageOutcome::passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &StageOutcome> {
        self.stages.iter().filter(|s| !s.passed())
    }

    /// Turns any stage mismatch into an error naming the failing stages.
    pub fn assert_passed(&self) -> HarnessResult<()> {
        let stages: Vec<StageKind> = self.failures().map(|s| s.kind).collect();
        if stages.is_empty() {
            return Ok(());
        }
        Err(HarnessError::Mismatch {
            fixture: self.fixture.clone(),
            stages,
        })
    }
}

// ============================================================================
// ORCHESTRATION
// ============================================================================

/// Runs every configured stage of `fixture` against a fresh working copy.
pub fn run_test_case(
    ctx: &mut HarnessContext,
    fixture: &FixtureDescriptor,
) -> HarnessResult<CaseOutcome> {
    let work = stage_fixture(
        &fixture.dir,
        &ctx.config.suite_root,
        &ctx.config.results_root(),
    )?;

    let mut stages = Vec::with_capacity(fixture.stages.len());
    for (&kind, config) in &fixture.stages {
        log::info!("*** {}", config.description);

        let stage_dir = work.stage_dir(kind);
        delete_files(&stage_dir, &config.deletes)?;

        let mut report = OutputReport::with_header();
        run_stage(kind, ctx, config, &mut report, &work, &stage_dir)?;

        let freeze_into = ctx
            .config
            .freeze
            .then(|| golden_path(&fixture.dir, kind));
        let comparison = golden::compare(&stage_dir, report.as_str(), freeze_into.as_deref())?;

        if comparison.is_match() {
            log::debug!("{}", comparison.actual);
        } else {
            log::info!(
                "{} stage of {} differs from {}",
                kind,
                fixture.dir.display(),
                CORRECT_OUTPUT_FILE_NAME
            );
        }

        stages.push(StageOutcome {
            kind,
            description: config.description.clone(),
            comparison,
        });
    }

    Ok(CaseOutcome {
        fixture: fixture.dir.clone(),
        working_dir: work,
        stages,
    })
}

/// Golden reference of `kind` in the original (unstaged) fixture.
pub fn golden_path(fixture_dir: &Path, kind: StageKind) -> PathBuf {
    fixture_dir
        .join(kind.dir_name())
        .join(CORRECT_OUTPUT_FILE_NAME)
}
