//! goldrun: a golden-file regression harness for multi-stage compiler toolchains.
//!
//! A fixture is staged into a fresh working copy, each configured stage runs
//! against it in a fixed order, and every stage's normalized output is compared
//! byte for byte with its golden reference.

pub use crate::errors::{HarnessError, HarnessResult};
pub use crate::fixture::{FixtureDescriptor, StageConfig, StageKind};
pub use crate::orchestrator::{run_test_case, CaseOutcome, HarnessContext, StageOutcome};

pub mod cli;
pub mod compiler;
pub mod config;
pub mod errors;
pub mod fixture;
pub mod golden;
pub mod orchestrator;
pub mod process;
pub mod profiler;
pub mod report;
pub mod stages;
pub mod staging;
