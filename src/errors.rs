//! goldrun Error Handling
//!
//! Every failure that aborts a test case is a [`HarnessError`]. Tool outcomes that
//! are part of the behavior under test (a compiler rejecting its input, a checker
//! exiting nonzero) are *not* errors: they are written into the stage report as
//! `EXIT:` lines and compared like any other output.
//!
//! Errors carry `miette` diagnostic codes so the CLI can render them with help text.

use std::io;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

use crate::fixture::StageKind;

/// Convenience alias used across the crate.
pub type HarnessResult<T> = Result<T, HarnessError>;

// ============================================================================
// ERROR TYPE - Fatal harness failures
// ============================================================================

/// Fatal failures of the harness's own control logic.
#[derive(Debug, Error, Diagnostic)]
pub enum HarnessError {
    #[error("I/O error at '{}': {source}", path.display())]
    #[diagnostic(code(goldrun::io))]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to stage fixture '{}': {message}", fixture.display())]
    #[diagnostic(code(goldrun::staging))]
    Staging { fixture: PathBuf, message: String },

    #[error("Invalid configuration in '{}': {message}", path.display())]
    #[diagnostic(
        code(goldrun::config),
        help("stage configuration and harness configuration files are YAML mappings")
    )]
    Config { path: PathBuf, message: String },

    #[error("No .p source file found in '{}'", dir.display())]
    #[diagnostic(
        code(goldrun::fixture::no_sources),
        help("a fixture needs at least one source file at its root")
    )]
    NoSourceFiles { dir: PathBuf },

    #[error("Could not find model checker input in '{}'", dir.display())]
    #[diagnostic(
        code(goldrun::fixture::no_checker_input),
        help("the compile stage must produce a .dll artifact before the model checker runs")
    )]
    NoCheckerInput { dir: PathBuf },

    #[error("Failed to launch '{}': {source}", program.display())]
    #[diagnostic(code(goldrun::process::launch))]
    Launch {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Tool '{tool}' not found: {message}")]
    #[diagnostic(
        code(goldrun::process::tool_not_found),
        help("set the tool path in the harness configuration or put it on PATH")
    )]
    ToolNotFound { tool: String, message: String },

    #[error("Failed to build {}\nOutput:\n{stdout}\n\nErrors:\n{stderr}\n", project.display())]
    #[diagnostic(code(goldrun::stage::build))]
    BuildFailed {
        project: PathBuf,
        stdout: String,
        stderr: String,
    },

    #[error("Include file '{}' not found", path.display())]
    #[diagnostic(
        code(goldrun::stage::missing_include),
        help("only includes ending in a trace suffix may be absent")
    )]
    MissingInclude {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Fixture '{}' failed stages: {}", fixture.display(), format_stages(stages))]
    #[diagnostic(
        code(goldrun::golden::mismatch),
        help("inspect check-output.log in the failing stage directories of the working copy")
    )]
    Mismatch {
        fixture: PathBuf,
        stages: Vec<StageKind>,
    },
}

fn format_stages(stages: &[StageKind]) -> String {
    stages
        .iter()
        .map(|s| s.dir_name())
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// CONTEXT HELPERS - Attach paths to std::io errors
// ============================================================================

/// Attaches the offending path to an `io::Result`.
pub trait IoContext<T> {
    fn at(self, path: impl AsRef<Path>) -> HarnessResult<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn at(self, path: impl AsRef<Path>) -> HarnessResult<T> {
        self.map_err(|source| HarnessError::Io {
            path: path.as_ref().to_path_buf(),
            source,
        })
    }
}

/// Prints a HarnessError with full miette diagnostics.
pub fn print_error(error: HarnessError) {
    let report = miette::Report::new(error);
    eprintln!("{report:?}");
}
