//! Synchronous execution of external tools with full output capture.

use std::{
    path::{Path, PathBuf},
    process::Command,
};

use crate::errors::{HarnessError, HarnessResult};

/// Exit code reported for a process that terminated without one (killed by a signal).
pub const NO_EXIT_CODE: i32 = -1;

/// Captured result of one process run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs `program` in `working_dir` with `args` and waits for it to exit.
///
/// A nonzero exit code is returned as data. Only a failure to launch the
/// process at all is an error.
pub fn run_with_output<I, S>(
    program: &Path,
    working_dir: &Path,
    args: I,
) -> HarnessResult<ProcessOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut command = Command::new(program);
    command.args(args).current_dir(working_dir);

    log::info!("Running command: {:?} (cwd: {})", command, working_dir.display());

    let output = command.output().map_err(|source| HarnessError::Launch {
        program: PathBuf::from(program),
        source,
    })?;

    let exit_code = output.status.code().unwrap_or(NO_EXIT_CODE);
    log::debug!("{} exited with {}", program.display(), exit_code);

    Ok(ProcessOutput {
        exit_code,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}
