//! Golden-file comparison.
//!
//! The actual output is always written next to the golden reference in the
//! working copy, whatever the outcome, so mismatches can be diffed afterwards.

use std::{
    fs,
    path::{Path, PathBuf},
};

use difference::{Changeset, Difference};

use crate::errors::{HarnessResult, IoContext};
use crate::report::normalize_newlines;

/// Golden reference file inside a stage directory.
pub const CORRECT_OUTPUT_FILE_NAME: &str = "acc_0.txt";
/// Actual output artifact inside a stage directory of the working copy.
pub const ACTUAL_OUTPUT_FILE_NAME: &str = "check-output.log";

/// Outcome of comparing one stage report to its golden reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub expected: String,
    pub actual: String,
    /// Where the actual output was written.
    pub artifact: PathBuf,
    /// The golden reference was overwritten instead of asserted.
    pub frozen: bool,
}

impl Comparison {
    pub fn is_match(&self) -> bool {
        self.frozen || self.expected == self.actual
    }

    /// Line diff from expected to actual.
    pub fn diff(&self) -> Vec<Difference> {
        Changeset::new(&self.expected, &self.actual, "\n").diffs
    }
}

/// Compares `actual` against the golden reference in `stage_dir`.
///
/// With `freeze_into` set, the normalized actual output replaces the golden
/// reference at that path (the original fixture) and the stage counts as passed.
pub fn compare(
    stage_dir: &Path,
    actual: &str,
    freeze_into: Option<&Path>,
) -> HarnessResult<Comparison> {
    let actual = normalize_newlines(actual);

    let artifact = stage_dir.join(ACTUAL_OUTPUT_FILE_NAME);
    fs::write(&artifact, &actual).at(&artifact)?;

    if let Some(golden) = freeze_into {
        log::info!("Freezing {}", golden.display());
        fs::write(golden, &actual).at(golden)?;
        return Ok(Comparison {
            expected: actual.clone(),
            actual,
            artifact,
            frozen: true,
        });
    }

    let golden = stage_dir.join(CORRECT_OUTPUT_FILE_NAME);
    let expected = normalize_newlines(&fs::read_to_string(&golden).at(&golden)?);

    Ok(Comparison {
        expected,
        actual,
        artifact,
        frozen: false,
    })
}
