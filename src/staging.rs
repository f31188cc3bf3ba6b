//! Staging fixtures into isolated, disposable working directories.
//!
//! Every run starts from a fresh copy: a stale copy at the destination is
//! removed before the fixture tree is copied. Nothing is retried; a partial
//! copy is never treated as a valid working directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use crate::errors::{HarnessError, HarnessResult, IoContext};
use crate::fixture::StageKind;

/// An isolated copy of one fixture, owned by one test-case run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingDirectory {
    root: PathBuf,
}

impl WorkingDirectory {
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// The directory of one stage inside the working copy.
    pub fn stage_dir(&self, kind: StageKind) -> PathBuf {
        self.root.join(kind.dir_name())
    }
}

/// Copies `fixture` to `results_root` joined with its path relative to `suite_root`.
pub fn stage_fixture(
    fixture: &Path,
    suite_root: &Path,
    results_root: &Path,
) -> HarnessResult<WorkingDirectory> {
    let relative = fixture
        .strip_prefix(suite_root)
        .map_err(|_| HarnessError::Staging {
            fixture: fixture.to_path_buf(),
            message: format!("fixture is not under suite root '{}'", suite_root.display()),
        })?;
    let destination = results_root.join(relative);

    if destination.starts_with(fixture) {
        return Err(HarnessError::Staging {
            fixture: fixture.to_path_buf(),
            message: format!(
                "results directory '{}' lies inside the fixture",
                destination.display()
            ),
        });
    }

    if destination.exists() {
        log::debug!("Removing stale working copy {}", destination.display());
        fs::remove_dir_all(&destination).at(&destination)?;
    }

    copy_tree(fixture, &destination)?;
    log::debug!("Staged {} -> {}", fixture.display(), destination.display());

    Ok(WorkingDirectory { root: destination })
}

/// Recursively copies the directory `from` to `to`, creating `to`.
/// Existing files at the destination are overwritten.
pub fn copy_tree(from: &Path, to: &Path) -> HarnessResult<()> {
    fs::create_dir_all(to).at(to)?;
    for entry in WalkDir::new(from).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| HarnessError::Staging {
            fixture: from.to_path_buf(),
            message: format!("Failed to walk directory: {}", e),
        })?;

        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|_| HarnessError::Staging {
                fixture: from.to_path_buf(),
                message: format!("unexpected path '{}'", entry.path().display()),
            })?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).at(&target)?;
        } else {
            fs::copy(entry.path(), &target).at(entry.path())?;
        }
    }
    Ok(())
}

/// Deletes the named files from `dir`. Files that do not exist are skipped.
pub fn delete_files(dir: &Path, names: &[String]) -> HarnessResult<()> {
    for name in names {
        let path = dir.join(name);
        if path.is_file() {
            log::debug!("Deleting {}", path.display());
            fs::remove_file(&path).at(&path)?;
        }
    }
    Ok(())
}
