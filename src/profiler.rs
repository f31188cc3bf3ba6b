//! Scoped timing of stage phases.
//!
//! `Profiler::start` hands out a guard; the entry is recorded when the guard
//! drops, so a phase that returns early or fails is still measured.

use std::{
    fs,
    path::Path,
    sync::{Arc, Mutex},
    time::Instant,
};

use serde::Serialize;

use crate::errors::{HarnessError, HarnessResult, IoContext};

/// One measured phase.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileEntry {
    pub operation: String,
    pub target: String,
    pub elapsed_ms: u128,
}

/// Collects phase timings for a whole run. Cheap to clone; clones share entries.
#[derive(Debug, Clone, Default)]
pub struct Profiler {
    entries: Arc<Mutex<Vec<ProfileEntry>>>,
}

impl Profiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts timing `operation` on `target`.
    pub fn start(&self, operation: &str, target: impl AsRef<Path>) -> ProfileScope {
        ProfileScope {
            profiler: self.clone(),
            operation: operation.to_string(),
            target: target.as_ref().display().to_string(),
            started: Instant::now(),
        }
    }

    pub fn entries(&self) -> Vec<ProfileEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Writes all entries to `path` as YAML.
    pub fn save(&self, path: &Path) -> HarnessResult<()> {
        let text = serde_yaml::to_string(&self.entries()).map_err(|e| HarnessError::Config {
            path: path.to_path_buf(),
            message: format!("Failed to serialize profile: {}", e),
        })?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).at(parent)?;
        }
        fs::write(path, text).at(path)
    }

    fn record(&self, entry: ProfileEntry) {
        let mut entries = match self.entries.lock() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.push(entry);
    }
}

/// Guard returned by [`Profiler::start`].
pub struct ProfileScope {
    profiler: Profiler,
    operation: String,
    target: String,
    started: Instant,
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_millis();
        log::debug!("{} [{}]: {} ms", self.operation, self.target, elapsed_ms);
        self.profiler.record(ProfileEntry {
            operation: std::mem::take(&mut self.operation),
            target: std::mem::take(&mut self.target),
            elapsed_ms,
        });
    }
}
