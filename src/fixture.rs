//! Fixture data model: stage kinds, per-stage configuration, and fixture loading.
//!
//! A fixture is a directory with one or more `.p` sources at its root and one
//! subdirectory per stage kind. Each stage directory holds a `testconfig.yaml`
//! describing how the stage is run and an `acc_0.txt` golden reference.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use walkdir::WalkDir;

use crate::errors::{HarnessError, HarnessResult, IoContext};

/// File name of a stage's configuration inside its stage directory.
pub const STAGE_CONFIG_FILE_NAME: &str = "testconfig.yaml";

// ============================================================================
// STAGE KIND - Closed, ordered set of pipeline stages
// ============================================================================

/// The pipeline stages a fixture can configure.
///
/// The derived ordering is the execution order, and doubles as the dependency
/// order: `Compile` writes the artifacts every later stage reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StageKind {
    /// Compile, link, and re-compile for the model checker.
    Compile,
    /// Placeholder stage that only emits the report header.
    ProtocolStub,
    /// Build and run the native runtime test harness.
    RuntimeHarness,
    /// Run the model checker on the compiled artifact.
    ModelChecker,
}

impl StageKind {
    /// All stage kinds in execution order.
    pub const ALL: [StageKind; 4] = [
        StageKind::Compile,
        StageKind::ProtocolStub,
        StageKind::RuntimeHarness,
        StageKind::ModelChecker,
    ];

    /// Name of the stage's subdirectory inside a fixture.
    pub fn dir_name(&self) -> &'static str {
        match self {
            StageKind::Compile => "Pc",
            StageKind::ProtocolStub => "Pt",
            StageKind::RuntimeHarness => "Prt",
            StageKind::ModelChecker => "Zing",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

// ============================================================================
// STAGE CONFIG
// ============================================================================

/// How one stage of one fixture is run. Immutable once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageConfig {
    /// Human-readable description, logged when the stage starts.
    pub description: String,
    /// Arguments passed to the stage's tool.
    pub arguments: Vec<String>,
    /// Files (relative to the stage directory) appended to the report after the run.
    pub includes: Vec<String>,
    /// Files deleted from the stage directory before the run.
    pub deletes: Vec<String>,
    /// Extra link input (relative to the stage directory) for the compile stage.
    pub link: Option<String>,
}

impl StageConfig {
    /// Parses a stage configuration from YAML text.
    pub fn from_yaml(path: &Path, text: &str) -> HarnessResult<Self> {
        // An empty file is a valid, all-default configuration.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| HarnessError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    pub fn load(path: &Path) -> HarnessResult<Self> {
        let text = fs::read_to_string(path).at(path)?;
        Self::from_yaml(path, &text)
    }

    /// True if the arguments request liveness checking.
    pub fn requests_liveness(&self) -> bool {
        self.arguments.iter().any(|arg| arg == "/liveness")
    }
}

// ============================================================================
// FIXTURE DESCRIPTOR
// ============================================================================

/// A fixture directory together with the stages it configures.
#[derive(Debug, Clone)]
pub struct FixtureDescriptor {
    pub dir: PathBuf,
    /// Keyed by stage kind, so iteration yields execution order.
    pub stages: BTreeMap<StageKind, StageConfig>,
}

impl FixtureDescriptor {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            stages: BTreeMap::new(),
        }
    }

    /// Adds or replaces the configuration for one stage.
    pub fn with_stage(mut self, kind: StageKind, config: StageConfig) -> Self {
        self.stages.insert(kind, config);
        self
    }

    /// Loads every stage directory of `dir` that contains a stage configuration.
    pub fn load(dir: impl Into<PathBuf>) -> HarnessResult<Self> {
        let mut fixture = Self::new(dir);
        for kind in StageKind::ALL {
            let config_path = fixture.dir.join(kind.dir_name()).join(STAGE_CONFIG_FILE_NAME);
            if config_path.is_file() {
                let config = StageConfig::load(&config_path)?;
                fixture.stages.insert(kind, config);
            }
        }
        Ok(fixture)
    }
}

// ============================================================================
// DISCOVERY
// ============================================================================

/// Recursively finds fixture directories under `suite_root`.
///
/// A fixture is any directory with at least one stage subdirectory holding a
/// stage configuration. Directories listed in `skip` (results root, harness
/// template) are not descended into. The result is sorted for deterministic order.
pub fn discover_fixtures(suite_root: &Path, skip: &[PathBuf]) -> HarnessResult<Vec<PathBuf>> {
    let mut fixtures = Vec::new();
    let walker = WalkDir::new(suite_root)
        .into_iter()
        .filter_entry(|entry| !skip.iter().any(|s| entry.path() == s.as_path()));

    for entry in walker {
        let entry = entry.map_err(|e| HarnessError::Config {
            path: suite_root.to_path_buf(),
            message: format!("Failed to walk directory: {}", e),
        })?;

        if !entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        if is_fixture_dir(path) {
            fixtures.push(path.to_path_buf());
        }
    }
    fixtures.sort();
    Ok(fixtures)
}

fn is_fixture_dir(path: &Path) -> bool {
    StageKind::ALL
        .iter()
        .any(|kind| path.join(kind.dir_name()).join(STAGE_CONFIG_FILE_NAME).is_file())
}
