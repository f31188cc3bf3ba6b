//! Suite-wide harness configuration.
//!
//! Loaded from an optional YAML file, then overridden from the environment:
//!
//! - `GOLDRUN_CONFIGURATION`: build configuration (`Debug`, `Release`, ...)
//! - `GOLDRUN_PLATFORM`: build platform (`x64`, `x86`, ...)
//! - `GOLDRUN_FREEZE`: any non-empty value other than `0` enables freeze mode

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::errors::{HarnessError, HarnessResult, IoContext};

pub const ENV_CONFIGURATION: &str = "GOLDRUN_CONFIGURATION";
pub const ENV_PLATFORM: &str = "GOLDRUN_PLATFORM";
pub const ENV_FREEZE: &str = "GOLDRUN_FREEZE";

/// Directory under the suite root holding the native harness template.
pub const HARNESS_TEMPLATE_DIR_NAME: &str = "PrtTester";
/// Project file of the native harness, relative to the working directory.
pub const HARNESS_PROJECT_NAME: &str = "Tester.vcxproj";
/// File name of the persisted phase profile.
pub const PROFILE_FILE_NAME: &str = "TestProfile.yaml";

/// Paths and names of the external tools a suite drives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolPaths {
    /// Compiler executable used by `CommandCompiler`.
    pub compiler: Option<PathBuf>,
    /// Build tool for the runtime harness project.
    pub build_tool: PathBuf,
    /// Explicit model checker path; derived from the solution root when unset.
    pub model_checker: Option<PathBuf>,
    /// File name of the built harness executable.
    pub tester_executable: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            compiler: None,
            build_tool: PathBuf::from("msbuild"),
            model_checker: None,
            tester_executable: default_executable("tester"),
        }
    }
}

/// Configuration shared by every test case of a run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Root of the fixture tree; fixtures are staged relative to it.
    pub suite_root: PathBuf,
    /// Where working copies go. Defaults to `TestResult_<configuration>_<platform>`
    /// under the suite root.
    pub results_root: Option<PathBuf>,
    /// Root of the toolchain checkout, used to locate the model checker drop.
    pub solution_root: PathBuf,
    pub configuration: String,
    pub platform: String,
    /// Overwrite golden references with actual output instead of asserting.
    pub freeze: bool,
    pub tools: ToolPaths,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            suite_root: PathBuf::from("Tst"),
            results_root: None,
            solution_root: PathBuf::from("."),
            configuration: "Debug".to_string(),
            platform: "x64".to_string(),
            freeze: false,
            tools: ToolPaths::default(),
        }
    }
}

impl HarnessConfig {
    /// Parses a configuration from YAML text. Relative paths stay relative.
    pub fn from_yaml(path: &Path, text: &str) -> HarnessResult<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|e| HarnessError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Loads the file if given, otherwise starts from defaults, then applies
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> HarnessResult<Self> {
        let mut config = match path {
            Some(path) => {
                let text = fs::read_to_string(path).at(path)?;
                Self::from_yaml(path, &text)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    /// Applies overrides from a variable lookup (the process environment in `load`).
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(configuration) = lookup(ENV_CONFIGURATION).filter(|v| !v.is_empty()) {
            self.configuration = configuration;
        }
        if let Some(platform) = lookup(ENV_PLATFORM).filter(|v| !v.is_empty()) {
            self.platform = platform;
        }
        if let Some(freeze) = lookup(ENV_FREEZE) {
            self.freeze = !freeze.is_empty() && freeze != "0";
        }
    }

    pub fn results_root(&self) -> PathBuf {
        match &self.results_root {
            Some(root) => root.clone(),
            None => self.suite_root.join(format!(
                "TestResult_{}_{}",
                self.configuration, self.platform
            )),
        }
    }

    pub fn harness_template_dir(&self) -> PathBuf {
        self.suite_root.join(HARNESS_TEMPLATE_DIR_NAME)
    }

    /// Model checker location: the explicit tool path, or the platform drop
    /// under the solution root.
    pub fn model_checker_path(&self) -> PathBuf {
        match &self.tools.model_checker {
            Some(path) => path.clone(),
            None => self
                .solution_root
                .join("Bld")
                .join("Drops")
                .join(&self.configuration)
                .join(&self.platform)
                .join("Binaries")
                .join(default_executable("zinger")),
        }
    }

    pub fn profile_path(&self) -> PathBuf {
        self.results_root().join(PROFILE_FILE_NAME)
    }
}

/// Resolves a bare tool name on `PATH`; paths with a directory component are
/// returned unchanged.
pub fn resolve_tool(tool: &Path) -> HarnessResult<PathBuf> {
    if tool.components().count() > 1 {
        return Ok(tool.to_path_buf());
    }
    which::which(tool).map_err(|e| HarnessError::ToolNotFound {
        tool: tool.display().to_string(),
        message: e.to_string(),
    })
}

fn default_executable(stem: &str) -> String {
    format!("{}{}", stem, env::consts::EXE_SUFFIX)
}
