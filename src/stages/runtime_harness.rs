//! Runtime harness stage: build the native tester around the compiler's
//! generated code, run it, and record its output.
//!
//! Build failures are harness defects and abort the test case. The tester's
//! own exit code is part of the compared report.

use std::path::{Path, PathBuf};

use crate::config::{resolve_tool, HarnessConfig, HARNESS_PROJECT_NAME};
use crate::errors::{HarnessError, HarnessResult};
use crate::fixture::StageConfig;
use crate::orchestrator::HarnessContext;
use crate::process::run_with_output;
use crate::report::OutputReport;
use crate::staging::{copy_tree, WorkingDirectory};

pub fn run(
    ctx: &mut HarnessContext,
    config: &StageConfig,
    report: &mut OutputReport,
    work: &WorkingDirectory,
    stage_dir: &Path,
) -> HarnessResult<()> {
    let template = ctx.config.harness_template_dir();
    if !template.is_dir() {
        return Err(HarnessError::Staging {
            fixture: work.path().to_path_buf(),
            message: format!("harness template '{}' not found", template.display()),
        });
    }
    copy_tree(&template, work.path())?;

    let project = work.path().join(HARNESS_PROJECT_NAME);
    let tester = tester_path(&ctx.config, work.path());
    let build_tool = resolve_tool(&ctx.config.tools.build_tool)?;

    {
        let _scope = ctx.profiler.start("build tester", work.path());
        build_tester(&build_tool, &project, stage_dir, &ctx.config, true)?;
        build_tester(&build_tool, &project, stage_dir, &ctx.config, false)?;
    }

    let _scope = ctx.profiler.start("run tester", work.path());
    let output = run_with_output(&tester, stage_dir, &config.arguments)?;
    report.append_process_output(&output);
    Ok(())
}

/// `<work>/<configuration>/<platform>/<tester executable>`.
pub fn tester_path(config: &HarnessConfig, work_dir: &Path) -> PathBuf {
    work_dir
        .join(&config.configuration)
        .join(&config.platform)
        .join(&config.tools.tester_executable)
}

/// Arguments for one build-tool invocation on the harness project.
pub fn build_arguments(project: &Path, config: &HarnessConfig, clean: bool) -> Vec<String> {
    vec![
        project.display().to_string(),
        if clean { "/t:Clean" } else { "/t:Build" }.to_string(),
        format!("/p:Configuration={}", config.configuration),
        format!("/p:Platform={}", config.platform),
        "/nologo".to_string(),
    ]
}

fn build_tester(
    build_tool: &Path,
    project: &Path,
    stage_dir: &Path,
    config: &HarnessConfig,
    clean: bool,
) -> HarnessResult<()> {
    let args = build_arguments(project, config, clean);
    let output = run_with_output(build_tool, stage_dir, &args)?;
    if !output.success() {
        return Err(HarnessError::BuildFailed {
            project: project.to_path_buf(),
            stdout: output.stdout,
            stderr: output.stderr,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_arguments_clean_then_build() {
        let config = HarnessConfig {
            configuration: "Release".into(),
            platform: "x86".into(),
            ..HarnessConfig::default()
        };
        let project = Path::new("/w/Tester.vcxproj");
        assert_eq!(
            build_arguments(project, &config, true),
            vec![
                "/w/Tester.vcxproj",
                "/t:Clean",
                "/p:Configuration=Release",
                "/p:Platform=x86",
                "/nologo",
            ]
        );
        assert_eq!(build_arguments(project, &config, false)[1], "/t:Build");
    }

    #[test]
    fn tester_lives_under_configuration_and_platform() {
        let mut config = HarnessConfig::default();
        config.tools.tester_executable = "tester".into();
        assert_eq!(
            tester_path(&config, Path::new("/w")),
            PathBuf::from("/w/Debug/x64/tester")
        );
    }
}
