// Runtime harness stage: template copy, clean + build, tester run.
#![cfg(unix)]

mod common;

use std::fs;
use std::path::PathBuf;

use common::{golden, process_lock, write, write_script, ScriptedCompiler, Suite};
use goldrun::config::{HarnessConfig, HARNESS_PROJECT_NAME, HARNESS_TEMPLATE_DIR_NAME};
use goldrun::golden::CORRECT_OUTPUT_FILE_NAME;
use goldrun::{run_test_case, FixtureDescriptor, HarnessContext, HarnessError, StageConfig, StageKind};
use pretty_assertions::assert_eq;

struct Harness {
    suite: Suite,
    build_log: PathBuf,
}

/// A suite with a harness template (project file plus a prebuilt tester) and a
/// build tool that appends its arguments to `build.log` and exits with `build_exit`.
fn harness(build_exit: i32) -> Harness {
    let suite = Suite::new();
    let template = suite.root().join(HARNESS_TEMPLATE_DIR_NAME);
    write(&template.join(HARNESS_PROJECT_NAME), "<Project />\n");
    write_script(
        &template.join("Debug").join("x64").join("tester"),
        r#"echo "tester ran with $*"
echo "assertion failed" 1>&2
exit 3"#,
    );

    let tools = suite.root().parent().unwrap().join("tools");
    let build_log = tools.join("build.log");
    write_script(
        &tools.join("msbuild"),
        &format!(
            "echo \"$(basename \"$1\") $2 $3 $4 $5\" >> {}\necho building\nexit {}",
            build_log.display(),
            build_exit
        ),
    );
    Harness { suite, build_log }
}

impl Harness {
    fn config(&self) -> HarnessConfig {
        let mut config = self.suite.config();
        config.tools.build_tool = self.build_log.with_file_name("msbuild");
        config
    }

    fn fixture(&self, name: &str, expected_body: &str) -> FixtureDescriptor {
        let dir = self.suite.fixture(name);
        write(&dir.join("Prt").join(CORRECT_OUTPUT_FILE_NAME), &golden(expected_body));
        let config = StageConfig {
            arguments: vec!["--seed".to_string(), "7".to_string()],
            ..StageConfig::default()
        };
        FixtureDescriptor::new(dir).with_stage(StageKind::RuntimeHarness, config)
    }
}

#[test]
fn tester_output_and_exit_code_are_reported() {
    let _lock = process_lock();
    let harness = harness(0);
    let fixture = harness.fixture(
        "Correct/Runtime",
        "tester ran with --seed 7\nassertion failed\nEXIT: 3\n",
    );
    let mut ctx = HarnessContext::new(harness.config(), Box::new(ScriptedCompiler::succeeding()));

    let outcome = run_test_case(&mut ctx, &fixture).unwrap();

    assert!(outcome.passed(), "{:?}", outcome.stages[0].comparison.diff());
    // Build chatter stays out of the compared report.
    assert!(!outcome.stages[0].comparison.actual.contains("building"));
}

#[test]
fn tester_runs_in_the_stage_directory() {
    let _lock = process_lock();
    let harness = harness(0);
    write_script(
        &harness
            .suite
            .root()
            .join(HARNESS_TEMPLATE_DIR_NAME)
            .join("Debug")
            .join("x64")
            .join("tester"),
        "pwd -P",
    );
    let fixture = harness.fixture("Correct/Cwd", "unused\n");
    let mut ctx = HarnessContext::new(harness.config(), Box::new(ScriptedCompiler::succeeding()));

    let outcome = run_test_case(&mut ctx, &fixture).unwrap();

    let stage_dir = outcome
        .working_dir
        .stage_dir(StageKind::RuntimeHarness)
        .canonicalize()
        .unwrap();
    assert_eq!(
        outcome.stages[0].comparison.actual,
        golden(&format!("{}\nEXIT: 0\n", stage_dir.display()))
    );
}

#[test]
fn project_is_cleaned_then_built() {
    let _lock = process_lock();
    let harness = harness(0);
    let fixture = harness.fixture("Correct/CleanBuild", "unused\n");
    let mut ctx = HarnessContext::new(harness.config(), Box::new(ScriptedCompiler::succeeding()));

    let outcome = run_test_case(&mut ctx, &fixture).unwrap();

    assert!(outcome
        .working_dir
        .path()
        .join(HARNESS_PROJECT_NAME)
        .is_file());
    assert_eq!(
        fs::read_to_string(&harness.build_log).unwrap(),
        "Tester.vcxproj /t:Clean /p:Configuration=Debug /p:Platform=x64 /nologo\n\
         Tester.vcxproj /t:Build /p:Configuration=Debug /p:Platform=x64 /nologo\n"
    );
    let operations: Vec<String> = ctx
        .profiler
        .entries()
        .into_iter()
        .map(|e| e.operation)
        .collect();
    assert_eq!(operations, vec!["build tester", "run tester"]);
}

#[test]
fn build_failure_aborts_the_case() {
    let _lock = process_lock();
    let harness = harness(1);
    let fixture = harness.fixture("Errors/BuildBreaks", "unused\n");
    let mut ctx = HarnessContext::new(harness.config(), Box::new(ScriptedCompiler::succeeding()));

    let err = run_test_case(&mut ctx, &fixture).unwrap_err();

    match err {
        HarnessError::BuildFailed { stdout, .. } => assert_eq!(stdout, "building\n"),
        other => panic!("unexpected error: {other}"),
    }
    // Clean failed, so no build was attempted.
    assert_eq!(fs::read_to_string(&harness.build_log).unwrap().lines().count(), 1);
}

#[test]
fn missing_template_is_a_staging_error() {
    let suite = Suite::new();
    let dir = suite.fixture("Errors/NoTemplate");
    write(&dir.join("Prt").join(CORRECT_OUTPUT_FILE_NAME), &golden("EXIT: 0\n"));
    let fixture = FixtureDescriptor::new(dir).with_stage(StageKind::RuntimeHarness, StageConfig::default());
    let mut ctx = HarnessContext::new(suite.config(), Box::new(ScriptedCompiler::succeeding()));

    let err = run_test_case(&mut ctx, &fixture).unwrap_err();

    assert!(matches!(err, HarnessError::Staging { .. }));
}
