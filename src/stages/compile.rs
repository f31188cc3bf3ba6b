//! Compile stage: compile, link, then compile again for the model checker.
//!
//! Compile and link failures end the stage with `EXIT: -1`. Once both pass,
//! the model compile always runs and always reports its own `EXIT:` line.

use std::{
    fs,
    ops::ControlFlow,
    path::{Path, PathBuf},
};

use crate::compiler::{CompileOptions, Compiler, CompilerOutput, LivenessOption};
use crate::errors::{HarnessError, HarnessResult, IoContext};
use crate::fixture::StageConfig;
use crate::orchestrator::HarnessContext;
use crate::report::OutputReport;
use crate::staging::WorkingDirectory;

/// Extension of compiler source files.
pub const SOURCE_EXTENSION: &str = "p";
/// Extension of the intermediate linked unit.
pub const UNIT_EXTENSION: &str = "4ml";

const EXIT_FAILURE: i32 = -1;

pub fn run(
    ctx: &mut HarnessContext,
    config: &StageConfig,
    report: &mut OutputReport,
    work: &WorkingDirectory,
    stage_dir: &Path,
) -> HarnessResult<()> {
    let sources = find_sources(work.path())?;
    let first_source = sources[0].clone();

    let mut options = CompileOptions {
        input_files: sources.clone(),
        dependencies: Vec::new(),
        output_dir: work.path().to_path_buf(),
        short_file_names: true,
        unit_name: first_source.with_extension(UNIT_EXTENSION),
        liveness: LivenessOption::None,
        target: CompilerOutput::C,
    };

    let linked = {
        let _scope = ctx.profiler.start("compile and link", &first_source);
        compile_and_link(ctx.compiler.as_mut(), report, &mut options, config, stage_dir)?
    };
    if linked.is_break() {
        report.write_exit(EXIT_FAILURE);
        return Ok(());
    }

    options.input_files = sources;
    options.dependencies.clear();
    options.target = CompilerOutput::Model;
    if config.requests_liveness() {
        options.liveness = LivenessOption::Standard;
    }

    let _scope = ctx.profiler.start("compile model", &first_source);
    let compiled = ctx.compiler.compile(report, &options)?;
    report.write_exit(if compiled { 0 } else { EXIT_FAILURE });
    Ok(())
}

/// Phases one and two. `Break` means a tool rejected its input.
fn compile_and_link(
    compiler: &mut dyn Compiler,
    report: &mut OutputReport,
    options: &mut CompileOptions,
    config: &StageConfig,
    stage_dir: &Path,
) -> HarnessResult<ControlFlow<()>> {
    if !compiler.compile(report, options)? {
        return Ok(ControlFlow::Break(()));
    }

    options.dependencies.push(options.unit_name.clone());
    options.input_files.clear();
    if let Some(link) = &config.link {
        options.input_files.push(stage_dir.join(link));
    }

    if !compiler.link(report, options)? {
        return Ok(ControlFlow::Break(()));
    }
    Ok(ControlFlow::Continue(()))
}

/// All `.p` files directly in `dir`, sorted by name. At least one must exist.
pub fn find_sources(dir: &Path) -> HarnessResult<Vec<PathBuf>> {
    let mut sources = Vec::new();
    for entry in fs::read_dir(dir).at(dir)? {
        let path = entry.at(dir)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION) {
            sources.push(path);
        }
    }
    if sources.is_empty() {
        return Err(HarnessError::NoSourceFiles {
            dir: dir.to_path_buf(),
        });
    }
    sources.sort();
    Ok(sources)
}
