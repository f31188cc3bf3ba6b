//! Model checker stage: run the checker on the compiled model, then append the
//! configured include files.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::errors::{HarnessError, HarnessResult, IoContext};
use crate::fixture::StageConfig;
use crate::orchestrator::HarnessContext;
use crate::process::run_with_output;
use crate::report::OutputReport;
use crate::staging::WorkingDirectory;

/// Extension of the compiled model the checker consumes.
pub const CHECKER_INPUT_EXTENSION: &str = "dll";
/// Files whose names contain this are linker byproducts, not checker inputs.
pub const LINKER_BYPRODUCT_MARKER: &str = "linker";
/// Include files with these suffixes may legitimately be absent.
pub const TRACE_SUFFIXES: [&str; 2] = ["trace", "trace.txt"];

pub fn run(
    ctx: &mut HarnessContext,
    config: &StageConfig,
    report: &mut OutputReport,
    work: &WorkingDirectory,
    stage_dir: &Path,
) -> HarnessResult<()> {
    let checker = ctx.config.model_checker_path();
    let input = find_checker_input(&[stage_dir, work.path()])?;

    let mut args = config.arguments.clone();
    args.push(input.display().to_string());

    {
        let _scope = ctx.profiler.start("run model checker", &input);
        let output = run_with_output(&checker, stage_dir, &args)?;
        report.append_process_output(&output);
    }

    append_includes(report, stage_dir, &config.includes)
}

/// The first checker input, by name, in the first directory that has one.
pub fn find_checker_input(dirs: &[&Path]) -> HarnessResult<PathBuf> {
    for dir in dirs {
        let candidates = checker_candidates(dir)?;
        if candidates.len() > 1 {
            log::warn!(
                "Multiple model checker inputs in {}; using {}",
                dir.display(),
                candidates[0].display()
            );
        }
        if let Some(first) = candidates.into_iter().next() {
            return Ok(first);
        }
    }
    Err(HarnessError::NoCheckerInput {
        dir: dirs.first().map(|d| d.to_path_buf()).unwrap_or_default(),
    })
}

fn checker_candidates(dir: &Path) -> HarnessResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir).at(dir)? {
        let path = entry.at(dir)?.path();
        if path.is_file() && is_checker_input(&path) {
            candidates.push(path);
        }
    }
    candidates.sort();
    Ok(candidates)
}

fn is_checker_input(path: &Path) -> bool {
    let has_extension = path
        .extension()
        .is_some_and(|ext| ext == CHECKER_INPUT_EXTENSION);
    let is_byproduct = path
        .file_name()
        .is_some_and(|name| name.to_string_lossy().contains(LINKER_BYPRODUCT_MARKER));
    has_extension && !is_byproduct
}

/// Appends one labeled section per include. A missing trace file is skipped
/// entirely; any other missing include is fatal. Contents are decoded lossily,
/// like captured process output.
pub fn append_includes(
    report: &mut OutputReport,
    stage_dir: &Path,
    includes: &[String],
) -> HarnessResult<()> {
    for include in includes {
        let path = stage_dir.join(include);
        match fs::read(&path) {
            Ok(bytes) => report.append_include(include, &String::from_utf8_lossy(&bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound && is_trace_file(include) => {
                log::debug!("Optional trace {} not produced", path.display());
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(HarnessError::MissingInclude { path, source: e });
            }
            Err(e) => return Err(HarnessError::Io { path, source: e }),
        }
    }
    Ok(())
}

pub fn is_trace_file(name: &str) -> bool {
    TRACE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_suffixes() {
        assert!(is_trace_file("trace.txt"));
        assert!(is_trace_file("zing.trace"));
        assert!(!is_trace_file("notes.txt"));
        assert!(!is_trace_file("trace.log"));
    }

    #[test]
    fn linker_byproducts_are_not_inputs() {
        assert!(is_checker_input(Path::new("/w/PingPong.dll")));
        assert!(!is_checker_input(Path::new("/w/linker.dll")));
        assert!(!is_checker_input(Path::new("/w/PingPong_linker.dll")));
        assert!(!is_checker_input(Path::new("/w/PingPong.4ml")));
    }
}
