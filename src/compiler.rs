//! The compiler/linker collaborator.
//!
//! The harness never implements compilation itself. It drives anything that
//! implements [`Compiler`]: an in-process front end, or [`CommandCompiler`],
//! which shells out to a compiler executable.

use std::path::PathBuf;

use crate::errors::{HarnessError, HarnessResult};
use crate::process::run_with_output;
use crate::report::OutputSink;

/// Code generation target of a compile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerOutput {
    /// Native C code for the runtime.
    C,
    /// Code for the model checker.
    Model,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessOption {
    None,
    Standard,
}

/// Options shared by `compile` and `link`. The compile stage mutates one
/// instance between its phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    pub input_files: Vec<PathBuf>,
    pub dependencies: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub short_file_names: bool,
    pub unit_name: PathBuf,
    pub liveness: LivenessOption,
    pub target: CompilerOutput,
}

/// Compile and link capability.
///
/// `Ok(false)` means the tool ran and rejected its input; that is a normal,
/// comparable outcome. `Err` means the tool could not be driven at all.
pub trait Compiler {
    fn compile(
        &mut self,
        output: &mut dyn OutputSink,
        options: &CompileOptions,
    ) -> HarnessResult<bool>;

    fn link(&mut self, output: &mut dyn OutputSink, options: &CompileOptions) -> HarnessResult<bool>;
}

// ============================================================================
// COMMAND COMPILER - External compiler executable
// ============================================================================

/// Drives a compiler executable, one process per `compile`/`link` call.
///
/// The tool's stdout and stderr are written to the output sink; success is a
/// zero exit code.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: PathBuf,
}

impl CommandCompiler {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn invoke(
        &self,
        output: &mut dyn OutputSink,
        options: &CompileOptions,
        args: Vec<String>,
    ) -> HarnessResult<bool> {
        let result = run_with_output(&self.program, &options.output_dir, &args)?;
        output.emit(&result.stdout);
        output.emit(&result.stderr);
        Ok(result.success())
    }
}

impl Compiler for CommandCompiler {
    fn compile(
        &mut self,
        output: &mut dyn OutputSink,
        options: &CompileOptions,
    ) -> HarnessResult<bool> {
        self.invoke(output, options, compile_arguments(options))
    }

    fn link(&mut self, output: &mut dyn OutputSink, options: &CompileOptions) -> HarnessResult<bool> {
        self.invoke(output, options, link_arguments(options))
    }
}

/// Stands in when no compiler is configured. Suites without a compile stage
/// run normally; the first compile or link fails the test case.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredCompiler;

impl UnconfiguredCompiler {
    fn missing() -> HarnessError {
        HarnessError::ToolNotFound {
            tool: "compiler".to_string(),
            message: "tools.compiler is not configured".to_string(),
        }
    }
}

impl Compiler for UnconfiguredCompiler {
    fn compile(&mut self, _: &mut dyn OutputSink, _: &CompileOptions) -> HarnessResult<bool> {
        Err(Self::missing())
    }

    fn link(&mut self, _: &mut dyn OutputSink, _: &CompileOptions) -> HarnessResult<bool> {
        Err(Self::missing())
    }
}

/// Command line for a compile: inputs, then options.
pub fn compile_arguments(options: &CompileOptions) -> Vec<String> {
    let mut args: Vec<String> = options
        .input_files
        .iter()
        .map(|f| f.display().to_string())
        .collect();
    args.push(format!("/outputDir:{}", options.output_dir.display()));
    if options.short_file_names {
        args.push("/shortFileNames".to_string());
    }
    args.push(format!("/unitName:{}", options.unit_name.display()));
    args.push(
        match options.target {
            CompilerOutput::C => "/generate:C",
            CompilerOutput::Model => "/generate:Zing",
        }
        .to_string(),
    );
    if options.liveness == LivenessOption::Standard {
        args.push("/liveness".to_string());
    }
    args
}

/// Command line for a link: `/link`, inputs, dependencies, then options.
pub fn link_arguments(options: &CompileOptions) -> Vec<String> {
    let mut args = vec!["/link".to_string()];
    args.extend(options.input_files.iter().map(|f| f.display().to_string()));
    args.extend(
        options
            .dependencies
            .iter()
            .map(|d| format!("/dependency:{}", d.display())),
    );
    args.push(format!("/outputDir:{}", options.output_dir.display()));
    if options.short_file_names {
        args.push("/shortFileNames".to_string());
    }
    args
}
