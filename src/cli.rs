//! Command-line entry point.
//!
//! `goldrun run` stages and checks fixtures; `goldrun list` shows what discovery
//! finds. Exit status is 0 when every stage matches, 1 on any mismatch or
//! aborted fixture, and 2 when the run itself cannot start.

use std::{
    path::{Path, PathBuf},
    process,
};

use clap::{Parser, Subcommand};

use crate::{
    compiler::{CommandCompiler, Compiler, UnconfiguredCompiler},
    config::{resolve_tool, HarnessConfig},
    errors::{print_error, HarnessResult},
    fixture::{discover_fixtures, FixtureDescriptor},
    orchestrator::{run_test_case, HarnessContext},
};

pub mod output;

use output::{Console, RunSummary};

// ============================================================================
// CLI ARGUMENTS - Command-line argument definitions
// ============================================================================

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "goldrun",
    version,
    about = "Stages compiler fixtures and checks every pipeline stage against its golden output."
)]
pub struct GoldrunArgs {
    /// Harness configuration file (YAML).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: ArgsCommand,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum ArgsCommand {
    /// Run fixtures and compare every configured stage.
    Run {
        /// Fixture directories to run. Defaults to every fixture under the suite root.
        fixtures: Vec<PathBuf>,
        /// Only run fixtures whose suite-relative path contains this substring.
        #[arg(short, long)]
        filter: Option<String>,
        /// Overwrite golden references with the actual output.
        #[arg(long)]
        freeze: bool,
    },
    /// List the fixtures discovered under the suite root.
    List,
}

// ============================================================================
// MAIN ENTRY POINT
// ============================================================================

/// The main entry point for the CLI.
pub fn run() {
    let args = GoldrunArgs::parse();

    let result = match args.command {
        ArgsCommand::Run {
            fixtures,
            filter,
            freeze,
        } => run_fixtures(args.config.as_deref(), fixtures, filter.as_deref(), freeze),
        ArgsCommand::List => list_fixtures(args.config.as_deref()),
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            print_error(e);
            process::exit(2);
        }
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_fixtures(
    config_path: Option<&Path>,
    fixtures: Vec<PathBuf>,
    filter: Option<&str>,
    freeze: bool,
) -> HarnessResult<bool> {
    let mut config = HarnessConfig::load(config_path)?;
    config.freeze |= freeze;

    let compiler: Box<dyn Compiler> = match &config.tools.compiler {
        Some(path) => Box::new(CommandCompiler::new(resolve_tool(path)?)),
        None => {
            log::debug!("No compiler configured; compile stages will fail");
            Box::new(UnconfiguredCompiler)
        }
    };

    let fixture_dirs = select_fixtures(&config, fixtures, filter)?;
    let mut ctx = HarnessContext::new(config, compiler);
    let mut console = Console::new();
    let mut summary = RunSummary::default();

    if !fixture_dirs.is_empty() {
        console.print_line(&format!("Found {} fixtures", fixture_dirs.len()));
    }

    // Cases run one after another: the compiler is borrowed mutably by each.
    for dir in fixture_dirs {
        let name = display_name(&ctx.config, &dir);
        let outcome = FixtureDescriptor::load(&dir).and_then(|f| run_test_case(&mut ctx, &f));
        match outcome {
            Ok(outcome) => {
                let failed = outcome.failures().count();
                summary.failed += failed;
                summary.passed += outcome.stages.len() - failed;
                console.print_case(&name, &outcome);
            }
            Err(e) => {
                summary.errored += 1;
                console.print_error(&name);
                print_error(e);
            }
        }
    }

    if let Err(e) = ctx.profiler.save(&ctx.config.profile_path()) {
        log::warn!("Could not save profile: {}", e);
    }

    console.print_summary(&summary);
    Ok(summary.success())
}

fn list_fixtures(config_path: Option<&Path>) -> HarnessResult<bool> {
    let config = HarnessConfig::load(config_path)?;
    let mut console = Console::new();
    for dir in select_fixtures(&config, Vec::new(), None)? {
        console.print_line(&display_name(&config, &dir));
    }
    Ok(true)
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn select_fixtures(
    config: &HarnessConfig,
    explicit: Vec<PathBuf>,
    filter: Option<&str>,
) -> HarnessResult<Vec<PathBuf>> {
    let candidates = if explicit.is_empty() {
        let skip = [config.results_root(), config.harness_template_dir()];
        discover_fixtures(&config.suite_root, &skip)?
    } else {
        explicit
    };

    Ok(candidates
        .into_iter()
        .filter(|dir| filter.map_or(true, |f| display_name(config, dir).contains(f)))
        .collect())
}

fn display_name(config: &HarnessConfig, dir: &Path) -> String {
    dir.strip_prefix(&config.suite_root)
        .unwrap_or(dir)
        .display()
        .to_string()
}
