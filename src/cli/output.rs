//! Handles all user-facing output for the CLI.
//!
//! Colored per-stage status lines, unified diffs for mismatches, and the run
//! summary. Color is used only when stdout is a terminal.

use std::io::Write;

use difference::Difference;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::orchestrator::{CaseOutcome, StageOutcome};

/// Counts accumulated over a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
}

impl RunSummary {
    pub fn success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

pub struct Console {
    stdout: StandardStream,
}

impl Console {
    pub fn new() -> Self {
        let choice = if atty::is(atty::Stream::Stdout) {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        Self {
            stdout: StandardStream::stdout(choice),
        }
    }

    /// Prints one line per stage and a diff for every mismatch.
    pub fn print_case(&mut self, name: &str, outcome: &CaseOutcome) {
        for stage in &outcome.stages {
            self.print_stage(name, stage);
        }
    }

    /// Prints a test case that aborted with a harness error.
    pub fn print_error(&mut self, name: &str) {
        self.colored(Color::Red, true, &format!("ERROR: {name}"));
    }

    pub fn print_summary(&mut self, summary: &RunSummary) {
        let _ = writeln!(self.stdout);
        self.colored(Color::White, true, "Test Summary");
        let _ = writeln!(self.stdout, "═══════════════");
        if summary.passed > 0 {
            self.colored(Color::Green, false, &format!("✓ Passed:  {} stages", summary.passed));
        }
        if summary.failed > 0 {
            self.colored(Color::Red, false, &format!("✗ Failed:  {} stages", summary.failed));
        }
        if summary.errored > 0 {
            self.colored(Color::Red, false, &format!("! Errored: {} fixtures", summary.errored));
        }
    }

    pub fn print_line(&mut self, text: &str) {
        let _ = writeln!(self.stdout, "{text}");
    }

    fn print_stage(&mut self, name: &str, stage: &StageOutcome) {
        let label = format!("{name} [{}]", stage.kind);
        if stage.comparison.frozen {
            self.colored(Color::Yellow, true, &format!("FROZEN: {label}"));
        } else if stage.passed() {
            self.colored(Color::Green, true, &format!("PASS: {label}"));
        } else {
            self.colored(Color::Red, true, &format!("FAIL: {label}"));
            let _ = writeln!(self.stdout, "  actual output: {}", stage.comparison.artifact.display());
            self.print_diff(&stage.comparison.diff());
        }
    }

    fn print_diff(&mut self, diffs: &[Difference]) {
        for diff in diffs {
            match diff {
                Difference::Same(ref x) => {
                    let _ = self.stdout.reset();
                    for line in x.lines() {
                        let _ = writeln!(self.stdout, " {line}");
                    }
                }
                Difference::Add(ref x) => {
                    let _ = self.stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
                    for line in x.lines() {
                        let _ = writeln!(self.stdout, "+{line}");
                    }
                }
                Difference::Rem(ref x) => {
                    let _ = self.stdout.set_color(ColorSpec::new().set_fg(Some(Color::Red)));
                    for line in x.lines() {
                        let _ = writeln!(self.stdout, "-{line}");
                    }
                }
            }
        }
        let _ = self.stdout.reset();
    }

    fn colored(&mut self, color: Color, bold: bool, text: &str) {
        let _ = self
            .stdout
            .set_color(ColorSpec::new().set_fg(Some(color)).set_bold(bold));
        let _ = writeln!(self.stdout, "{text}");
        let _ = self.stdout.reset();
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
