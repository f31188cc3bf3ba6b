//! Stage reports: append-only text assembled from direct writes, captured
//! process output, and included files.
//!
//! Line endings are left as written while the report is built; [`normalize_newlines`]
//! collapses them to `\n` before a report is compared or saved.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::process::ProcessOutput;

/// Separator line used in the report header and include sections.
pub const SEPARATOR: &str = "=================================";

/// Title line of the report header.
pub const HEADER_TITLE: &str = "         Console output          ";

static NEW_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n|\n\r|\n|\r").unwrap());

/// Rewrites every `\r\n`, `\n\r`, `\n`, or `\r` terminator to `\n`.
pub fn normalize_newlines(text: &str) -> String {
    NEW_LINE.replace_all(text, "\n").into_owned()
}

/// The fixed three-line header every stage report starts with.
pub fn header_text() -> String {
    format!("{SEPARATOR}\n{HEADER_TITLE}\n{SEPARATOR}\n")
}

// ============================================================================
// OUTPUT SINK
// ============================================================================

/// Anything a collaborator (compiler, linker) can write diagnostics into.
pub trait OutputSink {
    fn emit(&mut self, text: &str);
}

// ============================================================================
// OUTPUT REPORT
// ============================================================================

/// One stage's combined output. Append-only.
#[derive(Debug, Default, Clone)]
pub struct OutputReport {
    buffer: String,
}

impl OutputReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// A report that already carries the stage header.
    pub fn with_header() -> Self {
        let mut report = Self::new();
        report.write_header();
        report
    }

    /// Appends text as-is, without a terminator.
    pub fn write(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    /// Appends text followed by a line terminator.
    pub fn write_line(&mut self, text: &str) {
        self.buffer.push_str(text);
        self.buffer.push('\n');
    }

    pub fn blank_line(&mut self) {
        self.buffer.push('\n');
    }

    pub fn write_header(&mut self) {
        self.write_line(SEPARATOR);
        self.write_line(HEADER_TITLE);
        self.write_line(SEPARATOR);
    }

    /// Appends `EXIT: <code>`.
    pub fn write_exit(&mut self, code: i32) {
        self.write_line(&format!("EXIT: {code}"));
    }

    /// Appends captured stdout then stderr, each as an opaque block, then the exit line.
    pub fn append_process_output(&mut self, output: &ProcessOutput) {
        self.write(&output.stdout);
        self.write(&output.stderr);
        self.write_exit(output.exit_code);
    }

    /// Appends a labeled section with every line of `contents`.
    pub fn append_include(&mut self, name: &str, contents: &str) {
        self.append_include_header(name);
        for line in contents.lines() {
            self.write_line(line);
        }
    }

    pub fn append_include_header(&mut self, name: &str) {
        self.blank_line();
        self.write_line(SEPARATOR);
        self.write_line(name);
        self.write_line(SEPARATOR);
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    /// The report with canonical line endings.
    pub fn normalized(&self) -> String {
        normalize_newlines(&self.buffer)
    }
}

impl OutputSink for OutputReport {
    fn emit(&mut self, text: &str) {
        self.write(text);
    }
}
