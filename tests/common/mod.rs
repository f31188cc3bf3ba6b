//! # goldrun Test Support
//!
//! Temporary fixture suites, a scripted compiler, and shell-script stand-ins
//! for the external tools.

#![allow(dead_code)]

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::{Mutex, MutexGuard};

use goldrun::compiler::{CompileOptions, Compiler, CompilerOutput};
use goldrun::config::HarnessConfig;
use goldrun::report::{header_text, OutputSink};
use goldrun::HarnessResult;
use tempfile::TempDir;

// =============================================================================
// SCRIPTED COMPILER
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Compile(CompileOptions),
    Link(CompileOptions),
}

/// A compiler whose verdicts are fixed up front. Every call is recorded.
pub struct ScriptedCompiler {
    pub compile_ok: bool,
    pub link_ok: bool,
    pub model_ok: bool,
    /// Written to the output sink on every call.
    pub chatter: Option<String>,
    pub calls: Rc<RefCell<Vec<Call>>>,
}

impl ScriptedCompiler {
    pub fn succeeding() -> Self {
        Self {
            compile_ok: true,
            link_ok: true,
            model_ok: true,
            chatter: None,
            calls: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Rc<RefCell<Vec<Call>>> {
        Rc::clone(&self.calls)
    }
}

impl Compiler for ScriptedCompiler {
    fn compile(
        &mut self,
        output: &mut dyn OutputSink,
        options: &CompileOptions,
    ) -> HarnessResult<bool> {
        self.calls.borrow_mut().push(Call::Compile(options.clone()));
        if let Some(chatter) = &self.chatter {
            output.emit(chatter);
        }
        Ok(match options.target {
            CompilerOutput::C => self.compile_ok,
            CompilerOutput::Model => self.model_ok,
        })
    }

    fn link(&mut self, output: &mut dyn OutputSink, options: &CompileOptions) -> HarnessResult<bool> {
        self.calls.borrow_mut().push(Call::Link(options.clone()));
        if let Some(chatter) = &self.chatter {
            output.emit(chatter);
        }
        Ok(self.link_ok)
    }
}

// =============================================================================
// FIXTURE SUITES
// =============================================================================

/// A suite root inside a temporary directory.
pub struct Suite {
    _dir: TempDir,
    root: PathBuf,
}

impl Suite {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("suite");
        fs::create_dir_all(&root).unwrap();
        Self { _dir: dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> HarnessConfig {
        HarnessConfig {
            suite_root: self.root.clone(),
            ..HarnessConfig::default()
        }
    }

    /// Creates `<suite>/<relative>` with one source file `main.p`.
    pub fn fixture(&self, relative: &str) -> PathBuf {
        let dir = self.root.join(relative);
        write(&dir.join("main.p"), "machine Main {}\n");
        dir
    }
}

/// Writes `contents` to `path`, creating parent directories.
pub fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

/// Writes an executable `/bin/sh` script.
#[cfg(unix)]
pub fn write_script(path: &Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    write(path, &format!("#!/bin/sh\n{body}\n"));
    let mut perms = fs::metadata(path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).unwrap();
}

/// Golden text: the report header followed by `body`.
pub fn golden(body: &str) -> String {
    format!("{}{}", header_text(), body)
}

static PROCESS_LOCK: Mutex<()> = Mutex::new(());

/// Serializes tests that write scripts and then execute them, so no script is
/// still open for writing in a sibling thread's fork.
pub fn process_lock() -> MutexGuard<'static, ()> {
    PROCESS_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
