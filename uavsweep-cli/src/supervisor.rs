//! Simulator Process Boundary
//!
//! Spawns the external simulator once per run, captures its output and exit
//! status, and runs the build step when the executable is missing.

use crate::planner::RunSpec;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

/// SIGINT as reported by [`ProcessOutput::exit_code`]
#[cfg(unix)]
const SIGINT_EXIT: i32 = -2;

/// Errors that end a sweep
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The process could not be started at all
    #[error("Failed to spawn {program}: {source}")]
    SpawnFailed {
        /// Program as given on the command line
        program: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// No program to run
    #[error("Command line is empty")]
    EmptyCommand,

    /// The build step exited unsuccessfully
    #[error("Build command '{command}' failed: {status}")]
    BuildFailed {
        /// Build command as run
        command: String,
        /// Rendered exit status
        status: String,
    },

    /// The build step succeeded but left no executable behind
    #[error("Simulator binary not found at {0} after building")]
    MissingAfterBuild(PathBuf),

    /// Ctrl-C was pressed
    #[error("Execution interrupted by user.")]
    Interrupted,
}

/// Captured result of one process invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, or the negated signal number when killed by a signal
    pub exit_code: i32,
    /// Captured stdout, lossily decoded
    pub stdout: String,
    /// Captured stderr, lossily decoded
    pub stderr: String,
}

/// Handle on the simulator executable
#[derive(Debug, Clone)]
pub struct Simulator {
    binary: PathBuf,
    root: PathBuf,
}

impl Simulator {
    /// `binary` is the executable; `root` is the working directory for runs,
    /// the build step, and the base for relative instance paths.
    pub fn new(binary: impl Into<PathBuf>, root: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            root: root.into(),
        }
    }

    /// Path of the executable.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the executable exists.
    pub fn is_present(&self) -> bool {
        self.binary.is_file()
    }

    /// Argument vector for one run:
    /// `<binary> <instance> <drones> <iterations> <ticks> [--export] [--times]`.
    pub fn command_line(
        &self,
        run: &RunSpec,
        export_data: bool,
        time_breakdown: bool,
    ) -> Vec<String> {
        let mut argv = vec![
            self.binary.display().to_string(),
            self.root.join(&run.instance).display().to_string(),
            run.drones.to_string(),
            run.iterations.to_string(),
            run.ticks.to_string(),
        ];
        if export_data {
            argv.push("--export".to_string());
        }
        if time_breakdown {
            argv.push("--times".to_string());
        }
        argv
    }

    /// Run an argument vector to completion and capture its output.
    ///
    /// A non-zero exit is a normal outcome; only a failure to start the
    /// process is an error.
    pub fn invoke(&self, argv: &[String]) -> Result<ProcessOutput, SupervisorError> {
        let (program, args) = argv
            .split_first()
            .ok_or(SupervisorError::EmptyCommand)?;

        let output = Command::new(program)
            .args(args)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| SupervisorError::SpawnFailed {
                program: program.clone(),
                source,
            })?;

        Ok(ProcessOutput {
            exit_code: exit_code(output.status),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Build the simulator if it is missing.
    ///
    /// Returns `true` when the build step ran. The build inherits the
    /// terminal so its output stays visible. A raised `stop` flag, or a build
    /// killed by SIGINT, ends with [`SupervisorError::Interrupted`].
    pub fn ensure_built(
        &self,
        build_command: &[String],
        stop: &AtomicBool,
    ) -> Result<bool, SupervisorError> {
        if self.is_present() {
            return Ok(false);
        }
        if stop.load(Ordering::SeqCst) {
            return Err(SupervisorError::Interrupted);
        }

        let (program, args) = build_command
            .split_first()
            .ok_or(SupervisorError::EmptyCommand)?;
        let rendered = build_command.join(" ");

        tracing::info!(
            "Simulator binary not found at {}. Running '{}'...",
            self.binary.display(),
            rendered
        );

        let status = Command::new(program)
            .args(args)
            .current_dir(&self.root)
            .status()
            .map_err(|source| SupervisorError::SpawnFailed {
                program: program.clone(),
                source,
            })?;

        // Ctrl-C reaches the build too, usually before the handler runs.
        if stop.load(Ordering::SeqCst) || is_interrupt_exit(exit_code(status)) {
            return Err(SupervisorError::Interrupted);
        }

        if !status.success() {
            return Err(SupervisorError::BuildFailed {
                command: rendered,
                status: status.to_string(),
            });
        }

        if !self.is_present() {
            return Err(SupervisorError::MissingAfterBuild(self.binary.clone()));
        }

        Ok(true)
    }
}

/// Whether an exit code means the process died from SIGINT.
#[cfg(unix)]
pub fn is_interrupt_exit(exit_code: i32) -> bool {
    exit_code == SIGINT_EXIT
}

/// Whether an exit code means the process died from SIGINT.
#[cfg(not(unix))]
pub fn is_interrupt_exit(_exit_code: i32) -> bool {
    false
}

/// Split a build command on whitespace into program and arguments.
pub fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(String::from).collect()
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| -signal))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
