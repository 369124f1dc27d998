//! Subprocess execution utilities.
//!
//! All build-pipeline commands go through [`Executor`], which echoes the
//! command line before running it and honors dry-run mode. Probing code
//! that tolerates failure uses [`ProcessBuilder::exec`] directly.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};

use anyhow::{Context, Result};
use thiserror::Error;

/// A required external command exited with a non-zero status.
///
/// Carries the full command line so the failure can be reported exactly
/// as it was echoed.
#[derive(Debug, Error)]
#[error("command failed with exit code {code:?}: `{command}`")]
pub struct CommandFailed {
    /// The command line as echoed before execution.
    pub command: String,
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
}

/// Outcome of a single command, real or synthetic.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (0 for dry-run results).
    pub code: i32,
    /// Captured standard output, empty unless capturing was requested.
    pub stdout: String,
    /// Captured standard error, empty unless capturing was requested.
    pub stderr: String,
}

impl CommandResult {
    /// Synthetic success, used for dry-run invocations.
    fn synthetic() -> Self {
        CommandResult {
            code: 0,
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: HashMap::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Merge a map of environment overrides.
    pub fn envs(mut self, vars: &HashMap<String, String>) -> Self {
        for (key, value) in vars {
            self.env.insert(key.clone(), value.clone());
        }
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get the environment overrides.
    pub fn get_envs(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Build the Command.
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Execute with captured output, returning it regardless of exit status.
    ///
    /// Callers that tolerate failure (capability probes) inspect the
    /// status themselves.
    pub fn exec(&self) -> Result<Output> {
        let mut cmd = self.build_command();
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let child = cmd
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.program.display()))?;

        let output = child
            .wait_with_output()
            .with_context(|| format!("failed to wait for `{}`", self.program.display()))?;

        Ok(output)
    }

    /// Execute with inherited stdio and return the exit status.
    pub fn status(&self) -> Result<ExitStatus> {
        let mut cmd = self.build_command();
        let status = cmd
            .status()
            .with_context(|| format!("failed to execute `{}`", self.program.display()))?;
        Ok(status)
    }

    /// Display the command for echoing and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Runs pipeline commands, honoring dry-run mode.
///
/// Every command is echoed to stdout as `$ <command>` before execution
/// so a run is auditable. In dry-run mode nothing is executed and a
/// synthetic success is returned.
#[derive(Debug, Clone, Copy)]
pub struct Executor {
    dry_run: bool,
}

impl Executor {
    pub fn new(dry_run: bool) -> Self {
        Executor { dry_run }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run a command with inherited stdio.
    ///
    /// A non-zero exit status becomes a [`CommandFailed`] error; the
    /// caller decides whether that is fatal.
    pub fn run(&self, cmd: &ProcessBuilder) -> Result<CommandResult> {
        println!("$ {}", cmd.display_command());
        if self.dry_run {
            return Ok(CommandResult::synthetic());
        }

        let status = cmd.status()?;
        self.check(cmd, status)?;
        Ok(CommandResult {
            code: status.code().unwrap_or(0),
            stdout: String::new(),
            stderr: String::new(),
        })
    }

    /// Run a command and capture its output as text.
    pub fn capture(&self, cmd: &ProcessBuilder) -> Result<CommandResult> {
        println!("$ {}", cmd.display_command());
        if self.dry_run {
            return Ok(CommandResult::synthetic());
        }

        let output = cmd.exec()?;
        self.check(cmd, output.status)?;
        Ok(CommandResult {
            code: output.status.code().unwrap_or(0),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn check(&self, cmd: &ProcessBuilder, status: ExitStatus) -> Result<()> {
        if !status.success() {
            return Err(CommandFailed {
                command: cmd.display_command(),
                code: status.code(),
            }
            .into());
        }
        Ok(())
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}
