//! Structured subprocess invocation.
//!
//! All external tools go through [`Cmd`], which builds an argument array
//! (never a shell string) and gates continuation on the exit status. Three
//! modes cover every call site:
//!
//! - [`Cmd::run`] captures output and surfaces all of it when the command
//!   fails;
//! - [`Cmd::run_interactive`] inherits stdio so long-running builds stream
//!   their progress;
//! - [`Cmd::run_quiet`] suppresses output and can treat failure as
//!   non-fatal, for best-effort invocations.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};

/// Builder for one external command invocation.
#[derive(Debug, Clone)]
pub struct Cmd {
    program: String,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    error_msg: Option<String>,
}

impl Cmd {
    pub fn new(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            cwd: None,
            error_msg: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Append a path operand without lossy string conversion.
    pub fn arg_path(mut self, path: &Path) -> Self {
        self.args.push(path.as_os_str().to_os_string());
        self
    }

    /// Run the command from `dir` instead of the caller's directory.
    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// Message prefixed to the failure report instead of the generic one.
    pub fn error_msg(mut self, msg: &str) -> Self {
        self.error_msg = Some(msg.to_string());
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        command
    }

    /// The invocation as it would read on a command line, for messages.
    fn display(&self) -> String {
        let mut rendered = self.program.clone();
        for arg in &self.args {
            rendered.push(' ');
            rendered.push_str(&arg.to_string_lossy());
        }
        rendered
    }

    fn failure_prefix(&self) -> String {
        match &self.error_msg {
            Some(msg) => msg.clone(),
            None => format!("command '{}' failed", self.display()),
        }
    }

    /// Run with captured output; on failure the full output is surfaced.
    pub fn run(&self) -> Result<()> {
        let output = self
            .command()
            .output()
            .with_context(|| format!("running '{}'", self.display()))?;

        if output.status.success() {
            return Ok(());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "{}: '{}' exited with {}\n{}\n{}",
            self.failure_prefix(),
            self.display(),
            output.status,
            stdout.trim(),
            stderr.trim()
        );
    }

    /// Run with inherited stdio so the user sees progress live.
    pub fn run_interactive(&self) -> Result<()> {
        let status = self
            .command()
            .status()
            .with_context(|| format!("running '{}'", self.display()))?;

        if !status.success() {
            bail!(
                "{}: '{}' exited with {}",
                self.failure_prefix(),
                self.display(),
                status
            );
        }
        Ok(())
    }

    /// Run with suppressed output; failure is ignored when `ignore` is set.
    pub fn run_quiet(&self, ignore: bool) -> Result<()> {
        let status = self
            .command()
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .with_context(|| format!("running '{}'", self.display()))?;

        if !status.success() && !ignore {
            bail!(
                "{}: '{}' exited with {}",
                self.failure_prefix(),
                self.display(),
                status
            );
        }
        Ok(())
    }
}
