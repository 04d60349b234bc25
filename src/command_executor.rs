//! command_executor.rs - The single point through which every system mutation happens.
//!
//! Steps describe *what* to run as a `SystemCommand`; a `CommandRunner` decides
//! *how*. The runner knows nothing about disks or packages: it starts the program,
//! waits for it, and turns a non-zero exit into `InstallerError::CommandFailed`.
//! There are no retries and no timeouts; a hung command hangs the installer.

use std::fmt;
use std::io::Read;
use std::process::{Command, ExitStatus};

use tracing::debug;

use crate::error::{InstallerError, Result};

/// An external program invocation with its exact argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl SystemCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl fmt::Display) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: fmt::Display,
    {
        self.args.extend(args.into_iter().map(|a| a.to_string()));
        self
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for SystemCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Executes system commands on behalf of the installation steps.
pub trait CommandRunner {
    /// Run to completion with the terminal attached; fail on non-zero exit.
    fn run(&mut self, command: &SystemCommand) -> Result<()>;

    /// Run to completion and return stdout and stderr as one text; fail on non-zero exit.
    fn capture(&mut self, command: &SystemCommand) -> Result<String>;

    /// Run to completion and report whether it exited successfully.
    ///
    /// Only a failure to start the program is an error.
    fn succeeds(&mut self, command: &SystemCommand) -> Result<bool>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    /// Spawn with stdout and stderr writing into the same pipe, so the text
    /// keeps the interleaving the program produced.
    fn merged_output(&self, command: &SystemCommand) -> Result<(ExitStatus, String)> {
        let (mut reader, writer) = std::io::pipe()?;

        let mut child = {
            let mut cmd = command.to_command();
            cmd.stdout(writer.try_clone()?).stderr(writer);
            cmd.spawn().map_err(|source| spawn_error(command, source))?
            // `cmd` is dropped here, closing our copies of the write end
        };

        let mut raw = Vec::new();
        reader.read_to_end(&mut raw)?;
        let status = child.wait()?;

        Ok((status, String::from_utf8_lossy(&raw).into_owned()))
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, command: &SystemCommand) -> Result<()> {
        debug!(%command, "run");
        let status = command
            .to_command()
            .status()
            .map_err(|source| spawn_error(command, source))?;
        ensure_success(command, status)
    }

    fn capture(&mut self, command: &SystemCommand) -> Result<String> {
        debug!(%command, "capture");
        let (status, output) = self.merged_output(command)?;
        ensure_success(command, status)?;
        Ok(output)
    }

    fn succeeds(&mut self, command: &SystemCommand) -> Result<bool> {
        debug!(%command, "check");
        let (status, output) = self.merged_output(command)?;
        debug!(%command, success = status.success(), output = output.trim_end(), "check finished");
        Ok(status.success())
    }
}

fn spawn_error(command: &SystemCommand, source: std::io::Error) -> InstallerError {
    InstallerError::Spawn {
        command: command.to_string(),
        source,
    }
}

fn ensure_success(command: &SystemCommand, status: ExitStatus) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(InstallerError::CommandFailed {
            command: command.to_string(),
            code: status.code(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_command_display() {
        let cmd = SystemCommand::new("parted")
            .arg("/dev/sda")
            .args(["mkpart", "root", "ext4", "321MiB", "100%"]);
        assert_eq!(cmd.to_string(), "parted /dev/sda mkpart root ext4 321MiB 100%");
        assert_eq!(cmd.args.len(), 6);
    }

    #[test]
    fn test_run_success() {
        let mut runner = SystemRunner::new();
        assert!(runner.run(&SystemCommand::new("true")).is_ok());
    }

    #[test]
    fn test_run_failure_carries_exit_code() {
        let mut runner = SystemRunner::new();
        let err = runner
            .run(&SystemCommand::new("sh").args(["-c", "exit 3"]))
            .unwrap_err();
        match err {
            InstallerError::CommandFailed { command, code } => {
                assert_eq!(command, "sh -c exit 3");
                assert_eq!(code, Some(3));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_capture_merges_stderr_into_stdout() {
        let mut runner = SystemRunner::new();
        let output = runner
            .capture(&SystemCommand::new("sh").args(["-c", "echo out; echo err >&2"]))
            .unwrap();
        assert_eq!(output, "out\nerr\n");
    }

    #[test]
    fn test_capture_failure_is_fatal() {
        let mut runner = SystemRunner::new();
        let result = runner.capture(&SystemCommand::new("sh").args(["-c", "echo partial; exit 1"]));
        assert!(matches!(result, Err(InstallerError::CommandFailed { code: Some(1), .. })));
    }

    #[test]
    fn test_succeeds_reports_status_without_failing() {
        let mut runner = SystemRunner::new();
        assert!(runner.succeeds(&SystemCommand::new("true")).unwrap());
        assert!(!runner.succeeds(&SystemCommand::new("false")).unwrap());
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let mut runner = SystemRunner::new();
        let missing = SystemCommand::new("this_binary_definitely_does_not_exist_12345");
        let result = runner.run(&missing);
        assert!(matches!(result, Err(InstallerError::Spawn { .. })));

        let result = runner.succeeds(&missing);
        assert!(matches!(result, Err(InstallerError::Spawn { .. })));
    }
}
