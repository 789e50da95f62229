//! Command-line construction and execution.

use std::fmt;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("command '{command}' exited with {status}")]
    Failed { command: String, status: String },
    #[error("command '{command}' exited with {status}: {stderr}")]
    CaptureFailed {
        command: String,
        status: String,
        stderr: String,
    },
}

/// A fully constructed external command line.
///
/// Commands are built as argument vectors (never passed through a shell)
/// and rendered back to a readable string for the `[EXECUTE]` /
/// `[DRY-RUN]` echo lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CmdLine {
    program: String,
    args: Vec<String>,
}

impl CmdLine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn argv(&self) -> &[String] {
        &self.args
    }

    fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }
}

impl fmt::Display for CmdLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " \"{arg}\"")?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Executes command lines sequentially, honouring `--dry-run`.
///
/// Every gated command is echoed to stdout before it runs. Probes
/// (read-only queries whose output steers the flow) always execute,
/// even during a dry run.
#[derive(Debug, Clone, Copy)]
pub struct Runner {
    dry_run: bool,
}

impl Runner {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run a command with inherited stdio, failing on non-zero exit.
    ///
    /// Under dry-run the command is echoed and skipped.
    pub async fn run(&self, cmd: &CmdLine) -> Result<(), ExecError> {
        if self.dry_run {
            println!("[DRY-RUN] {cmd}");
            return Ok(());
        }

        println!("[EXECUTE] {cmd}");

        let status = cmd
            .to_command()
            .status()
            .await
            .map_err(|source| ExecError::Spawn {
                command: cmd.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(ExecError::Failed {
                command: cmd.to_string(),
                status: status.to_string(),
            });
        }

        Ok(())
    }

    /// Run a command, returning its trimmed stdout.
    ///
    /// Not dry-run gated: callers that must not capture during a dry run
    /// echo the command line and substitute a placeholder themselves.
    pub async fn capture(&self, cmd: &CmdLine) -> Result<String, ExecError> {
        println!("[EXECUTE] {cmd}");

        let output = cmd
            .to_command()
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ExecError::Spawn {
                command: cmd.to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExecError::CaptureFailed {
                command: cmd.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run a read-only probe, returning trimmed stdout regardless of
    /// dry-run mode. Probe failures surface the exit status but not as a
    /// hard error; the caller decides what an empty result means.
    pub async fn probe(&self, cmd: &CmdLine) -> Result<String, ExecError> {
        let output = cmd
            .to_command()
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ExecError::Spawn {
                command: cmd.to_string(),
                source,
            })?;

        if !output.status.success() {
            tracing::debug!(
                command = %cmd,
                status = %output.status,
                "probe exited non-zero"
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Run a command, collecting combined stdout and stderr along with
    /// whether it succeeded. Used where a tool signals its real result
    /// through stderr text (the AWS credential preflight).
    pub async fn probe_combined(&self, cmd: &CmdLine) -> Result<(bool, String), ExecError> {
        let output = cmd
            .to_command()
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| ExecError::Spawn {
                command: cmd.to_string(),
                source,
            })?;

        let mut text = String::from_utf8_lossy(&output.stdout).to_string();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok((output.status.success(), text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmdline_display_plain() {
        let cmd = CmdLine::new("gcloud")
            .args(["config", "set", "project"])
            .arg("my-project");
        assert_eq!(cmd.to_string(), "gcloud config set project my-project");
    }

    #[test]
    fn test_cmdline_display_quotes_whitespace() {
        let cmd = CmdLine::new("ssh").arg("host").arg("kill_all_nodes --force");
        assert_eq!(cmd.to_string(), "ssh host \"kill_all_nodes --force\"");
    }

    #[test]
    fn test_cmdline_display_quotes_empty_arg() {
        let cmd = CmdLine::new("ssh-keygen").args(["-N", ""]);
        assert_eq!(cmd.to_string(), "ssh-keygen -N \"\"");
    }

    #[tokio::test]
    async fn test_dry_run_skips_execution() {
        let runner = Runner::new(true);
        // Would fail if actually spawned
        let cmd = CmdLine::new("definitely-not-a-real-binary").arg("boom");
        runner.run(&cmd).await.unwrap();
    }

    #[tokio::test]
    async fn test_run_reports_spawn_failure() {
        let runner = Runner::new(false);
        let cmd = CmdLine::new("definitely-not-a-real-binary");
        let err = runner.run(&cmd).await.unwrap_err();
        assert!(matches!(err, ExecError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_capture_trims_stdout() {
        let runner = Runner::new(false);
        let cmd = CmdLine::new("echo").arg("34.89.12.7");
        let out = runner.capture(&cmd).await.unwrap();
        assert_eq!(out, "34.89.12.7");
    }

    #[tokio::test]
    async fn test_probe_runs_during_dry_run() {
        let runner = Runner::new(true);
        let cmd = CmdLine::new("echo").arg("active-account");
        let out = runner.probe(&cmd).await.unwrap();
        assert_eq!(out, "active-account");
    }

    #[tokio::test]
    async fn test_probe_combined_reports_failure() {
        let runner = Runner::new(false);
        let cmd = CmdLine::new("ls").arg("/definitely/not/a/path");
        let (ok, text) = runner.probe_combined(&cmd).await.unwrap();
        assert!(!ok);
        assert!(!text.is_empty());
    }
}
