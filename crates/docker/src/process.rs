//! Local process execution for docker and az.

use aifabrix_common::{Error, Result};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Run a command and return (exit_code, stdout, stderr).
pub fn run_command(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<CommandOutput> {
    debug!("exec: {} {}", program, args.join(" "));

    let mut command = Command::new(program);
    command.args(args);
    if let Some(cwd) = cwd {
        command.current_dir(cwd);
    }

    let output = command.output().map_err(|e| Error::CommandExecution {
        cmd: format!("{} {}", program, args.join(" ")),
        reason: e.to_string(),
    })?;

    Ok(CommandOutput {
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Captured output of one command invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Turn a failed invocation into an error carrying its stderr.
    pub fn require_success(self, what: &str) -> Result<CommandOutput> {
        if self.success() {
            Ok(self)
        } else {
            Err(Error::CommandExecution {
                cmd: what.to_string(),
                reason: if self.stderr.trim().is_empty() {
                    format!("exit code {:?}", self.exit_code)
                } else {
                    self.stderr.trim().to_string()
                },
            })
        }
    }
}

/// Run `docker` with the given arguments.
pub fn docker(args: &[&str], cwd: Option<&Path>) -> Result<CommandOutput> {
    run_command("docker", args, cwd)
}

/// Run the Azure CLI with the given arguments.
pub fn az(args: &[&str]) -> Result<CommandOutput> {
    run_command("az", args, None)
}
