//! Subprocess execution for git push and Poetry invocations

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::{Error, Result};

/// Captured output of a completed command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Standard output, UTF-8 lossy
    pub stdout: String,
    /// Standard error, UTF-8 lossy
    pub stderr: String,
}

/// Run a command in the given directory, capturing output
///
/// A non-zero exit status is an error carrying the captured stderr so the
/// failure report can include the tool's own diagnostics.
pub async fn run_command(
    program: &str,
    args: &[&str],
    workdir: impl AsRef<Path>,
) -> Result<CommandOutput> {
    debug!(program, ?args, "Running command");

    let output = Command::new(program)
        .args(args)
        .current_dir(workdir.as_ref())
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!(
                    "Executable '{}' not found. Is it installed and on PATH?",
                    program
                ))
            } else {
                Error::Io(e)
            }
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    if !output.status.success() {
        return Err(Error::Command {
            program: program.to_string(),
            status: output.status.code().unwrap_or(-1),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(CommandOutput { stdout, stderr })
}
