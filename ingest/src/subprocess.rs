//! Shared runner for the external partitioner and loader binaries.

use std::process::Stdio;

use tokio::process::Command;

use crate::error::Error;

/// Run `cmd` to completion, capturing its output. Nonzero exit (or a failed
/// spawn) is reported with the tool name, exit code and captured stderr.
pub(crate) async fn run_checked(tool: &str, cmd: &mut Command) -> Result<(), Error> {
    let output = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|err| Error::Subprocess {
            tool: tool.to_owned(),
            code: None,
            stderr: err.to_string(),
        })?;

    if !output.status.success() {
        return Err(Error::Subprocess {
            tool: tool.to_owned(),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        tracing::debug!(tool, output = %stdout.trim(), "external tool finished");
    }
    Ok(())
}
