use crate::error::PlaysyncError;
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Output, Stdio};
use tokio::process::Command;

/// Runs a tool to completion with stdin closed and both output streams
/// captured. A non-zero exit status is reported as [`PlaysyncError::ToolFailed`].
pub async fn run_tool<I, S>(tool: &str, binary: &Path, args: I) -> Result<Output, PlaysyncError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(binary);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    tracing::debug!(tool, command = ?command.as_std(), "Spawning");

    let output = command
        .output()
        .await
        .map_err(|e| PlaysyncError::ToolNotFound {
            tool: tool.to_string(),
            reason: format!("failed to spawn {}: {}", binary.display(), e),
        })?;

    if !output.status.success() {
        return Err(PlaysyncError::ToolFailed {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}
