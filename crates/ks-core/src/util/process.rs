//! Process execution utilities.

use ks_types::Result;
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::process::{Command, Stdio};

/// Captured result of a finished command: stdout, exit code, stderr.
pub type Captured = (String, i32, String);

/// Execute a command synchronously.
pub fn run<S: AsRef<OsStr>>(command: impl AsRef<OsStr>, args: &[S]) -> Result<Captured> {
    run_with_env(command, args, &BTreeMap::new())
}

/// Execute a command with environment variables.
pub fn run_with_env<S: AsRef<OsStr>>(
    command: impl AsRef<OsStr>,
    args: &[S],
    env_vars: &BTreeMap<String, String>,
) -> Result<Captured> {
    let mut cmd = Command::new(command);
    cmd.args(args).stdin(Stdio::null());

    for (key, value) in env_vars {
        cmd.env(key, value);
    }

    let output = cmd.output()?;

    Ok((
        String::from_utf8_lossy(&output.stdout).to_string(),
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stderr).to_string(),
    ))
}

/// Execute a command asynchronously, feeding `input` on stdin.
pub async fn run_async_with_input<S: AsRef<OsStr>>(
    command: impl AsRef<OsStr>,
    args: &[S],
    input: &[u8],
) -> Result<Captured> {
    use tokio::io::AsyncWriteExt;

    let mut child = tokio::process::Command::new(command)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input).await?;
        // Dropping stdin closes the pipe so the child sees EOF.
    }

    let output = child.wait_with_output().await?;

    Ok((
        String::from_utf8_lossy(&output.stdout).to_string(),
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stderr).to_string(),
    ))
}
