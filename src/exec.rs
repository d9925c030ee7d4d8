//! Shell command execution with a payload-derived environment

use tokio::process::Command;
use tracing::debug;

use crate::error::{HookError, Result};

/// Variables forwarded from the server's own environment. Everything else
/// the command sees comes from the payload.
const PASSTHROUGH_VARS: &[&str] = &["PATH", "HOME", "USER"];

/// Run `command` through the shell and capture combined stdout/stderr.
///
/// The command line is handed to `sh -c` whole, so pipes, quoting and
/// other shell metacharacters behave as written in the rule. The child
/// environment is exactly `env_pairs` plus `PATH`, `HOME` and `USER` from
/// the parent process.
///
/// Runs with no timeout: a hung command blocks the caller until it exits.
pub async fn run_shell(command: &str, env_pairs: &[String]) -> Result<String> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command).env_clear();

    for pair in env_pairs {
        if let Some((key, value)) = pair.split_once('=') {
            cmd.env(key, value);
        }
    }
    for key in PASSTHROUGH_VARS {
        if let Ok(value) = std::env::var(key) {
            cmd.env(key, value);
        }
    }

    debug!("spawning: sh -c '{}'", command);
    let output = cmd.output().await.map_err(|e| HookError::Execution {
        command: command.to_string(),
        reason: format!("failed to start: {}", e),
        output: String::new(),
    })?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    if output.status.success() {
        Ok(text)
    } else {
        Err(HookError::Execution {
            command: command.to_string(),
            reason: output.status.to_string(),
            output: text,
        })
    }
}
