//! Child process execution.

use crate::cancel::CancellationToken;
use crate::error::RouterError;
use crate::route::RouteResult;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Duration;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|sig| 128 + sig))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

/// Spawn the routed child bound to the caller's stdio and wait for it.
///
/// The wait polls so a cancellation can kill the child instead of detaching
/// from it.
pub(crate) fn run_child(
    route: &RouteResult,
    token: &CancellationToken,
) -> Result<i32, RouterError> {
    let mut child = Command::new(&route.executable)
        .args(&route.args)
        .current_dir(&route.workdir)
        .envs(&route.env)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| RouterError::Spawn {
            tool: route.tool.clone(),
            source,
        })?;

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let code = exit_code(status);
                debug!(tool = %route.tool, code, "child exited");
                return Ok(code);
            }
            Ok(None) => {
                if token.is_cancelled() {
                    if let Err(err) = child.kill() {
                        warn!(tool = %route.tool, error = %err, "failed to kill child");
                    }
                    let _ = child.wait();
                    return Err(RouterError::Cancelled {
                        tool: route.tool.clone(),
                    });
                }
                std::thread::sleep(POLL_INTERVAL);
            }
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RouterError::Wait {
                    tool: route.tool.clone(),
                    source,
                });
            }
        }
    }
}
