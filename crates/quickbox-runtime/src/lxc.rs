//! Invocation of the host's userspace container runtime.

use std::path::Path;
use std::process::Command;

use quickbox_common::error::{QbError, Result};

/// Starts a container daemonized against its rendered config file.
///
/// # Errors
///
/// Returns an error if the runtime binary cannot be spawned or reports
/// failure.
pub fn start(name: &str, config: &Path) -> Result<()> {
    run(
        "lxc-start",
        &["-n", name, "-d", "-f", &config.display().to_string()],
    )
}

/// Stops a container by name.
///
/// # Errors
///
/// Returns an error if the runtime binary cannot be spawned or reports
/// failure.
pub fn stop(name: &str) -> Result<()> {
    run("lxc-stop", &["-n", name])
}

/// Runs a host binary to completion, logging its output on failure.
pub(crate) fn run(program: &str, args: &[&str]) -> Result<()> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| QbError::io(program, e))?;
    if !output.status.success() {
        tracing::error!(
            program,
            ?args,
            stdout = %String::from_utf8_lossy(&output.stdout),
            stderr = %String::from_utf8_lossy(&output.stderr),
            "host command failed"
        );
        return Err(QbError::ExecFailed {
            program: program.into(),
            detail: output.status.to_string(),
        });
    }
    Ok(())
}
