//! Per-user command-server init jobs.
//!
//! Each started container runs one command server per supported user,
//! supervised by the container's init system so it survives reboots and
//! is respawned with a bounded rate.

use std::path::Path;

use quickbox_common::error::Result;
use quickbox_core::probe;

/// Writes the init job that keeps a user's command server running,
/// embedding the rendered rlimit flag string into the `iexec`
/// invocation.
///
/// # Errors
///
/// Returns an error if the job file cannot be written.
pub fn write_command_server_job(
    rootfs: &Path,
    user: &str,
    home_dir: &str,
    rlimit_args: &str,
) -> Result<()> {
    let path = rootfs.join(format!("etc/init/qb-server-{user}.conf"));
    let contents = format!(
        "start on local-filesystems\n\
         console output\n\
         description \"command server for {user}\"\n\
         expect fork\n\
         respawn\n\
         respawn limit 10 5\n\
         chdir {home_dir}\n\
         script\n\
         su -l -c \"iexec{rlimit_args} -o {home_dir}/.cmd.out -e {home_dir}/.cmd.err \
         -- qb execute-server {home_dir}/.cmd\" {user}\n\
         end script\n"
    );
    probe::write_file_with_mode(&path, contents.as_bytes(), 0o644)?;
    tracing::debug!(path = %path.display(), user, "command server job written");
    Ok(())
}
