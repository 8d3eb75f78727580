//! Server read loop: one reader per command FIFO.
//!
//! At most one server instance runs per pipe, enforced by an exclusive
//! lock on a companion `<pipe>~` file. The server reads sentinel-framed
//! requests, runs each to completion, and terminates on the first
//! command failure; control verbs steer the loop itself.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::Command;

use quickbox_common::error::{QbError, Result};
use quickbox_core::probe;

use crate::fifo::{self, CommandPipe};

impl CommandPipe {
    /// Runs the command server bound to this endpoint's FIFO.
    ///
    /// Returns `Ok(())` when an `@exit` frame is received. `@restart`
    /// releases and re-acquires the server lock; `@alive` is a no-op.
    /// Any other frame is spawned as a command; the first one that fails
    /// to spawn or exits unsuccessfully terminates the loop with an
    /// error. There is no inter-frame recovery.
    ///
    /// # Errors
    ///
    /// - `LockContended` (or a blocking wait) when another server holds
    ///   the companion lock, per `server_nonblocking`.
    /// - `NotAFifo` when the pipe path exists as another file type.
    /// - `ExecFailed` on the first failing command.
    /// - `Io` on open or read failures.
    pub fn run_server(&self) -> Result<()> {
        'acquire: loop {
            let lock_path = self.server_lock_path();
            let lock_file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&lock_path)
                .map_err(|e| QbError::io(&lock_path, e))?;
            if self.verbose {
                tracing::debug!(path = %lock_path.display(), "daemon lock: waiting");
            }
            fifo::acquire_exclusive(&lock_file, self.server_nonblocking)?;
            if self.verbose {
                tracing::debug!(path = %lock_path.display(), "daemon lock: acquired");
            }

            loop {
                if probe::exists(&self.path) {
                    if !probe::is_fifo(&self.path) {
                        return Err(QbError::NotAFifo {
                            path: self.path.clone(),
                        });
                    }
                } else {
                    fifo::mkfifo(&self.path)?;
                }

                let file = File::open(&self.path).map_err(|e| QbError::io(&self.path, e))?;
                let frames = self.read_frames(file)?;

                for frame in &frames {
                    let Some(first) = frame.first() else {
                        continue;
                    };
                    match first.as_str() {
                        crate::CTRL_EXIT => {
                            if self.verbose {
                                tracing::debug!("daemon lock: unlocking");
                            }
                            return fifo::release(&lock_file);
                        }
                        crate::CTRL_RESTART => {
                            if self.verbose {
                                tracing::debug!("daemon lock: unlocking");
                            }
                            fifo::release(&lock_file)?;
                            continue 'acquire;
                        }
                        crate::CTRL_ALIVE => {}
                        _ => self.run_frame(frame)?,
                    }
                }
            }
        }
    }

    /// The companion lock file guarding single-server ownership.
    fn server_lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push("~");
        PathBuf::from(name)
    }

    /// Reads one open's worth of the pipe into frames.
    ///
    /// Lines are buffered across short reads (pipes carry no message
    /// boundaries); the sentinel closes the current frame. Everything
    /// accumulated when EOF arrives is returned, including a trailing
    /// unterminated frame.
    fn read_frames<R: Read>(&self, source: R) -> Result<Vec<Vec<String>>> {
        let mut frames: Vec<Vec<String>> = vec![Vec::new()];
        for line in BufReader::new(source).lines() {
            let line = line.map_err(|e| QbError::io(&self.path, e))?;
            if line == crate::FRAME_SENTINEL {
                frames.push(Vec::new());
            } else if let Some(frame) = frames.last_mut() {
                frame.push(line);
            }
        }
        Ok(frames)
    }

    /// Spawns one frame's command and waits for it.
    fn run_frame(&self, frame: &[String]) -> Result<()> {
        let program = &frame[0];
        tracing::debug!(program = %program, args = ?&frame[1..], "dispatching command");
        let output = Command::new(program)
            .args(&frame[1..])
            .output()
            .map_err(|e| QbError::ExecFailed {
                program: program.clone(),
                detail: e.to_string(),
            })?;
        tracing::debug!(
            stdout = %String::from_utf8_lossy(&output.stdout),
            stderr = %String::from_utf8_lossy(&output.stderr),
            "command finished"
        );
        if !output.status.success() {
            return Err(QbError::ExecFailed {
                program: program.clone(),
                detail: output.status.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pipe() -> CommandPipe {
        CommandPipe::new("/web/c/rootfs/root/.cmd")
    }

    #[test]
    fn lock_path_appends_a_tilde() {
        assert_eq!(
            pipe().server_lock_path(),
            PathBuf::from("/web/c/rootfs/root/.cmd~")
        );
    }

    #[test]
    fn frames_split_on_the_sentinel() {
        let input = "@alive\n-*-EOFENDEOFEND-*-\niexec\n/bin/true\n-*-EOFENDEOFEND-*-\n";
        let frames = pipe().read_frames(input.as_bytes()).expect("read");
        assert_eq!(
            frames,
            vec![
                vec!["@alive".to_string()],
                vec!["iexec".to_string(), "/bin/true".to_string()],
                vec![],
            ]
        );
    }

    #[test]
    fn trailing_unterminated_frame_is_kept() {
        let input = "@alive\n-*-EOFENDEOFEND-*-\n/bin/stray\n";
        let frames = pipe().read_frames(input.as_bytes()).expect("read");
        assert_eq!(
            frames,
            vec![vec!["@alive".to_string()], vec!["/bin/stray".to_string()]]
        );
    }

    #[test]
    fn empty_input_yields_one_empty_frame() {
        let frames = pipe().read_frames(&b""[..]).expect("read");
        assert_eq!(frames, vec![Vec::<String>::new()]);
    }

    #[test]
    fn run_frame_reports_spawn_failure() {
        let frame = vec!["/nonexistent/quickbox-program".to_string()];
        let err = pipe().run_frame(&frame).unwrap_err();
        assert!(matches!(err, QbError::ExecFailed { .. }));
    }

    #[test]
    fn run_frame_reports_nonzero_exit() {
        let frame = vec!["/bin/false".to_string()];
        let err = pipe().run_frame(&frame).unwrap_err();
        match err {
            QbError::ExecFailed { program, .. } => assert_eq!(program, "/bin/false"),
            other => panic!("expected ExecFailed, got {other}"),
        }
    }

    #[test]
    fn run_frame_succeeds_for_a_true_command() {
        let frame = vec!["/bin/true".to_string()];
        pipe().run_frame(&frame).expect("true exits zero");
    }
}
