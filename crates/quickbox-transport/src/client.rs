//! Client write path: framed requests under an exclusive advisory lock.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use quickbox_common::error::{QbError, Result};
use quickbox_core::probe;

use crate::fifo::{self, CommandPipe};
use crate::status::{self, CommandResult, StatusFiles};

/// How a request's termination is observed.
///
/// `FireAndForget` writes the frame and returns; no status pipe is
/// allocated. `AwaitWithCapture` allocates a status FIFO (plus optional
/// capture files), and either runs the status reader on the calling
/// thread (`block`) or spawns it, routing failures to `on_error`.
pub enum Reporting {
    /// No termination reporting.
    FireAndForget,
    /// Report termination through a status FIFO.
    AwaitWithCapture {
        /// Collect standard output into a capture file.
        want_stdout: bool,
        /// Collect standard error into a capture file.
        want_stderr: bool,
        /// Run the status reader synchronously on the calling thread.
        block: bool,
        /// Invoked with the populated result on successful termination.
        on_terminate: Box<dyn FnOnce(CommandResult) + Send>,
        /// Invoked with the failure when a spawned status reader errors.
        on_error: Box<dyn FnOnce(QbError) + Send>,
    },
}

/// Host-side status artifacts plus their in-container names.
struct StatusArtifacts {
    files: StatusFiles,
    container_status: PathBuf,
    container_stdout: Option<PathBuf>,
    container_stderr: Option<PathBuf>,
}

impl CommandPipe {
    /// Sends one request frame to the server.
    ///
    /// The frame is written under an exclusive advisory lock on the
    /// command FIFO, so concurrent clients never interleave tokens.
    /// Ordering across frames follows lock hand-off order; the client
    /// never retries a frame on its own.
    ///
    /// # Errors
    ///
    /// - `PreconditionFailed` / `NotAFifo` when the pipe is missing or
    ///   the wrong file type.
    /// - `LockContended` when `client_nonblocking` is set and the lock
    ///   is held elsewhere; `Interrupted`, `OutOfKernelMemory`, or
    ///   `LockFailed` on other lock failures.
    /// - `FrameWrite` when the frame could not be fully written (the
    ///   sentinel is still attempted).
    /// - Any status-reader error when `block` was requested.
    pub fn send(&self, args: &[String], reporting: Reporting) -> Result<()> {
        let Some(first) = args.first() else {
            return Err(QbError::precondition("cannot send an empty command"));
        };
        let awaited = match reporting {
            Reporting::FireAndForget => None,
            Reporting::AwaitWithCapture {
                want_stdout,
                want_stderr,
                block,
                on_terminate,
                on_error,
            } => Some((
                self.allocate_status_artifacts(want_stdout, want_stderr)?,
                block,
                on_terminate,
                on_error,
            )),
        };

        self.require_fifo()?;
        let mut file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|e| QbError::io(&self.path, e))?;
        if self.verbose {
            tracing::debug!(path = %self.path.display(), "command lock: waiting");
        }
        fifo::acquire_exclusive(&file, self.client_nonblocking)?;
        if self.verbose {
            tracing::debug!(path = %self.path.display(), "command lock: acquired");
        }

        let tokens = self.frame_tokens(first, args, awaited.as_ref().map(|(a, ..)| a));
        let frame_written = write_frame(&mut file, &tokens);
        fifo::release(&file)?;
        drop(file);
        if self.verbose {
            tracing::debug!(path = %self.path.display(), "command lock: released");
        }
        frame_written?;

        if let Some((artifacts, block, on_terminate, on_error)) = awaited {
            let files = artifacts.files;
            if block {
                status::wait_until_done(&files, on_terminate)?;
            } else {
                let _ = std::thread::spawn(move || {
                    if let Err(err) = status::wait_until_done(&files, on_terminate) {
                        on_error(err);
                    }
                });
            }
        }
        Ok(())
    }

    /// Runs a command on the server without waiting for termination.
    ///
    /// # Errors
    ///
    /// Returns any frame-dispatch error from [`CommandPipe::send`].
    pub fn execute(&self, args: &[String]) -> Result<()> {
        self.send(args, Reporting::FireAndForget)
    }

    /// Runs a command on the server and blocks until it terminates,
    /// returning the captured output and exit information.
    ///
    /// # Errors
    ///
    /// Returns any frame-dispatch or status-reader error.
    pub fn execute_blocking(&self, args: &[String]) -> Result<CommandResult> {
        let store: Arc<Mutex<Option<CommandResult>>> = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&store);
        self.send(
            args,
            Reporting::AwaitWithCapture {
                want_stdout: true,
                want_stderr: true,
                block: true,
                on_terminate: Box::new(move |result| {
                    *sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(result);
                }),
                on_error: Box::new(|err| {
                    tracing::error!(error = %err, "status reader failed");
                }),
            },
        )?;
        let result = store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        result.ok_or_else(|| QbError::precondition("status reader produced no result"))
    }

    /// Asks the command server to exit.
    ///
    /// # Errors
    ///
    /// Returns any frame-dispatch error.
    pub fn request_shutdown(&self) -> Result<()> {
        self.execute(&[crate::CTRL_EXIT.to_string()])
    }

    /// Asks the command server to release and re-acquire its lock.
    ///
    /// # Errors
    ///
    /// Returns any frame-dispatch error.
    pub fn request_restart(&self) -> Result<()> {
        self.execute(&[crate::CTRL_RESTART.to_string()])
    }

    /// Blocks until the command server accepts a no-op frame.
    ///
    /// # Errors
    ///
    /// Returns any frame-dispatch error.
    pub fn wait_until_alive(&self) -> Result<()> {
        self.execute(&[crate::CTRL_ALIVE.to_string()])
    }

    /// Allocates the per-request temporary directory, status FIFO, and
    /// capture files, handing each to the endpoint's uid/gid.
    fn allocate_status_artifacts(
        &self,
        want_stdout: bool,
        want_stderr: bool,
    ) -> Result<StatusArtifacts> {
        let base = self.client_prefix.join("tmp");
        let tmp_dir = tempfile::Builder::new()
            .prefix("iexec")
            .tempdir_in(&base)
            .map_err(|e| QbError::io(&base, e))?
            .into_path();
        probe::chown(&tmp_dir, self.uid, self.gid)?;

        let status = tmp_dir.join("status");
        fifo::mkfifo(&status)?;
        probe::chown(&status, self.uid, self.gid)?;

        let make_capture = |name: &str, want: bool| -> Result<Option<PathBuf>> {
            if !want {
                return Ok(None);
            }
            let path = tmp_dir.join(name);
            drop(File::create(&path).map_err(|e| QbError::io(&path, e))?);
            probe::chown(&path, self.uid, self.gid)?;
            Ok(Some(path))
        };
        let stdout = make_capture("stdout", want_stdout)?;
        let stderr = make_capture("stderr", want_stderr)?;

        Ok(StatusArtifacts {
            container_status: self.container_path(&status),
            container_stdout: stdout.as_deref().map(|p| self.container_path(p)),
            container_stderr: stderr.as_deref().map(|p| self.container_path(p)),
            files: StatusFiles {
                status,
                stdout,
                stderr,
            },
        })
    }

    /// Rewrites a host path into its in-container name by replacing the
    /// client prefix with `/`.
    fn container_path(&self, host: &Path) -> PathBuf {
        match host.strip_prefix(&self.client_prefix) {
            Ok(rel) => Path::new("/").join(rel),
            Err(_) => host.to_path_buf(),
        }
    }

    /// Assembles the frame tokens: the `iexec` header (with status and
    /// capture filenames when present) for ordinary requests, nothing
    /// extra for control verbs.
    fn frame_tokens(
        &self,
        first: &str,
        args: &[String],
        artifacts: Option<&StatusArtifacts>,
    ) -> Vec<String> {
        let mut tokens = Vec::with_capacity(args.len() + 8);
        if !crate::is_control_verb(first) {
            tokens.push(crate::EXEC_HELPER.to_string());
            if let Some(art) = artifacts {
                tokens.push("-s".into());
                tokens.push(art.container_status.display().to_string());
                if let Some(path) = &art.container_stdout {
                    tokens.push("-o".into());
                    tokens.push(path.display().to_string());
                }
                if let Some(path) = &art.container_stderr {
                    tokens.push("-e".into());
                    tokens.push(path.display().to_string());
                }
                tokens.push("--".into());
            }
        }
        tokens.extend(args.iter().cloned());
        tokens
    }
}

/// Writes one frame: each token on its own line, then the sentinel.
///
/// A failed token write still attempts the sentinel so the server's
/// frame boundary survives, then reports `FrameWrite`.
fn write_frame<W: Write>(writer: &mut W, tokens: &[String]) -> Result<()> {
    for token in tokens {
        if let Err(e) = writeln!(writer, "{token}") {
            let _ = writeln!(writer, "{}", crate::FRAME_SENTINEL);
            return Err(QbError::FrameWrite { source: e });
        }
    }
    writeln!(writer, "{}", crate::FRAME_SENTINEL).map_err(|e| QbError::FrameWrite { source: e })
}
