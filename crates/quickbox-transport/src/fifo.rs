//! Command-pipe endpoints and their lock discipline.

use std::fs::File;
use std::io::Read;
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::{flock, FlockArg};
use quickbox_common::error::{QbError, Result};
use quickbox_core::probe;

/// One endpoint of the command transport: a named-pipe path plus the
/// ownership and blocking policy applied to it.
///
/// The same value describes both sides; the client-side entry points
/// live in [`crate::client`] and the server loop in [`crate::server`].
pub struct CommandPipe {
    pub(crate) path: PathBuf,
    pub(crate) uid: u32,
    pub(crate) gid: u32,
    /// Prefix replacing `/` in container paths when viewed from the
    /// host, normally the container rootfs.
    pub(crate) client_prefix: PathBuf,
    /// When true, lock transitions are logged.
    pub verbose: bool,
    /// When true, the server errors instead of waiting for its lock.
    pub server_nonblocking: bool,
    /// When true, the client errors with `LockContended` instead of
    /// waiting for the frame lock.
    pub client_nonblocking: bool,
    /// Experimental: share the client's TTY with the spawned command.
    /// Currently carried but not acted on.
    pub tty_share: bool,
}

impl CommandPipe {
    /// Creates a root-owned endpoint whose container paths are host
    /// paths (prefix `/`).
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::for_user(path, "/", 0, 0)
    }

    /// Creates an endpoint owned by a specific uid/gid whose container
    /// paths are resolved under `client_prefix` on the host.
    #[must_use]
    pub fn for_user(
        path: impl Into<PathBuf>,
        client_prefix: impl Into<PathBuf>,
        uid: u32,
        gid: u32,
    ) -> Self {
        Self {
            path: path.into(),
            uid,
            gid,
            client_prefix: client_prefix.into(),
            verbose: true,
            server_nonblocking: true,
            client_nonblocking: false,
            tty_share: false,
        }
    }

    /// The named-pipe path of this endpoint.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the FIFO and hands ownership to the endpoint's uid/gid.
    ///
    /// # Errors
    ///
    /// Returns an error if mkfifo(2) or chown(2) fails.
    pub fn create(&self) -> Result<()> {
        mkfifo(&self.path)?;
        probe::chown(&self.path, self.uid, self.gid)
    }

    /// Returns true iff the pipe path exists and is a FIFO.
    #[must_use]
    pub fn exists(&self) -> bool {
        probe::exists(&self.path) && probe::is_fifo(&self.path)
    }

    /// Returns true iff anything exists at the pipe path, FIFO or not.
    #[must_use]
    pub fn file_exists(&self) -> bool {
        probe::exists(&self.path)
    }

    /// Drains any bytes sitting in the pipe without blocking.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipe cannot be opened or a read fails for
    /// a reason other than an empty pipe.
    pub fn flush(&self) -> Result<()> {
        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .custom_flags(nix::libc::O_NONBLOCK)
            .open(&self.path)
            .map_err(|e| QbError::io(&self.path, e))?;
        let mut buffer = [0u8; 1024];
        loop {
            match file.read(&mut buffer) {
                Ok(0) => return Ok(()),
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(QbError::io(&self.path, e)),
            }
        }
    }

    /// Fails unless the pipe path holds an actual FIFO: a different file
    /// type is a fatal misconfiguration, a missing file means there is
    /// no server to talk to.
    pub(crate) fn require_fifo(&self) -> Result<()> {
        if self.file_exists() {
            if !probe::is_fifo(&self.path) {
                return Err(QbError::NotAFifo {
                    path: self.path.clone(),
                });
            }
            Ok(())
        } else {
            Err(QbError::precondition(format!(
                "'{}' does not exist - cannot proceed",
                self.path.display()
            )))
        }
    }
}

/// Creates a named pipe with the transport's customary 0o660 mode.
pub(crate) fn mkfifo(path: &Path) -> Result<()> {
    nix::unistd::mkfifo(path, nix::sys::stat::Mode::from_bits_truncate(0o660))
        .map_err(|e| QbError::sys("mkfifo", path, e))
}

/// Acquires an exclusive advisory lock on an open file.
///
/// Nonblocking contention maps to `LockContended`; a blocking caller
/// retries on `EWOULDBLOCK` (which flock(2) should not deliver without
/// `LOCK_NB`, but the retry costs nothing). `EINTR` and `ENOLCK` get
/// their own kinds; everything else is `LockFailed`.
pub(crate) fn acquire_exclusive(file: &File, nonblocking: bool) -> Result<()> {
    loop {
        let arg = if nonblocking {
            FlockArg::LockExclusiveNonblock
        } else {
            FlockArg::LockExclusive
        };
        match flock(file.as_raw_fd(), arg) {
            Ok(()) => return Ok(()),
            Err(Errno::EWOULDBLOCK) if nonblocking => return Err(QbError::LockContended),
            Err(Errno::EWOULDBLOCK) => {}
            Err(Errno::EINTR) => return Err(QbError::Interrupted),
            Err(Errno::ENOLCK) => return Err(QbError::OutOfKernelMemory),
            Err(e) => return Err(QbError::LockFailed { source: e }),
        }
    }
}

/// Releases an advisory lock held on an open file.
pub(crate) fn release(file: &File) -> Result<()> {
    flock(file.as_raw_fd(), FlockArg::Unlock).map_err(|e| QbError::LockFailed { source: e })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned_by_me(path: &Path) -> CommandPipe {
        CommandPipe::for_user(
            path,
            "/",
            nix::unistd::getuid().as_raw(),
            nix::unistd::getgid().as_raw(),
        )
    }

    #[test]
    fn create_makes_a_fifo() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pipe = owned_by_me(&dir.path().join("cmd"));
        pipe.create().expect("create");
        assert!(pipe.exists());
        assert!(pipe.file_exists());
    }

    #[test]
    fn exists_rejects_a_regular_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cmd");
        std::fs::write(&path, b"not a pipe").expect("write");

        let pipe = owned_by_me(&path);
        assert!(!pipe.exists());
        assert!(pipe.file_exists());
        let err = pipe.require_fifo().unwrap_err();
        assert!(matches!(err, QbError::NotAFifo { .. }));
    }

    #[test]
    fn require_fifo_on_missing_path_is_a_precondition() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pipe = owned_by_me(&dir.path().join("absent"));
        let err = pipe.require_fifo().unwrap_err();
        assert!(matches!(err, QbError::Precondition { .. }));
    }

    #[test]
    fn flush_drains_an_idle_pipe() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pipe = owned_by_me(&dir.path().join("cmd"));
        pipe.create().expect("create");
        // No writers: the nonblocking drain sees EOF immediately.
        pipe.flush().expect("flush");
    }

    #[test]
    fn flush_requires_the_pipe_to_exist() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pipe = owned_by_me(&dir.path().join("absent"));
        let err = pipe.flush().unwrap_err();
        assert!(matches!(err, QbError::Io { .. }));
    }

    #[test]
    fn defaults_match_the_root_endpoint() {
        let pipe = CommandPipe::new("/web/a/rootfs/root/.cmd");
        assert!(pipe.verbose);
        assert!(pipe.server_nonblocking);
        assert!(!pipe.client_nonblocking);
        assert!(!pipe.tty_share);
    }
}
