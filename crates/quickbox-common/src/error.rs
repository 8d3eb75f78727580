//! Unified error types for the quickbox workspace.
//!
//! Every component surfaces its failure kind unchanged to its caller;
//! the lifecycle coordinator does not translate transport errors into
//! its own taxonomy.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum QbError {
    /// A lifecycle or protocol precondition does not hold (container not
    /// created, not mounted, already running, home directory missing,
    /// image set absent, command pipe missing).
    #[error("precondition failed: {message}")]
    Precondition {
        /// Description of the violated precondition.
        message: String,
    },

    /// A container configuration key is outside the closed allow-list.
    #[error("invalid container configuration key: {key}")]
    InvalidConfigKey {
        /// The offending key.
        key: String,
    },

    /// A path expected to be a named pipe exists as some other file type.
    #[error("'{path}' exists but is not a named FIFO pipe - cannot proceed")]
    NotAFifo {
        /// The offending path.
        path: PathBuf,
    },

    /// A nonblocking exclusive-lock attempt would have blocked.
    #[error("command lock already held by another process")]
    LockContended,

    /// An advisory-lock operation failed for a reason other than
    /// contention, interruption, or kernel memory pressure.
    #[error("lock operation failed: {source}")]
    LockFailed {
        /// The raw errno from flock(2).
        source: nix::errno::Errno,
    },

    /// A lock acquisition was interrupted by a signal.
    #[error("interrupted")]
    Interrupted,

    /// The kernel ran out of memory for lock records.
    #[error("out of kernel memory")]
    OutOfKernelMemory,

    /// A request frame could not be written in full. The frame sentinel
    /// is still emitted on a best-effort basis so the server's frame
    /// boundary is not lost.
    #[error("failed to write command frame: {source}")]
    FrameWrite {
        /// The underlying write error.
        source: std::io::Error,
    },

    /// The in-container supervisor reported `err` on the status pipe.
    #[error("error while waiting for status on '{status_path}'")]
    Status {
        /// The status pipe that carried the failure record.
        status_path: PathBuf,
    },

    /// A command dispatched by the server failed to spawn or exited
    /// unsuccessfully. Terminates the serve loop.
    #[error("command '{program}' failed: {detail}")]
    ExecFailed {
        /// The program token of the failing frame.
        program: String,
        /// Spawn error or exit status description.
        detail: String,
    },

    /// Neither of the well-known DHCP client configuration paths exists
    /// under the container root filesystem.
    #[error(
        "neither etc/dhcp/dhclient.conf nor etc/dhcp3/dhclient.conf exist \
         under '{rootfs}' - dhclient unlikely to work"
    )]
    DhcpConfigMissing {
        /// The root filesystem that was probed.
        rootfs: PathBuf,
    },

    /// The requested in-container user is not one of the supported users.
    #[error("users other than web or root are not supported (got '{user}')")]
    NoSuchUser {
        /// The unsupported user name.
        user: String,
    },

    /// An I/O operation through the standard library failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A raw syscall failed, carrying the errno and the path involved.
    #[error("{op} failed at {path}: {source}")]
    Sys {
        /// The syscall or operation name.
        op: &'static str,
        /// Path the syscall operated on.
        path: PathBuf,
        /// The raw errno.
        source: nix::errno::Errno,
    },
}

impl QbError {
    /// Builds an I/O error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds a syscall error with operation and path context.
    #[must_use]
    pub fn sys(op: &'static str, path: impl Into<PathBuf>, source: nix::errno::Errno) -> Self {
        Self::Sys {
            op,
            path: path.into(),
            source,
        }
    }

    /// Builds a precondition failure from a display message.
    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, QbError>;
