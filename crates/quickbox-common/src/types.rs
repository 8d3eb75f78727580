//! Domain primitive types used across the quickbox workspace.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QbError, Result};

/// Lifecycle state of a container.
///
/// States form a lattice: `running` implies `mounted` implies `created`.
/// The coordinator derives the state from the filesystem on every probe;
/// nothing is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerState {
    /// No trace of the container on disk.
    Absent,
    /// All five component paths (rootfs, meta, private-data, config,
    /// fstab) exist.
    Created,
    /// The CoW stack is mounted (`rootfs/etc` is visible).
    Mounted,
    /// The runtime's per-container control-group directory exists.
    Running,
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "absent"),
            Self::Created => write!(f, "created"),
            Self::Mounted => write!(f, "mounted"),
            Self::Running => write!(f, "running"),
        }
    }
}

/// An in-container user a command pipe can be bound to.
///
/// Only `root` and `web` are supported; each owns a command pipe at
/// `<home>/.cmd` inside its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandUser {
    /// The user name.
    pub name: &'static str,
    /// Numeric uid inside the container.
    pub uid: u32,
    /// Numeric gid inside the container.
    pub gid: u32,
}

/// The container superuser.
pub const ROOT_USER: CommandUser = CommandUser {
    name: "root",
    uid: 0,
    gid: 0,
};

/// The unprivileged application user.
pub const WEB_USER: CommandUser = CommandUser {
    name: "web",
    uid: 1000,
    gid: 1000,
};

/// All users a started container runs a command server for.
pub const SUPPORTED_USERS: [CommandUser; 2] = [ROOT_USER, WEB_USER];

impl CommandUser {
    /// Looks up a supported user by name.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchUser` for any name other than `root` or `web`.
    pub fn lookup(name: &str) -> Result<Self> {
        SUPPORTED_USERS
            .into_iter()
            .find(|u| u.name == name)
            .ok_or_else(|| QbError::NoSuchUser { user: name.into() })
    }

    /// Returns the user's home directory inside the container.
    #[must_use]
    pub fn home_dir(&self) -> String {
        home_dir_for(self.name)
    }
}

/// Returns the in-container home directory for a user name: `/root` for
/// root, `/home/<user>` for everyone else.
#[must_use]
pub fn home_dir_for(user: &str) -> String {
    if user == "root" {
        "/root".into()
    } else {
        format!("/home/{user}")
    }
}

/// Returns true iff `name` is a valid container or image-set name
/// (letters, digits, dash, underscore; nonempty).
#[must_use]
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
