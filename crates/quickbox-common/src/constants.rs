//! System-wide constants and default host paths.

/// Default root directory for container trees.
pub const DEFAULT_CONTAINERS_ROOT: &str = "/web";

/// Default root directory for image sets.
pub const DEFAULT_IMAGE_SETS_ROOT: &str = "/isx";

/// Default base-OS cache used when a container has no image set.
pub const DEFAULT_OS_CACHE_PATH: &str = "/var/cache/lxc/oneiric/rootfs-amd64";

/// Directory where the host runtime expects per-container config copies.
pub const DEFAULT_RUNTIME_VAR_PATH: &str = "/usr/local/var/lib/lxc";

/// Control-group hierarchy whose per-container directory witnesses the
/// running state.
pub const DEFAULT_CGROUP_ROOT: &str = "/cgroup/lxc";

/// File name of the per-user command pipe inside a home directory.
pub const COMMAND_PIPE_NAME: &str = ".cmd";

/// Application name used in logs.
pub const APP_NAME: &str = "quickbox";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "qb";
