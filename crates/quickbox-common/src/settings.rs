//! Host path configuration injected into the lifecycle coordinator.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Process-wide paths, carried explicitly rather than read from globals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Root directory holding one subdirectory per container.
    pub containers_root: PathBuf,
    /// Root directory holding one subdirectory per image set.
    pub image_sets_root: PathBuf,
    /// Base-OS cache used as the lower layer when no image set is given.
    pub os_cache_path: PathBuf,
    /// The host runtime's registry of per-container config copies.
    pub runtime_var_path: PathBuf,
    /// Control-group hierarchy root used for the running-state probe.
    pub cgroup_root: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            containers_root: PathBuf::from(crate::constants::DEFAULT_CONTAINERS_ROOT),
            image_sets_root: PathBuf::from(crate::constants::DEFAULT_IMAGE_SETS_ROOT),
            os_cache_path: PathBuf::from(crate::constants::DEFAULT_OS_CACHE_PATH),
            runtime_var_path: PathBuf::from(crate::constants::DEFAULT_RUNTIME_VAR_PATH),
            cgroup_root: PathBuf::from(crate::constants::DEFAULT_CGROUP_ROOT),
        }
    }
}
