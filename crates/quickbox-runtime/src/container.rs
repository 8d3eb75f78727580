//! The container lifecycle coordinator.
//!
//! A container owns a directory tree under the containers root: a CoW
//! mountpoint (`rootfs`), the writable upper layer (`private-data`),
//! persisted image-set metadata (`meta/`), and the rendered `config` and
//! `fstab`. Lifecycle state is derived from that tree on every probe.

use std::fs;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

use quickbox_common::error::{QbError, Result};
use quickbox_common::settings::Settings;
use quickbox_common::types::{self, CommandUser, ContainerState, SUPPORTED_USERS};
use quickbox_core::limits::ResourceLimits;
use quickbox_core::lxcconf::{self, CgroupInfo};
use quickbox_core::{cowfs, probe};
use quickbox_transport::{CommandPipe, CommandResult};

use crate::image_set::ImageSet;
use crate::{initscript, lxc, netconf};

/// A container and the host paths it owns.
#[derive(Debug)]
pub struct Container {
    name: String,
    dir: PathBuf,
    meta_dir: PathBuf,
    rootfs: PathBuf,
    private_dir: PathBuf,
    config_path: PathBuf,
    fstab_path: PathBuf,
    image_set: Option<ImageSet>,
    settings: Settings,
    /// Configuration rendered into `config` at create time.
    pub cgroup_info: CgroupInfo,
    /// Soft rlimits for the command server, when overridden.
    pub soft_limits: Option<ResourceLimits>,
    /// Hard rlimits for the command server, when overridden.
    pub hard_limits: Option<ResourceLimits>,
}

impl Container {
    fn with_image_set(name: &str, settings: Settings, image_set: Option<ImageSet>) -> Result<Self> {
        if !types::is_valid_name(name) {
            return Err(QbError::precondition(format!(
                "container name '{name}' may only contain letters, digits, dash, and underscore"
            )));
        }
        let dir = settings.containers_root.join(name);
        let rootfs = dir.join("rootfs");
        let fstab_path = dir.join("fstab");
        Ok(Self {
            cgroup_info: lxcconf::default_cgroup_info(name, &rootfs, &fstab_path),
            name: name.into(),
            meta_dir: dir.join("meta"),
            private_dir: dir.join("private-data"),
            config_path: dir.join("config"),
            rootfs,
            fstab_path,
            dir,
            image_set,
            settings,
            soft_limits: None,
            hard_limits: None,
        })
    }

    /// Creates a handle for a container derived from the default OS
    /// cache. No filesystem state is touched.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid container name.
    pub fn from_default_cache(name: &str, settings: Settings) -> Result<Self> {
        Self::with_image_set(name, settings, None)
    }

    /// Creates a handle for a container derived from an image set. No
    /// filesystem state is touched.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid container name.
    pub fn from_image_set(name: &str, settings: Settings, image_set: ImageSet) -> Result<Self> {
        Self::with_image_set(name, settings, Some(image_set))
    }

    /// Creates a handle for an existing container by reading its
    /// persisted image-set metadata.
    ///
    /// # Errors
    ///
    /// Returns a precondition error when either meta file is missing.
    pub fn from_meta(name: &str, settings: Settings) -> Result<Self> {
        let dir = settings.containers_root.join(name);
        let name_meta = dir.join("meta/image-set-name");
        let dir_meta = dir.join("meta/image-set-dir");
        if !probe::exists(&name_meta) {
            return Err(QbError::precondition(format!(
                "could not ascertain image set for container '{name}'"
            )));
        }
        let set_name = fs::read_to_string(&name_meta).map_err(|e| QbError::io(&name_meta, e))?;
        if !probe::exists(&dir_meta) {
            return Err(QbError::precondition(format!(
                "could not ascertain image set directory for container '{name}'"
            )));
        }
        let set_dir = fs::read_to_string(&dir_meta).map_err(|e| QbError::io(&dir_meta, e))?;
        let sets_root = Path::new(&set_dir)
            .parent()
            .map_or_else(|| settings.image_sets_root.clone(), Path::to_path_buf);
        let image_set = ImageSet::new(set_name, &sets_root);
        Self::with_image_set(name, settings, Some(image_set))
    }

    /// The container's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The container's directory under the containers root.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The CoW mountpoint.
    #[must_use]
    pub fn rootfs(&self) -> &Path {
        &self.rootfs
    }

    /// The rendered config path.
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// The rendered fstab path.
    #[must_use]
    pub fn fstab_path(&self) -> &Path {
        &self.fstab_path
    }

    /// The image set this container was derived from, if any.
    #[must_use]
    pub fn image_set(&self) -> Option<&ImageSet> {
        self.image_set.as_ref()
    }

    /// Prepares everything needed to run the container: the directory
    /// tree, persisted image-set metadata, the CoW mount, and the
    /// rendered config, fstab, and network files.
    ///
    /// Failures before the mount leave partial state behind; the caller
    /// removes it with [`Container::delete`].
    ///
    /// # Errors
    ///
    /// Returns a precondition error when the container already exists or
    /// its image source is missing, otherwise any mount or write error.
    pub fn create(&self) -> Result<()> {
        if probe::dir_exists(&self.dir) {
            return Err(QbError::precondition(format!(
                "cannot create container: directory '{}' already exists",
                self.dir.display()
            )));
        }
        if self.is_created() {
            return Err(QbError::precondition(
                "cannot create container: it already exists",
            ));
        }
        match &self.image_set {
            Some(set) => {
                if !set.is_created() {
                    return Err(QbError::precondition(format!(
                        "image set '{}' does not exist - cannot proceed",
                        set.name()
                    )));
                }
            }
            None => {
                if !probe::dir_exists(&self.settings.os_cache_path) {
                    return Err(QbError::precondition(format!(
                        "OS cache directory '{}' does not exist - cannot proceed",
                        self.settings.os_cache_path.display()
                    )));
                }
            }
        }

        for dir in [&self.dir, &self.rootfs, &self.meta_dir, &self.private_dir] {
            fs::DirBuilder::new()
                .mode(0o755)
                .create(dir)
                .map_err(|e| QbError::io(dir.as_path(), e))?;
        }
        if let Some(set) = &self.image_set {
            probe::write_file_with_mode(
                &self.meta_dir.join("image-set-name"),
                set.name().as_bytes(),
                0o644,
            )?;
            probe::write_file_with_mode(
                &self.meta_dir.join("image-set-dir"),
                set.dir().as_os_str().as_encoded_bytes(),
                0o644,
            )?;
        }

        self.mount()?;
        self.write_config()?;
        self.write_fstab()?;
        netconf::write_network_configuration(&self.rootfs, &self.name)?;
        tracing::info!(name = %self.name, "container created");
        Ok(())
    }

    /// Mounts the container's CoW stack: the image set (or the default
    /// cache) read-only below, `private-data` writable on top.
    ///
    /// # Errors
    ///
    /// Returns a precondition error when already mounted, or the mount
    /// failure.
    pub fn mount(&self) -> Result<()> {
        if self.is_mounted() {
            return Err(QbError::precondition(format!(
                "cannot mount container '{}': '{}' is already mounted",
                self.name,
                self.rootfs.display()
            )));
        }
        let lower = self
            .image_set
            .as_ref()
            .map_or(self.settings.os_cache_path.as_path(), ImageSet::rootfs);
        cowfs::mount(lower, &self.private_dir, &self.rootfs)
    }

    /// Restores the CoW stack to read-write after the runtime's stop
    /// left it read-only; mounts from scratch when not mounted at all.
    ///
    /// Remounting an already-mounted stack needs the image set to
    /// rebuild the mount options, so containers built from the default
    /// cache must unmount and mount instead.
    ///
    /// # Errors
    ///
    /// Returns a precondition error when mounted without an image set,
    /// or the mount failure.
    pub fn remount(&self) -> Result<()> {
        if self.is_mounted() {
            let set = self.image_set.as_ref().ok_or_else(|| {
                QbError::precondition(format!(
                    "container '{}' has no image set - remount requires one",
                    self.name
                ))
            })?;
            cowfs::remount_rw(set.rootfs(), &self.private_dir, &self.rootfs)
        } else {
            self.mount()
        }
    }

    /// Lazily detaches the container's CoW stack.
    ///
    /// # Errors
    ///
    /// Returns the unmount failure.
    pub fn unmount(&self) -> Result<()> {
        cowfs::unmount(&self.rootfs)
    }

    /// Removes the container from disk: the runtime's registry entry,
    /// the (empty) mountpoint, then the whole container directory.
    ///
    /// The mountpoint is removed non-recursively first; a still-mounted
    /// rootfs makes that fail rather than deleting through the mount.
    ///
    /// # Errors
    ///
    /// Returns a precondition error when the container does not exist,
    /// or any removal failure.
    pub fn delete(&self) -> Result<()> {
        if !self.is_created() {
            return Err(QbError::precondition(format!(
                "container to delete '{}' does not exist",
                self.name
            )));
        }
        if self.is_mounted() {
            self.unmount()?;
        }
        let registry_dir = self.settings.runtime_var_path.join(&self.name);
        if probe::exists(&registry_dir) {
            fs::remove_dir_all(&registry_dir).map_err(|e| QbError::io(&registry_dir, e))?;
        }
        fs::remove_dir(&self.rootfs).map_err(|e| QbError::io(&self.rootfs, e))?;
        fs::remove_dir_all(&self.dir).map_err(|e| QbError::io(&self.dir, e))?;
        tracing::info!(name = %self.name, "container deleted");
        Ok(())
    }

    /// Starts the container through the host runtime, first installing
    /// a fresh command pipe for every supported user. With `blocked`,
    /// waits until each user's command server answers a liveness probe.
    ///
    /// # Errors
    ///
    /// Returns a precondition error unless the container is created,
    /// mounted, and not running; otherwise any pipe, runtime, or
    /// liveness failure.
    pub fn start(&self, blocked: bool) -> Result<()> {
        if !self.is_created() {
            return Err(QbError::precondition(format!(
                "container '{}' has not yet been created",
                self.name
            )));
        }
        if !self.is_mounted() {
            return Err(QbError::precondition(format!(
                "container '{}' is not mounted",
                self.name
            )));
        }
        if self.is_running() {
            return Err(QbError::precondition(format!(
                "container '{}' is already running - cannot start",
                self.name
            )));
        }

        let pipes: Vec<CommandPipe> = SUPPORTED_USERS
            .iter()
            .map(|user| self.command_pipe_for(user))
            .collect();
        for pipe in &pipes {
            // A stale regular file at the pipe path would be fatal for
            // the transport; replace whatever is there.
            if pipe.file_exists() {
                fs::remove_file(pipe.path()).map_err(|e| QbError::io(pipe.path(), e))?;
            }
            pipe.create()?;
        }

        lxc::start(&self.name, &self.config_path)?;
        if blocked {
            for pipe in &pipes {
                pipe.wait_until_alive()?;
            }
        }
        tracing::info!(name = %self.name, blocked, "container started");
        Ok(())
    }

    /// Stops the container through the host runtime, then remounts the
    /// CoW stack regardless of the stop's outcome (the runtime is known
    /// to leave it read-only).
    ///
    /// # Errors
    ///
    /// Returns the stop failure first, else any remount failure.
    pub fn stop(&self) -> Result<()> {
        let stopped = lxc::stop(&self.name);
        tracing::info!(name = %self.name, "remounting after stop");
        let remounted = self.remount();
        stopped.and(remounted)
    }

    /// Dispatches a command into the container as `user` through that
    /// user's command pipe. With `blocked`, waits for termination and
    /// returns the captured result.
    ///
    /// # Errors
    ///
    /// Returns `NoSuchUser` for unsupported users, a precondition error
    /// when the user's home is missing from the host view of the
    /// rootfs, or any transport failure.
    pub fn execute(
        &self,
        user: &str,
        args: &[String],
        blocked: bool,
    ) -> Result<Option<CommandResult>> {
        let user = CommandUser::lookup(user)?;
        let home_dir = user.home_dir();
        let home_on_host = self.rootfs.join(home_dir.trim_start_matches('/'));
        if !probe::dir_exists(&home_on_host) {
            return Err(QbError::precondition(format!(
                "user {} home directory {} on container {} does not exist, full path {}",
                user.name,
                home_dir,
                self.name,
                home_on_host.display()
            )));
        }
        let pipe = self.command_pipe_for(&user);
        if blocked {
            pipe.execute_blocking(args).map(Some)
        } else {
            pipe.execute(args).map(|()| None)
        }
    }

    /// Returns true iff all five component paths exist.
    #[must_use]
    pub fn is_created(&self) -> bool {
        probe::dir_exists(&self.rootfs)
            && probe::dir_exists(&self.meta_dir)
            && probe::dir_exists(&self.private_dir)
            && probe::exists(&self.config_path)
            && probe::exists(&self.fstab_path)
    }

    /// Returns true iff the CoW stack is mounted, witnessed by the
    /// lower layer's `/etc` showing through the mountpoint.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        probe::dir_exists(&self.rootfs.join("etc"))
    }

    /// Returns true iff the runtime's per-container control-group
    /// directory exists.
    #[must_use]
    pub fn is_running(&self) -> bool {
        probe::dir_exists(&self.settings.cgroup_root.join(&self.name))
    }

    /// Derives the lifecycle state from the filesystem.
    #[must_use]
    pub fn state(&self) -> ContainerState {
        if self.is_running() {
            ContainerState::Running
        } else if self.is_mounted() {
            ContainerState::Mounted
        } else if self.is_created() {
            ContainerState::Created
        } else {
            ContainerState::Absent
        }
    }

    /// Renders and writes the container config, registers a copy with
    /// the host runtime, and refreshes the command-server job when
    /// resource limits are set.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfigKey` from rendering or any write failure.
    pub fn write_config(&self) -> Result<()> {
        let bytes = self.cgroup_info.render()?;
        probe::write_file_with_mode(&self.config_path, &bytes, 0o644)?;

        let registry_dir = self.settings.runtime_var_path.join(&self.name);
        fs::DirBuilder::new()
            .recursive(true)
            .mode(0o755)
            .create(&registry_dir)
            .map_err(|e| QbError::io(&registry_dir, e))?;
        probe::write_file_with_mode(&registry_dir.join("config"), &bytes, 0o644)?;

        if self.soft_limits.is_some() || self.hard_limits.is_some() {
            let args = quickbox_core::limits::iexec_args(
                self.soft_limits.as_ref(),
                self.hard_limits.as_ref(),
            );
            initscript::write_command_server_job(&self.rootfs, "web", "/home/web", &args)?;
        }
        Ok(())
    }

    /// Writes the container's mount table.
    ///
    /// # Errors
    ///
    /// Returns any write failure.
    pub fn write_fstab(&self) -> Result<()> {
        probe::write_file_with_mode(
            &self.fstab_path,
            lxcconf::fstab_contents(&self.rootfs).as_bytes(),
            0o644,
        )
    }

    /// The command-pipe endpoint for one supported user.
    fn command_pipe_for(&self, user: &CommandUser) -> CommandPipe {
        let home_on_host = self.rootfs.join(user.home_dir().trim_start_matches('/'));
        CommandPipe::for_user(
            home_on_host.join(quickbox_common::constants::COMMAND_PIPE_NAME),
            &self.rootfs,
            user.uid,
            user.gid,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_in(dir: &Path) -> Settings {
        Settings {
            containers_root: dir.join("web"),
            image_sets_root: dir.join("isx"),
            os_cache_path: dir.join("cache"),
            runtime_var_path: dir.join("var-lxc"),
            cgroup_root: dir.join("cgroup"),
        }
    }

    /// Lays the five component paths down without mounting anything.
    fn scaffold_created(container: &Container) {
        for dir in [
            container.dir(),
            container.rootfs(),
            &container.dir().join("meta"),
            &container.dir().join("private-data"),
        ] {
            fs::create_dir_all(dir).expect("mkdir");
        }
        fs::write(container.config_path(), b"").expect("config");
        fs::write(container.fstab_path(), b"").expect("fstab");
    }

    #[test]
    fn handle_lays_out_the_expected_tree() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = settings_in(dir.path());
        let container = Container::from_default_cache("web1", settings.clone()).expect("handle");

        let base = settings.containers_root.join("web1");
        assert_eq!(container.dir(), base);
        assert_eq!(container.rootfs(), base.join("rootfs"));
        assert_eq!(container.config_path(), base.join("config"));
        assert_eq!(container.fstab_path(), base.join("fstab"));
        assert!(container.image_set().is_none());
    }

    #[test]
    fn invalid_names_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Container::from_default_cache("../escape", settings_in(dir.path())).unwrap_err();
        assert!(matches!(err, QbError::Precondition { .. }));
    }

    #[test]
    fn default_config_names_the_container() {
        let dir = tempfile::tempdir().expect("tempdir");
        let container = Container::from_default_cache("web1", settings_in(dir.path())).expect("handle");
        assert_eq!(
            container.cgroup_info.get("lxc.utsname"),
            Some(&["web1".to_string()][..])
        );
    }

    #[test]
    fn state_lattice_follows_the_tree() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = settings_in(dir.path());
        let container = Container::from_default_cache("web1", settings.clone()).expect("handle");

        assert_eq!(container.state(), ContainerState::Absent);
        assert!(!container.is_created());

        scaffold_created(&container);
        assert!(container.is_created());
        assert_eq!(container.state(), ContainerState::Created);

        // The mounted witness is the lower layer's /etc showing through.
        fs::create_dir_all(container.rootfs().join("etc")).expect("etc");
        assert!(container.is_mounted());
        assert_eq!(container.state(), ContainerState::Mounted);

        fs::create_dir_all(settings.cgroup_root.join("web1")).expect("cgroup");
        assert!(container.is_running());
        assert_eq!(container.state(), ContainerState::Running);
    }

    #[test]
    fn meta_round_trip_restores_the_image_set() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = settings_in(dir.path());
        let meta_dir = settings.containers_root.join("web1/meta");
        fs::create_dir_all(&meta_dir).expect("mkdir");
        fs::write(meta_dir.join("image-set-name"), b"base").expect("name");
        fs::write(
            meta_dir.join("image-set-dir"),
            settings.image_sets_root.join("base").as_os_str().as_encoded_bytes(),
        )
        .expect("dir");

        let container = Container::from_meta("web1", settings.clone()).expect("from meta");
        let set = container.image_set().expect("image set resolved");
        assert_eq!(set.name(), "base");
        assert_eq!(set.dir(), settings.image_sets_root.join("base"));
    }

    #[test]
    fn from_meta_requires_both_meta_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Container::from_meta("web1", settings_in(dir.path())).unwrap_err();
        assert!(matches!(err, QbError::Precondition { .. }));
    }

    #[test]
    fn create_requires_a_present_image_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = settings_in(dir.path());
        fs::create_dir_all(&settings.containers_root).expect("mkdir");

        // Default cache missing.
        let container = Container::from_default_cache("web1", settings.clone()).expect("handle");
        let err = container.create().unwrap_err();
        assert!(matches!(err, QbError::Precondition { .. }));

        // Image set missing.
        let set = ImageSet::new("ghost", &settings.image_sets_root);
        let container = Container::from_image_set("web2", settings, set).expect("handle");
        let err = container.create().unwrap_err();
        assert!(matches!(err, QbError::Precondition { .. }));
    }

    #[test]
    fn create_refuses_an_existing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = settings_in(dir.path());
        fs::create_dir_all(settings.containers_root.join("web1")).expect("mkdir");
        let container = Container::from_default_cache("web1", settings).expect("handle");
        let err = container.create().unwrap_err();
        assert!(matches!(err, QbError::Precondition { .. }));
    }

    #[test]
    fn delete_removes_the_tree_and_registry_copy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = settings_in(dir.path());
        let container = Container::from_default_cache("web1", settings.clone()).expect("handle");
        scaffold_created(&container);
        fs::create_dir_all(settings.runtime_var_path.join("web1")).expect("registry");

        container.delete().expect("delete");
        assert!(!container.is_created());
        assert!(!container.dir().exists());
        assert!(!settings.runtime_var_path.join("web1").exists());
    }

    #[test]
    fn delete_requires_an_existing_container() {
        let dir = tempfile::tempdir().expect("tempdir");
        let container = Container::from_default_cache("web1", settings_in(dir.path())).expect("handle");
        let err = container.delete().unwrap_err();
        assert!(matches!(err, QbError::Precondition { .. }));
    }

    #[test]
    fn execute_rejects_unknown_users() {
        let dir = tempfile::tempdir().expect("tempdir");
        let container = Container::from_default_cache("web1", settings_in(dir.path())).expect("handle");
        let err = container
            .execute("postgres", &["/bin/true".to_string()], false)
            .unwrap_err();
        assert!(matches!(err, QbError::NoSuchUser { .. }));
    }

    #[test]
    fn execute_requires_the_home_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let container = Container::from_default_cache("web1", settings_in(dir.path())).expect("handle");
        let err = container
            .execute("web", &["/bin/true".to_string()], false)
            .unwrap_err();
        assert!(matches!(err, QbError::Precondition { .. }));
    }

    #[test]
    fn start_requires_created_and_mounted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let container = Container::from_default_cache("web1", settings_in(dir.path())).expect("handle");

        let err = container.start(false).unwrap_err();
        assert!(matches!(err, QbError::Precondition { .. }));

        scaffold_created(&container);
        // Created but not mounted.
        let err = container.start(false).unwrap_err();
        assert!(matches!(err, QbError::Precondition { .. }));
    }

    #[test]
    fn write_config_registers_a_runtime_copy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = settings_in(dir.path());
        let container = Container::from_default_cache("web1", settings.clone()).expect("handle");
        fs::create_dir_all(container.dir()).expect("mkdir");

        container.write_config().expect("write config");

        let rendered = fs::read_to_string(container.config_path()).expect("config");
        assert!(rendered.starts_with("lxc.utsname = web1\n"));
        let registered =
            fs::read_to_string(settings.runtime_var_path.join("web1/config")).expect("registry");
        assert_eq!(rendered, registered);
    }

    #[test]
    fn write_config_refreshes_the_server_job_when_limits_are_set() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut container =
            Container::from_default_cache("web1", settings_in(dir.path())).expect("handle");
        fs::create_dir_all(container.dir()).expect("mkdir");

        let mut soft = ResourceLimits::unchanged();
        soft.nproc = 64;
        container.soft_limits = Some(soft);
        container.write_config().expect("write config");

        let job = fs::read_to_string(container.rootfs().join("etc/init/qb-server-web.conf"))
            .expect("job");
        assert!(job.contains("--rlimit-nproc-soft 64"));
    }

    #[test]
    fn write_config_rejects_foreign_keys() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut container =
            Container::from_default_cache("web1", settings_in(dir.path())).expect("handle");
        container.cgroup_info.push("lxc.bogus", "1");
        let err = container.write_config().unwrap_err();
        assert!(matches!(err, QbError::InvalidConfigKey { .. }));
    }

    #[test]
    fn fstab_mentions_proc_and_sysfs_under_the_rootfs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let container = Container::from_default_cache("web1", settings_in(dir.path())).expect("handle");
        fs::create_dir_all(container.dir()).expect("mkdir");

        container.write_fstab().expect("write fstab");
        let fstab = fs::read_to_string(container.fstab_path()).expect("fstab");
        assert!(fstab.contains(&format!("proc {}/proc proc", container.rootfs().display())));
        assert!(fstab.contains("sysfs"));
    }

    #[test]
    fn remount_when_mounted_requires_an_image_set() {
        let dir = tempfile::tempdir().expect("tempdir");
        let container = Container::from_default_cache("web1", settings_in(dir.path())).expect("handle");
        // Fake the mounted witness.
        fs::create_dir_all(container.rootfs().join("etc")).expect("etc");
        let err = container.remount().unwrap_err();
        assert!(matches!(err, QbError::Precondition { .. }));
    }
}
