//! Base-OS image sets.
//!
//! An image set holds a base root filesystem (and its archive) used as
//! the read-only lower layer for any number of containers.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use quickbox_common::error::{QbError, Result};
use quickbox_core::probe;

use crate::{initscript, netconf};

/// A named base-OS root filesystem under the image-sets root.
#[derive(Debug, Clone)]
pub struct ImageSet {
    name: String,
    dir: PathBuf,
    rootfs: PathBuf,
    rootfs_archive: PathBuf,
}

impl ImageSet {
    /// Creates a handle for the image set `name` under `image_sets_root`.
    /// No filesystem state is touched.
    #[must_use]
    pub fn new(name: impl Into<String>, image_sets_root: &Path) -> Self {
        let name = name.into();
        let dir = image_sets_root.join(&name);
        Self {
            rootfs: dir.join("rootfs"),
            rootfs_archive: dir.join("rootfs.tar.gz"),
            name,
            dir,
        }
    }

    /// The image set's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The image set's directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The base root filesystem used as a CoW lower layer.
    #[must_use]
    pub fn rootfs(&self) -> &Path {
        &self.rootfs
    }

    /// The archive the rootfs was unpacked from, when present.
    #[must_use]
    pub fn rootfs_archive(&self) -> &Path {
        &self.rootfs_archive
    }

    /// Returns true iff the image set exists on the filesystem.
    #[must_use]
    pub fn is_created(&self) -> bool {
        probe::dir_exists(&self.dir)
    }

    /// Materializes the image set from a base-OS cache: copies the
    /// cache into `rootfs/`, installs command-server init jobs for both
    /// supported users, and writes the network and iptables defaults.
    ///
    /// # Errors
    ///
    /// Returns a precondition error when the set already exists or the
    /// cache is missing, otherwise any file or subprocess failure.
    pub fn create(&self, cache_path: &Path) -> Result<()> {
        if self.is_created() {
            return Err(QbError::precondition(format!(
                "image set '{}' already exists - cannot proceed",
                self.name
            )));
        }
        if !probe::dir_exists(cache_path) {
            return Err(QbError::precondition(format!(
                "cache path directory '{}' does not exist - cannot proceed",
                cache_path.display()
            )));
        }
        make_dir(&self.dir)?;
        copy_tree(cache_path, &self.rootfs)?;

        initscript::write_command_server_job(&self.rootfs, "web", "/home/web", "")?;
        initscript::write_command_server_job(&self.rootfs, "root", "/root", "")?;

        let dhcp_state = self.rootfs.join("var/lib/dhcp3");
        std::fs::create_dir_all(&dhcp_state).map_err(|e| QbError::io(&dhcp_state, e))?;
        probe::write_file_with_mode(
            &self.rootfs.join("etc/network/interfaces"),
            b"auto lo\n\
              iface lo inet loopback\n\
              auto eth0\n\
              iface eth0 inet dhcp\n",
            0o644,
        )?;
        netconf::write_iptables(&self.rootfs)?;
        tracing::info!(name = %self.name, "image set created");
        Ok(())
    }

    /// Copies an existing image set into this (not yet created) one.
    ///
    /// # Errors
    ///
    /// Returns a precondition error when the destination exists, the
    /// source is missing, or source and destination coincide.
    pub fn copy_from(&self, src: &ImageSet) -> Result<()> {
        if self.is_created() {
            return Err(QbError::precondition(format!(
                "destination image set '{}' already exists",
                self.name
            )));
        }
        if !src.is_created() {
            return Err(QbError::precondition(format!(
                "source image set '{}' does not exist - copy cannot proceed",
                src.name
            )));
        }
        if src.name == self.name || src.dir == self.dir {
            return Err(QbError::precondition(
                "source and destination image sets coincide - copy cannot proceed",
            ));
        }
        copy_tree(&src.dir, &self.dir)
    }

    /// Deletes the image set's files.
    ///
    /// Containers still referencing this set are not checked.
    ///
    /// # Errors
    ///
    /// Returns a precondition error when the set does not exist, or an
    /// I/O error from the removal.
    pub fn delete(&self) -> Result<()> {
        if !self.is_created() {
            return Err(QbError::precondition(format!(
                "image set to delete '{}' does not exist",
                self.name
            )));
        }
        std::fs::remove_dir_all(&self.dir).map_err(|e| QbError::io(&self.dir, e))
    }

    /// Strips services a container never needs, speeding up start:
    /// rewrites the init shims, removes spare ttys, quiets udev, and
    /// fixes locales inside a chroot.
    ///
    /// # Errors
    ///
    /// Returns a precondition error when the set does not exist, or any
    /// file or subprocess failure.
    pub fn trim(&self) -> Result<()> {
        if !self.is_created() {
            return Err(QbError::precondition(format!(
                "image set '{}' does not exist - cannot proceed",
                self.name
            )));
        }

        probe::write_file_with_mode(
            &self.rootfs.join("etc/init/lxc.conf"),
            b"# fake the events other services wait on at container start\n\
              description \"container startup shim\"\n\
              start on startup\n\
              script\n\
                  rm -rf /var/run/*.pid\n\
                  rm -rf /var/run/network/*\n\
                  /sbin/initctl emit stopped JOB=udevtrigger --no-wait\n\
                  /sbin/initctl emit started JOB=udev --no-wait\n\
              end script\n",
            0o544,
        )?;
        probe::write_file_with_mode(
            &self.rootfs.join("etc/init/ssh.conf"),
            b"description \"OpenSSH server\"\n\
              start on filesystem\n\
              stop on runlevel [!2345]\n\
              expect fork\n\
              respawn\n\
              respawn limit 10 5\n\
              umask 022\n\
              oom never\n\
              pre-start script\n\
                  test -x /usr/sbin/sshd || { stop; exit 0; }\n\
                  test -e /etc/ssh/sshd_not_to_be_run && { stop; exit 0; }\n\
                  test -c /dev/null || { stop; exit 0; }\n\
                  mkdir -p -m0755 /var/run/sshd\n\
              end script\n\
              exec /usr/sbin/sshd\n",
            0o544,
        )?;
        probe::write_file_with_mode(
            &self.rootfs.join("etc/init/console.conf"),
            b"description \"console getty\"\n\
              start on stopped rc RUNLEVEL=[2345]\n\
              stop on runlevel [!2345]\n\
              respawn\n\
              exec /sbin/getty -8 38400 /dev/console\n",
            0o544,
        )?;
        probe::write_file_with_mode(
            &self.rootfs.join("lib/init/fstab"),
            b"# cleared out for bare-bones container boots\n",
            0o544,
        )?;

        for tty in ["etc/init/tty5.conf", "etc/init/tty6.conf"] {
            let path = self.rootfs.join(tty);
            if probe::exists(&path) {
                if let Err(err) = std::fs::remove_file(&path) {
                    tracing::warn!(path = %path.display(), error = %err, "unable to remove tty job");
                }
            }
        }

        probe::replace_all_in_file(&self.rootfs.join("etc/udev/udev.conf"), "=\"err\"", "=0")?;
        self.run_trim_script()
    }

    /// Runs the chroot'ed shell pass: locale generation plus renaming
    /// of services that only make sense on real hardware.
    fn run_trim_script(&self) -> Result<()> {
        let script = "\
            if [ -z \"$LANG\" ]; then\n\
               locale-gen en_US.UTF-8\n\
               update-locale LANG=en_US.UTF-8\n\
            else\n\
               locale-gen $LANG\n\
               update-locale LANG=$LANG\n\
            fi\n\
            /usr/sbin/update-rc.d -f ondemand remove\n\
            cd /etc/init\n\
            for filename in u*.conf tty[2-9].conf plymouth*.conf hwclock*.conf module*.conf; do\n\
               if [ -f \"${filename}\" ]; then\n\
                  echo Disabling unnecessary service \"${filename}\"\n\
                  mv -- \"${filename}\" \"${filename}.orig\"\n\
               fi\n\
            done\n";

        let mut child = Command::new("chroot")
            .arg(&self.rootfs)
            .args(["/bin/bash", "-s"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| QbError::io("chroot", e))?;
        if let Some(stdin) = child.stdin.take() {
            let mut stdin = stdin;
            stdin
                .write_all(script.as_bytes())
                .map_err(|e| QbError::io(&self.rootfs, e))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|e| QbError::io(&self.rootfs, e))?;
        if !output.status.success() {
            tracing::error!(
                stdout = %String::from_utf8_lossy(&output.stdout),
                stderr = %String::from_utf8_lossy(&output.stderr),
                "trim script failed"
            );
            return Err(QbError::ExecFailed {
                program: "chroot".into(),
                detail: output.status.to_string(),
            });
        }
        Ok(())
    }
}

/// Creates a directory with the coordinator's customary 0o755 mode.
fn make_dir(path: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;

    std::fs::DirBuilder::new()
        .mode(0o755)
        .create(path)
        .map_err(|e| QbError::io(path, e))
}

/// Archive-grade recursive copy. `cp -a` preserves ownership, modes,
/// device nodes, and hardlinks, which a portable in-process walk would
/// not.
fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    crate::lxc::run(
        "cp",
        &[
            "-a",
            &src.display().to_string(),
            &dest.display().to_string(),
        ],
    )
}
