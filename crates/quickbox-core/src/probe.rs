//! Fresh stat-based path classification and small file utilities.
//!
//! Every probe hits the filesystem; nothing is cached. Callers that need
//! a consistent view across several probes must arrange it themselves.

use std::fs;
use std::io::Read;
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt};
use std::path::Path;

use quickbox_common::error::{QbError, Result};

/// Returns true iff a file of the given pathname exists (any type).
#[must_use]
pub fn exists(path: &Path) -> bool {
    fs::metadata(path).is_ok()
}

/// Returns true iff the path exists and is a directory.
#[must_use]
pub fn dir_exists(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_dir())
}

/// Returns true iff the path exists and is a regular file.
#[must_use]
pub fn is_regular(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.is_file())
}

/// Returns true iff the path exists and is not a directory.
#[must_use]
pub fn non_dir_exists(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| !m.is_dir())
}

/// Returns true iff the path exists and is a named FIFO pipe.
#[must_use]
pub fn is_fifo(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| m.file_type().is_fifo())
}

/// Returns true iff the path exists and is a block or character device.
#[must_use]
pub fn is_device(path: &Path) -> bool {
    fs::metadata(path).is_ok_and(|m| {
        let ft = m.file_type();
        ft.is_block_device() || ft.is_char_device()
    })
}

/// Returns true iff the path itself is a symbolic link.
#[must_use]
pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

/// Returns false iff the file exists and at least one byte can be read
/// from it without error.
///
/// An unreadable file counts as empty. That conflation is relied on by
/// the running-state probe against a cgroup `tasks` file, so the
/// semantics stay as observed.
#[must_use]
pub fn is_empty_file(path: &Path) -> bool {
    let file = fs::OpenOptions::new()
        .read(true)
        .custom_flags(nix::libc::O_NONBLOCK)
        .open(path);
    let Ok(mut file) = file else {
        return true;
    };
    let mut buffer = [0u8; 1];
    match file.read(&mut buffer) {
        Ok(n) => n == 0,
        Err(_) => true,
    }
}

/// Replaces all occurrences of `old` with `new` in a text file,
/// rewriting it with its original permissions.
///
/// # Errors
///
/// Returns an error if the file cannot be read, stat'ed, or rewritten.
pub fn replace_all_in_file(path: &Path, old: &str, new: &str) -> Result<()> {
    let content = fs::read_to_string(path).map_err(|e| QbError::io(path, e))?;
    let mode = fs::metadata(path)
        .map_err(|e| QbError::io(path, e))?
        .permissions();
    let replaced = content.replace(old, new);
    fs::write(path, replaced).map_err(|e| QbError::io(path, e))?;
    fs::set_permissions(path, mode).map_err(|e| QbError::io(path, e))?;
    Ok(())
}

/// Writes a file with an explicit mode, creating parent directories.
///
/// The mode is applied after the write so it also takes effect when the
/// file already existed with different permissions.
///
/// # Errors
///
/// Returns an error if directory creation, the write, or the mode change
/// fails.
pub fn write_file_with_mode(path: &Path, contents: &[u8], mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| QbError::io(parent, e))?;
    }
    fs::write(path, contents).map_err(|e| QbError::io(path, e))?;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| QbError::io(path, e))
}

/// Changes the owner of a path to the given uid/gid pair.
///
/// # Errors
///
/// Returns an error if chown(2) fails.
pub fn chown(path: &Path, uid: u32, gid: u32) -> Result<()> {
    nix::unistd::chown(
        path,
        Some(nix::unistd::Uid::from_raw(uid)),
        Some(nix::unistd::Gid::from_raw(gid)),
    )
    .map_err(|e| QbError::sys("chown", path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probes_classify_a_regular_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("plain");
        fs::write(&path, b"x").expect("write");

        assert!(exists(&path));
        assert!(is_regular(&path));
        assert!(non_dir_exists(&path));
        assert!(!dir_exists(&path));
        assert!(!is_fifo(&path));
        assert!(!is_device(&path));
        assert!(!is_symlink(&path));
    }

    #[test]
    fn probes_classify_a_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(exists(dir.path()));
        assert!(dir_exists(dir.path()));
        assert!(!is_regular(dir.path()));
        assert!(!non_dir_exists(dir.path()));
    }

    #[test]
    fn missing_path_fails_every_probe() {
        let path = Path::new("/nonexistent/quickbox/probe");
        assert!(!exists(path));
        assert!(!dir_exists(path));
        assert!(!is_regular(path));
        assert!(!is_fifo(path));
    }

    #[test]
    fn symlink_is_detected_without_following() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("target");
        let link = dir.path().join("link");
        fs::write(&target, b"x").expect("write");
        std::os::unix::fs::symlink(&target, &link).expect("symlink");

        assert!(is_symlink(&link));
        assert!(!is_symlink(&target));
        // stat follows the link, so the regular probe sees the target.
        assert!(is_regular(&link));
    }

    #[test]
    fn empty_file_semantics() {
        let dir = tempfile::tempdir().expect("tempdir");
        let empty = dir.path().join("empty");
        let full = dir.path().join("full");
        fs::write(&empty, b"").expect("write");
        fs::write(&full, b"data").expect("write");

        assert!(is_empty_file(&empty));
        assert!(!is_empty_file(&full));
        // Unreadable counts as empty.
        assert!(is_empty_file(Path::new("/nonexistent/tasks")));
    }

    #[test]
    fn replace_all_substitutes_every_occurrence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dhclient.conf");
        fs::write(&path, "send host-name <hostname>;\n# <hostname>\n").expect("write");

        replace_all_in_file(&path, "<hostname>", "web1").expect("replace");
        let content = fs::read_to_string(&path).expect("read");
        assert_eq!(content, "send host-name web1;\n# web1\n");
    }

    #[test]
    fn replace_all_preserves_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("script");
        fs::write(&path, "<x>").expect("write");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o500)).expect("chmod");

        replace_all_in_file(&path, "<x>", "y").expect("replace");
        let mode = fs::metadata(&path).expect("stat").permissions().mode();
        assert_eq!(mode & 0o777, 0o500);
    }

    #[test]
    fn write_file_with_mode_creates_parents_and_sets_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("etc").join("init").join("job.conf");
        write_file_with_mode(&path, b"respawn\n", 0o644).expect("write");

        assert_eq!(fs::read(&path).expect("read"), b"respawn\n");
        let mode = fs::metadata(&path).expect("stat").permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn replace_all_on_missing_file_is_an_io_error() {
        let err = replace_all_in_file(Path::new("/nonexistent/f"), "a", "b").unwrap_err();
        assert!(matches!(err, QbError::Io { .. }));
    }
}
