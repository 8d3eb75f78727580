//! Stackable copy-on-write mount management.
//!
//! Stacks a read-only lower directory (an OS rootfs) under a writable
//! upper directory at a mountpoint, giving each container a private
//! view of a shared base image.

use std::path::Path;

#[cfg(target_os = "linux")]
use quickbox_common::error::QbError;
use quickbox_common::error::Result;

/// The stackable filesystem type passed to mount(2).
pub const COW_FSTYPE: &str = "aufs";

/// Returns the mount option string stacking `upper` writable over a
/// read-only `lower`.
#[must_use]
pub fn cow_mount_options(lower: &Path, upper: &Path) -> String {
    format!("br={}=rw:{}=ro", upper.display(), lower.display())
}

/// Mounts the CoW stack at `mountpoint`.
///
/// # Errors
///
/// Returns an error carrying the raw errno if the mount syscall fails.
#[cfg(target_os = "linux")]
pub fn mount(lower: &Path, upper: &Path, mountpoint: &Path) -> Result<()> {
    let options = cow_mount_options(lower, upper);
    nix::mount::mount(
        Some(COW_FSTYPE),
        mountpoint,
        Some(COW_FSTYPE),
        nix::mount::MsFlags::empty(),
        Some(options.as_str()),
    )
    .map_err(|e| QbError::sys("mount", mountpoint, e))?;
    tracing::info!(mountpoint = %mountpoint.display(), "cow stack mounted");
    Ok(())
}

/// Remounts an existing CoW stack read-write.
///
/// The host runtime's stop leaves the stack read-only; a read-only root
/// filesystem hangs the next start unless remounted.
///
/// # Errors
///
/// Returns an error carrying the raw errno if the mount syscall fails.
#[cfg(target_os = "linux")]
pub fn remount_rw(lower: &Path, upper: &Path, mountpoint: &Path) -> Result<()> {
    let options = cow_mount_options(lower, upper);
    nix::mount::mount(
        Some(COW_FSTYPE),
        mountpoint,
        Some(COW_FSTYPE),
        nix::mount::MsFlags::MS_REMOUNT,
        Some(options.as_str()),
    )
    .map_err(|e| QbError::sys("remount", mountpoint, e))?;
    tracing::info!(mountpoint = %mountpoint.display(), "cow stack remounted read-write");
    Ok(())
}

/// Lazily detaches the CoW stack mounted at `mountpoint`.
///
/// # Errors
///
/// Returns an error carrying the raw errno if the unmount syscall fails.
#[cfg(target_os = "linux")]
pub fn unmount(mountpoint: &Path) -> Result<()> {
    nix::mount::umount2(mountpoint, nix::mount::MntFlags::MNT_DETACH)
        .map_err(|e| QbError::sys("umount2", mountpoint, e))?;
    tracing::info!(mountpoint = %mountpoint.display(), "cow stack unmounted");
    Ok(())
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — CoW stacking requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn mount(_lower: &Path, _upper: &Path, _mountpoint: &Path) -> Result<()> {
    Err(quickbox_common::error::QbError::precondition(
        "Linux required for CoW mount operations",
    ))
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — CoW stacking requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn remount_rw(_lower: &Path, _upper: &Path, _mountpoint: &Path) -> Result<()> {
    Err(quickbox_common::error::QbError::precondition(
        "Linux required for CoW mount operations",
    ))
}

/// Stub for non-Linux platforms.
///
/// # Errors
///
/// Always returns an error — CoW stacking requires Linux.
#[cfg(not(target_os = "linux"))]
pub fn unmount(_mountpoint: &Path) -> Result<()> {
    Err(quickbox_common::error::QbError::precondition(
        "Linux required for CoW mount operations",
    ))
}
