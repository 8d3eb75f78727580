//! Image-set verbs.

use clap::Args;
use quickbox_common::settings::Settings;
use quickbox_runtime::image_set::ImageSet;

/// Arguments for verbs addressing one image set.
#[derive(Args, Debug)]
pub struct ImageSetArgs {
    /// Image set name.
    pub name: String,
}

/// Arguments for `copy-image-set`.
#[derive(Args, Debug)]
pub struct CopyImageSetArgs {
    /// Source image set name.
    pub src: String,
    /// Destination image set name.
    pub dest: String,
}

/// Executes the `create-image-set` command.
///
/// # Errors
///
/// Returns an error if materialization from the OS cache fails.
pub fn create(settings: &Settings, args: &ImageSetArgs) -> anyhow::Result<()> {
    ImageSet::new(&args.name, &settings.image_sets_root).create(&settings.os_cache_path)?;
    Ok(())
}

/// Executes the `copy-image-set` command.
///
/// # Errors
///
/// Returns an error if the copy fails.
pub fn copy(settings: &Settings, args: &CopyImageSetArgs) -> anyhow::Result<()> {
    let src = ImageSet::new(&args.src, &settings.image_sets_root);
    let dest = ImageSet::new(&args.dest, &settings.image_sets_root);
    dest.copy_from(&src)?;
    Ok(())
}

/// Executes the `delete-image-set` command.
///
/// # Errors
///
/// Returns an error if the removal fails.
pub fn delete(settings: &Settings, args: &ImageSetArgs) -> anyhow::Result<()> {
    ImageSet::new(&args.name, &settings.image_sets_root).delete()?;
    Ok(())
}

/// Executes the `trim-image-set` command.
///
/// # Errors
///
/// Returns an error if any trim step fails.
pub fn trim(settings: &Settings, args: &ImageSetArgs) -> anyhow::Result<()> {
    ImageSet::new(&args.name, &settings.image_sets_root).trim()?;
    Ok(())
}
