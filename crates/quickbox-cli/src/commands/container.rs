//! Container lifecycle verbs.

use clap::Args;
use quickbox_common::settings::Settings;
use quickbox_runtime::container::Container;
use quickbox_runtime::image_set::ImageSet;

/// Arguments for `create`.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Container name.
    pub name: String,
    /// Image set to derive from; the default OS cache when omitted.
    pub image_set: Option<String>,
}

/// Arguments for verbs addressing one container by name.
#[derive(Args, Debug)]
pub struct NameArgs {
    /// Container name.
    pub name: String,
}

/// Executes the `create` command.
///
/// # Errors
///
/// Returns an error if the container cannot be created.
pub fn create(settings: &Settings, args: &CreateArgs) -> anyhow::Result<()> {
    tracing::info!(name = %args.name, image_set = ?args.image_set, "creating container");
    let container = match &args.image_set {
        Some(set_name) => {
            let set = ImageSet::new(set_name, &settings.image_sets_root);
            Container::from_image_set(&args.name, settings.clone(), set)?
        }
        None => Container::from_default_cache(&args.name, settings.clone())?,
    };
    container.create()?;
    Ok(())
}

/// Executes the `destroy` command.
///
/// # Errors
///
/// Returns an error if the container cannot be deleted.
pub fn destroy(settings: &Settings, args: &NameArgs) -> anyhow::Result<()> {
    Container::from_meta(&args.name, settings.clone())?.delete()?;
    Ok(())
}

/// Executes the `mount` command.
///
/// # Errors
///
/// Returns an error if the CoW stack cannot be mounted.
pub fn mount(settings: &Settings, args: &NameArgs) -> anyhow::Result<()> {
    Container::from_meta(&args.name, settings.clone())?.mount()?;
    Ok(())
}

/// Executes the `remount` command.
///
/// # Errors
///
/// Returns an error if the CoW stack cannot be remounted.
pub fn remount(settings: &Settings, args: &NameArgs) -> anyhow::Result<()> {
    Container::from_meta(&args.name, settings.clone())?.remount()?;
    Ok(())
}

/// Executes the `unmount` command.
///
/// # Errors
///
/// Returns an error if the CoW stack cannot be detached.
pub fn unmount(settings: &Settings, args: &NameArgs) -> anyhow::Result<()> {
    Container::from_meta(&args.name, settings.clone())?.unmount()?;
    Ok(())
}

/// Executes the `start` and `bstart` commands.
///
/// # Errors
///
/// Returns an error if the container cannot be started (or, with
/// `blocked`, if a command server never answers).
pub fn start(settings: &Settings, args: &NameArgs, blocked: bool) -> anyhow::Result<()> {
    Container::from_meta(&args.name, settings.clone())?.start(blocked)?;
    Ok(())
}

/// Executes the `stop` command.
///
/// # Errors
///
/// Returns an error if the runtime stop or the follow-up remount fails.
pub fn stop(settings: &Settings, args: &NameArgs) -> anyhow::Result<()> {
    Container::from_meta(&args.name, settings.clone())?.stop()?;
    Ok(())
}
