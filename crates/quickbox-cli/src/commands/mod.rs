//! CLI command definitions and dispatch.

pub mod container;
pub mod exec;
pub mod image_set;
pub mod include;

use clap::{Parser, Subcommand};
use quickbox_common::settings::Settings;

/// qb — manage containers and image sets on a CoW filesystem stack.
#[derive(Parser, Debug)]
#[command(name = "qb", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Root directory holding container trees.
    #[arg(long, global = true, default_value = quickbox_common::constants::DEFAULT_CONTAINERS_ROOT)]
    pub containers_root: String,

    /// Root directory holding image sets.
    #[arg(long, global = true, default_value = quickbox_common::constants::DEFAULT_IMAGE_SETS_ROOT)]
    pub image_sets_root: String,
}

impl Cli {
    /// Builds the coordinator settings from the global flags.
    #[must_use]
    pub fn settings(&self) -> Settings {
        Settings {
            containers_root: self.containers_root.clone().into(),
            image_sets_root: self.image_sets_root.clone().into(),
            ..Settings::default()
        }
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Prepare a new container from an image set (default cache if omitted).
    Create(container::CreateArgs),
    /// Destroy a container and its files.
    #[command(visible_alias = "delete")]
    Destroy(container::NameArgs),
    /// Mount a container's CoW stack.
    Mount(container::NameArgs),
    /// Remount a container's CoW stack read-write.
    Remount(container::NameArgs),
    /// Unmount a container's CoW stack.
    #[command(visible_alias = "umount")]
    Unmount(container::NameArgs),
    /// Start a container without waiting for its command servers.
    Start(container::NameArgs),
    /// Start a container and block until its command servers answer.
    Bstart(container::NameArgs),
    /// Stop a container and restore its CoW stack to read-write.
    Stop(container::NameArgs),
    /// Run a command in a container as a user, without waiting.
    Execute(exec::ExecuteArgs),
    /// Run a command in a container and wait for its termination.
    Bexecute(exec::ExecuteArgs),
    /// Drive a command pipe directly, without waiting.
    ExecuteClient(exec::PipeArgs),
    /// Drive a command pipe directly and wait for termination.
    ExecuteBclient(exec::PipeArgs),
    /// Drive a command pipe sharing this terminal (experimental).
    ExecuteTty(exec::PipeArgs),
    /// Run the command server bound to a FIFO.
    ExecuteServer(exec::ServerArgs),
    /// Run a batch file of qb commands.
    Include(include::IncludeArgs),
    /// Create an image set from the default OS cache.
    CreateImageSet(image_set::ImageSetArgs),
    /// Copy an image set into a new one.
    CopyImageSet(image_set::CopyImageSetArgs),
    /// Delete an image set.
    DeleteImageSet(image_set::ImageSetArgs),
    /// Strip services a container never needs from an image set.
    TrimImageSet(image_set::ImageSetArgs),
}

impl Command {
    /// The verb name used in error reporting.
    #[must_use]
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Destroy(_) => "destroy",
            Self::Mount(_) => "mount",
            Self::Remount(_) => "remount",
            Self::Unmount(_) => "unmount",
            Self::Start(_) => "start",
            Self::Bstart(_) => "bstart",
            Self::Stop(_) => "stop",
            Self::Execute(_) => "execute",
            Self::Bexecute(_) => "bexecute",
            Self::ExecuteClient(_) => "execute-client",
            Self::ExecuteBclient(_) => "execute-bclient",
            Self::ExecuteTty(_) => "execute-tty",
            Self::ExecuteServer(_) => "execute-server",
            Self::Include(_) => "include",
            Self::CreateImageSet(_) => "create-image-set",
            Self::CopyImageSet(_) => "copy-image-set",
            Self::DeleteImageSet(_) => "delete-image-set",
            Self::TrimImageSet(_) => "trim-image-set",
        }
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let settings = cli.settings();
    match cli.command {
        Command::Create(args) => container::create(&settings, &args),
        Command::Destroy(args) => container::destroy(&settings, &args),
        Command::Mount(args) => container::mount(&settings, &args),
        Command::Remount(args) => container::remount(&settings, &args),
        Command::Unmount(args) => container::unmount(&settings, &args),
        Command::Start(args) => container::start(&settings, &args, false),
        Command::Bstart(args) => container::start(&settings, &args, true),
        Command::Stop(args) => container::stop(&settings, &args),
        Command::Execute(args) => exec::execute(&settings, &args, false),
        Command::Bexecute(args) => exec::execute(&settings, &args, true),
        Command::ExecuteClient(args) => exec::execute_client(&args),
        Command::ExecuteBclient(args) => exec::execute_bclient(&args),
        Command::ExecuteTty(args) => exec::execute_tty(&args),
        Command::ExecuteServer(args) => exec::execute_server(&args),
        Command::Include(args) => include::run(&args),
        Command::CreateImageSet(args) => image_set::create(&settings, &args),
        Command::CopyImageSet(args) => image_set::copy(&settings, &args),
        Command::DeleteImageSet(args) => image_set::delete(&settings, &args),
        Command::TrimImageSet(args) => image_set::trim(&settings, &args),
    }
}
