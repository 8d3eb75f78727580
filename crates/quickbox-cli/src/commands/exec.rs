//! Command dispatch verbs: into containers and onto raw pipes.

use clap::Args;
use quickbox_common::settings::Settings;
use quickbox_runtime::container::Container;
use quickbox_transport::CommandPipe;

use crate::output;

/// Arguments for `execute` and `bexecute`.
#[derive(Args, Debug)]
pub struct ExecuteArgs {
    /// Container name.
    pub name: String,
    /// In-container user to run as (`root` or `web`).
    pub user: String,
    /// Command and arguments.
    #[arg(trailing_var_arg = true, required = true)]
    pub command: Vec<String>,
}

/// Arguments for the raw pipe clients.
#[derive(Args, Debug)]
pub struct PipeArgs {
    /// Path of the command FIFO.
    pub pipe: String,
    /// Command and arguments.
    #[arg(trailing_var_arg = true, required = true)]
    pub command: Vec<String>,
}

/// Arguments for `execute-server`.
#[derive(Args, Debug)]
pub struct ServerArgs {
    /// Path of the command FIFO to serve.
    pub pipe: String,
}

/// Executes the `execute` and `bexecute` commands.
///
/// # Errors
///
/// Returns an error if the user is unsupported, the container is
/// unusable, or the dispatch fails.
pub fn execute(settings: &Settings, args: &ExecuteArgs, blocked: bool) -> anyhow::Result<()> {
    tracing::info!(
        name = %args.name,
        user = %args.user,
        cmd = ?args.command,
        blocked,
        "executing command in container"
    );
    let container = Container::from_meta(&args.name, settings.clone())?;
    if let Some(result) = container.execute(&args.user, &args.command, blocked)? {
        output::print_result(&result);
    }
    Ok(())
}

/// Executes the `execute-client` command.
///
/// # Errors
///
/// Returns an error if the frame cannot be dispatched.
pub fn execute_client(args: &PipeArgs) -> anyhow::Result<()> {
    let mut pipe = CommandPipe::new(&args.pipe);
    pipe.verbose = false;
    pipe.execute(&args.command)?;
    Ok(())
}

/// Executes the `execute-bclient` command.
///
/// # Errors
///
/// Returns an error if the dispatch or the status round-trip fails.
pub fn execute_bclient(args: &PipeArgs) -> anyhow::Result<()> {
    let mut pipe = CommandPipe::new(&args.pipe);
    pipe.verbose = false;
    let result = pipe.execute_blocking(&args.command)?;
    output::print_result(&result);
    Ok(())
}

/// Executes the `execute-tty` command.
///
/// # Errors
///
/// Returns an error if the frame cannot be dispatched.
pub fn execute_tty(args: &PipeArgs) -> anyhow::Result<()> {
    let mut pipe = CommandPipe::new(&args.pipe);
    pipe.verbose = false;
    pipe.tty_share = true;
    pipe.execute(&args.command)?;
    Ok(())
}

/// Executes the `execute-server` command.
///
/// # Errors
///
/// Returns an error when the serve loop terminates abnormally.
pub fn execute_server(args: &ServerArgs) -> anyhow::Result<()> {
    let mut pipe = CommandPipe::new(&args.pipe);
    pipe.verbose = false;
    pipe.run_server()?;
    Ok(())
}
