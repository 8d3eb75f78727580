//! # quickbox-transport
//!
//! A request/response channel over named pipes between out-of-container
//! clients and an in-container command server.
//!
//! Clients write newline-framed requests to a per-user command FIFO
//! under an exclusive advisory lock; the server reads frames, spawns the
//! requested commands, and an in-container supervisor reports
//! termination over an out-of-band status FIFO. Frames are terminated by
//! a sentinel line so many writers can share one pipe without message
//! boundaries.

mod client;
mod fifo;
mod server;
mod status;

pub use client::Reporting;
pub use fifo::CommandPipe;
pub use status::{collect, CommandResult, StatusFiles};

/// Line terminating every request frame.
pub const FRAME_SENTINEL: &str = "-*-EOFENDEOFEND-*-";

/// Control verb asking the server to exit.
pub const CTRL_EXIT: &str = "@exit";

/// Control verb asking the server to release and re-acquire its lock.
pub const CTRL_RESTART: &str = "@restart";

/// Control verb used as a no-op liveness probe.
pub const CTRL_ALIVE: &str = "@alive";

/// The in-container helper that applies rlimits and redirections, then
/// fork-supervises the requested command.
pub const EXEC_HELPER: &str = "iexec";

/// Returns true iff `token` is interpreted by the server itself rather
/// than spawned.
#[must_use]
pub fn is_control_verb(token: &str) -> bool {
    matches!(token, CTRL_EXIT | CTRL_RESTART | CTRL_ALIVE)
}
