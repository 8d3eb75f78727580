//! Client-side status reading.
//!
//! The in-container supervisor reports the lifecycle of a spawned
//! command as newline-separated records on a dedicated status FIFO:
//! `kill <n>`, `exit <n>`, `pid <n>`, `stop <n>`, `cont <n>`, `err`.
//! The reader reopens the pipe until a terminal record is seen, then
//! collects any capture files.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use quickbox_common::error::{QbError, Result};
use quickbox_core::probe;

/// The host-side files a status round-trip reads and then removes.
#[derive(Debug, Clone)]
pub struct StatusFiles {
    /// The status FIFO.
    pub status: PathBuf,
    /// Optional stdout capture file.
    pub stdout: Option<PathBuf>,
    /// Optional stderr capture file.
    pub stderr: Option<PathBuf>,
}

/// The outcome of one command dispatched with status reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    /// Captured standard output, empty unless requested.
    pub stdout: Vec<u8>,
    /// Captured standard error, empty unless requested.
    pub stderr: Vec<u8>,
    /// Signal numbers observed (`kill`, `stop`, `cont` records).
    pub signal_codes: Vec<i32>,
    /// Exit code; −1 when the command was terminated by a signal.
    pub exit_code: i32,
    /// Pid of the supervised command.
    pub pid: i32,
}

/// Accumulates status records until termination.
struct StatusScan {
    terminated: bool,
    err_occurred: bool,
    signal_codes: Vec<i32>,
    exit_code: i32,
    pid: i32,
}

impl StatusScan {
    fn new() -> Self {
        Self {
            terminated: false,
            err_occurred: false,
            signal_codes: Vec::new(),
            exit_code: -1,
            pid: 0,
        }
    }

    /// Applies one record line. Unknown prefixes are ignored.
    ///
    /// `pid` is treated as terminal, matching the deployed behavior even
    /// though `pid` normally precedes `exit`; callers survive because
    /// every line already buffered in the current open is still applied
    /// after the terminal flag is set.
    fn apply(&mut self, line: &str) {
        if let Some(rest) = line.strip_prefix("kill ") {
            self.terminated = true;
            if let Ok(code) = rest.trim().parse() {
                self.signal_codes.push(code);
            }
        } else if let Some(rest) = line.strip_prefix("exit ") {
            self.terminated = true;
            if let Ok(code) = rest.trim().parse() {
                self.exit_code = code;
            }
        } else if let Some(rest) = line.strip_prefix("pid ") {
            self.terminated = true;
            if let Ok(code) = rest.trim().parse() {
                self.pid = code;
            }
        } else if let Some(rest) = line
            .strip_prefix("stop ")
            .or_else(|| line.strip_prefix("cont "))
        {
            if let Ok(code) = rest.trim().parse() {
                self.signal_codes.push(code);
            }
        } else if line.starts_with("err") {
            self.err_occurred = true;
            self.terminated = true;
        }
    }
}

/// Reads status records until a terminal record arrives, then collects
/// the capture files into a [`CommandResult`].
///
/// # Errors
///
/// - `NotAFifo` / `PreconditionFailed` when the status path is not a
///   usable FIFO.
/// - `Status` when the supervisor reported `err`.
/// - `Io` on read failures.
pub fn collect(files: &StatusFiles) -> Result<CommandResult> {
    if probe::exists(&files.status) {
        if !probe::is_fifo(&files.status) {
            return Err(QbError::NotAFifo {
                path: files.status.clone(),
            });
        }
    } else {
        return Err(QbError::precondition(format!(
            "status filename '{}' does not exist - cannot proceed",
            files.status.display()
        )));
    }

    let mut scan = StatusScan::new();
    while !scan.terminated {
        let file = File::open(&files.status).map_err(|e| QbError::io(&files.status, e))?;
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| QbError::io(&files.status, e))?;
            scan.apply(&line);
        }
    }
    if scan.err_occurred {
        return Err(QbError::Status {
            status_path: files.status.clone(),
        });
    }

    let read_capture = |path: &Option<PathBuf>| {
        path.as_ref()
            .map(|p| std::fs::read(p).unwrap_or_default())
            .unwrap_or_default()
    };
    Ok(CommandResult {
        stdout: read_capture(&files.stdout),
        stderr: read_capture(&files.stderr),
        signal_codes: scan.signal_codes,
        exit_code: scan.exit_code,
        pid: scan.pid,
    })
}

/// Removes the status FIFO, any capture files, and their temporary
/// directory.
///
/// # Errors
///
/// Returns an error if any removal fails.
pub(crate) fn cleanup(files: &StatusFiles) -> Result<()> {
    std::fs::remove_file(&files.status).map_err(|e| QbError::io(&files.status, e))?;
    for capture in [&files.stdout, &files.stderr].into_iter().flatten() {
        std::fs::remove_file(capture).map_err(|e| QbError::io(capture, e))?;
    }
    if let Some(dir) = files.status.parent() {
        std::fs::remove_dir(dir).map_err(|e| QbError::io(dir, e))?;
    }
    Ok(())
}

/// Runs a full status round-trip: collect, hand the result to the
/// completion handler, then remove the artifacts.
///
/// On a supervisor-reported error the handler is not invoked and the
/// artifacts are left in place for inspection.
pub(crate) fn wait_until_done(
    files: &StatusFiles,
    on_terminate: Box<dyn FnOnce(CommandResult) + Send>,
) -> Result<()> {
    let result = collect(files)?;
    on_terminate(result);
    cleanup(files)
}
