//! Formatted output for command results.

use quickbox_transport::CommandResult;

/// Renders a command result in the sectioned text layout used by the
/// blocking execute verbs.
#[must_use]
pub fn format_result(result: &CommandResult) -> String {
    format!(
        "---standard output---\n\
         {out}\
         ---standard error---\n\
         {err}\
         ---other info---\n\
         pid {pid}\n\
         signals {signals:?}\n\
         exit {exit}\n",
        out = String::from_utf8_lossy(&result.stdout),
        err = String::from_utf8_lossy(&result.stderr),
        pid = result.pid,
        signals = result.signal_codes,
        exit = result.exit_code,
    )
}

/// Prints a command result to standard output.
pub fn print_result(result: &CommandResult) {
    print!("{}", format_result(result));
}
