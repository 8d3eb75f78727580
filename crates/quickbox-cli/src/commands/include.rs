//! The `include` batch runner.
//!
//! Re-dispatches each line of a file as a qb command line. `#` starts a
//! comment; the bare directives `verbose`/`quiet` toggle echoing and
//! `fail`/`nofail` toggle exit-on-first-error.

use std::path::PathBuf;

use clap::{Args, Parser};

/// Arguments for `include`.
#[derive(Args, Debug)]
pub struct IncludeArgs {
    /// File of qb command lines to run.
    pub file: PathBuf,
}

/// Executes the `include` command.
///
/// Per-line failures are reported on stderr and, unless `fail` is in
/// effect, do not stop the run.
///
/// # Errors
///
/// Returns an error if the include file cannot be read.
pub fn run(args: &IncludeArgs) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(&args.file)?;
    let mut verbose = false;
    let mut fail = false;

    for (index, raw) in content.lines().enumerate() {
        let Some(tokens) = parse_line(raw) else {
            continue;
        };
        if tokens.len() == 1 {
            match tokens[0].as_str() {
                "verbose" => {
                    verbose = true;
                    continue;
                }
                "quiet" => {
                    verbose = false;
                    continue;
                }
                "fail" => {
                    fail = true;
                    continue;
                }
                "nofail" => {
                    fail = false;
                    continue;
                }
                _ => {}
            }
        }
        if verbose {
            println!("{}", tokens.join(" "));
        }

        let argv = std::iter::once("qb").chain(tokens.iter().map(String::as_str));
        let outcome = super::Cli::try_parse_from(argv)
            .map_err(anyhow::Error::from)
            .and_then(super::execute);
        if let Err(err) = outcome {
            eprintln!(
                "qb(include): error in file {} line {} ({}): {err:#}",
                args.file.display(),
                index + 1,
                tokens[0]
            );
            if fail {
                std::process::exit(1);
            }
        }
    }
    Ok(())
}

/// Strips the comment and splits a line into tokens; `None` for lines
/// with no content.
fn parse_line(raw: &str) -> Option<Vec<String>> {
    let line = raw.split('#').next().unwrap_or("").trim();
    if line.is_empty() {
        return None;
    }
    Some(line.split_whitespace().map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_and_blanks_are_skipped() {
        assert_eq!(parse_line("# a whole comment"), None);
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line(""), None);
    }

    #[test]
    fn trailing_comments_are_stripped() {
        assert_eq!(
            parse_line("start web1   # bring it up"),
            Some(vec!["start".to_string(), "web1".to_string()])
        );
    }

    #[test]
    fn tokens_split_on_any_whitespace() {
        assert_eq!(
            parse_line("execute\tweb1  web /bin/true"),
            Some(vec![
                "execute".to_string(),
                "web1".to_string(),
                "web".to_string(),
                "/bin/true".to_string(),
            ])
        );
    }
}
