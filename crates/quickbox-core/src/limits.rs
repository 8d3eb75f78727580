//! Per-process resource-limit records and their flag rendering.
//!
//! Limits are handed to the in-container `iexec` helper as command-line
//! flags; a sentinel value marks fields that should be left alone.

use std::fmt::Write as _;

/// Sentinel meaning "do not change this resource limit".
pub const RLIMIT_UNCHANGED: i64 = -2;

/// A fixed set of rlimit values. Fields left at [`RLIMIT_UNCHANGED`] are
/// omitted from the rendered flag string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLimits {
    pub cpu: i64,
    pub fsize: i64,
    pub data: i64,
    pub stack: i64,
    pub core: i64,
    pub rss: i64,
    pub nofile: i64,
    pub address_space: i64,
    pub nproc: i64,
    pub memlock: i64,
    pub locks: i64,
    pub sigpending: i64,
    pub msgqueue: i64,
    pub nice: i64,
    pub rtprio: i64,
}

impl ResourceLimits {
    /// Returns limits with every field unchanged.
    #[must_use]
    pub fn unchanged() -> Self {
        Self {
            cpu: RLIMIT_UNCHANGED,
            fsize: RLIMIT_UNCHANGED,
            data: RLIMIT_UNCHANGED,
            stack: RLIMIT_UNCHANGED,
            core: RLIMIT_UNCHANGED,
            rss: RLIMIT_UNCHANGED,
            nofile: RLIMIT_UNCHANGED,
            address_space: RLIMIT_UNCHANGED,
            nproc: RLIMIT_UNCHANGED,
            memlock: RLIMIT_UNCHANGED,
            locks: RLIMIT_UNCHANGED,
            sigpending: RLIMIT_UNCHANGED,
            msgqueue: RLIMIT_UNCHANGED,
            nice: RLIMIT_UNCHANGED,
            rtprio: RLIMIT_UNCHANGED,
        }
    }

    /// The (flag-name, value) table in rendering order.
    fn fields(&self) -> [(&'static str, i64); 15] {
        [
            ("cpu", self.cpu),
            ("fsize", self.fsize),
            ("data", self.data),
            ("stack", self.stack),
            ("core", self.core),
            ("rss", self.rss),
            ("nofile", self.nofile),
            ("as", self.address_space),
            ("nproc", self.nproc),
            ("memlock", self.memlock),
            ("locks", self.locks),
            ("sigpending", self.sigpending),
            ("msgqueue", self.msgqueue),
            ("nice", self.nice),
            ("rtprio", self.rtprio),
        ]
    }
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self::unchanged()
    }
}

/// Renders soft and hard limits into the flat `iexec` flag string, e.g.
/// ` --rlimit-nproc-soft 64 --rlimit-nofile-hard 1024`. Returns an
/// empty string when nothing is set.
#[must_use]
pub fn iexec_args(soft: Option<&ResourceLimits>, hard: Option<&ResourceLimits>) -> String {
    let mut out = String::new();
    for (kind, limits) in [("soft", soft), ("hard", hard)] {
        if let Some(limits) = limits {
            for (name, value) in limits.fields() {
                if value != RLIMIT_UNCHANGED {
                    let _ = write!(out, " --rlimit-{name}-{kind} {value}");
                }
            }
        }
    }
    out
}
