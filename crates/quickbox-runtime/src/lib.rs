//! # quickbox-runtime
//!
//! The container lifecycle coordinator and its collaborators: image
//! sets, rendered configuration and network files, per-user command
//! server jobs, and invocation of the host's userspace container
//! runtime.

pub mod container;
pub mod image_set;
pub mod initscript;
pub mod lxc;
pub mod netconf;
