//! # quickbox-core
//!
//! Host-side primitives for container management:
//! - **Probes**: fresh stat-based path classification and small file
//!   utilities.
//! - **CoW stack**: mounting a read-only lower layer under a writable
//!   upper layer with a stackable union filesystem.
//! - **Config**: the closed-vocabulary container configuration renderer.
//! - **Limits**: per-process rlimit records and their flag rendering.

pub mod cowfs;
pub mod limits;
pub mod lxcconf;
pub mod probe;
