//! # quickbox-common
//!
//! Shared foundations for the quickbox workspace: the unified error
//! type, container domain types, and the injected `Settings` record
//! holding host path roots.

pub mod constants;
pub mod error;
pub mod settings;
pub mod types;
