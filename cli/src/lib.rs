//! Orca CLI library.
//!
//! Command definitions live here so integration tests can drive parsing
//! and dispatch without spawning the binary.

pub mod commands;
