//! Filesystem utilities for chm.
//!
//! Every state file is replaced atomically so a crash never leaves a
//! half-written lock record behind.

pub mod atomic;

pub use atomic::{atomic_write, atomic_write_file};
