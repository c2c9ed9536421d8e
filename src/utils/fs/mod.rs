//! File system utilities.

pub mod atomic;

pub use atomic::{atomic_write, ensure_dir};
