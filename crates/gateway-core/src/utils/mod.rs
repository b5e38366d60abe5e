//! Filesystem helpers.

pub mod paths;
