//! Common utilities for the bramble crates.
//!
//! This crate provides shared infrastructure used by the tree store, the
//! selector engine and the node layer:
//! - **Warning System** - colored terminal output for input the crates accept
//!   but cannot fully honor

pub mod warning;
