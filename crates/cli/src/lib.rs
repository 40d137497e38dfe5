//! Command-line front end for the artifact sweeper.
//!
//! The binary in `main.rs` wires these pieces together; they live in a
//! library so argument handling and console rendering can be tested
//! without spawning the process.

pub mod args;
pub mod console;
