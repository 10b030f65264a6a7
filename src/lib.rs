//! profilewatch - client for the profile analysis service.
//!
//! Starts analysis jobs, follows them to a terminal state and renders
//! their results. The binary in `main.rs` wires these modules to the
//! command line.

pub mod api;
pub mod cli;
pub mod config;
pub mod models;
pub mod report;
pub mod tracker;
