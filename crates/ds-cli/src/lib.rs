//! devstack: Command-line interface
//!
//! Provides the `devstack` CLI for starting, stopping and inspecting a
//! local development stack.

pub mod commands;
pub mod output;
