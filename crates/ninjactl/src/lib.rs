//! ninjactl - command-line client for Trader Ninja progression.
//!
//! The binary is a thin wrapper; everything testable lives here.

pub mod cli;
pub mod commands;
pub mod display;
pub mod logging;
pub mod ui;
