//! Shared utilities for the Shitei workspace.
//!
//! This crate provides the pieces that both the server and its tests need:
//! logging setup and time utilities.

pub mod logger;
pub mod time;
