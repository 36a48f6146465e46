//! CLI command implementations for the `smig` binary.

pub mod commands;
