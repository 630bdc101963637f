// Library root: re-exports the app modules so the binary and integration
// tests share the same code paths.

pub mod cli;
pub mod commands;
pub mod config;
