//! CLI command definitions and handlers
//!
//! - [`commands`] - Argument and subcommand definitions
//! - [`handlers`] - Search execution and record output

mod commands;
mod handlers;

pub use commands::*;
pub use handlers::*;
