//! CLI module
//!
//! # Commands
//!
//! - `run` - full pipeline (default): extract, catalog, report
//! - `check` - test connectivity to catalog and source
//! - `catalog` - cataloging pass only
//! - `report` - report generation only

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::Runner;
