//! # ytpa
//!
//! Command-line front end of the playlist aggregator. The aggregation itself
//! lives in `ytpa-core`; this crate adds the GData HTTP client, the YAML
//! configuration loader and the argument parser.

pub mod cli;
pub mod client;
pub mod load_config;

pub use cli::{run, Cli};
