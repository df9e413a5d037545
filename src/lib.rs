//! `wiki-pulse` library crate.
//!
//! The binary (`wpulse`) is a thin wrapper around this library so that:
//!
//! - the aggregation pipeline is testable without spawning processes or hitting the network
//! - the chart renderer can target any `plot::Surface`
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod merge;
pub mod plot;
pub mod report;
