//! Command-line front end for `cmdtrust-core`.

pub mod config;
pub mod report;
pub mod runner;
