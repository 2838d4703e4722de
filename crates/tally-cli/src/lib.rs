//! Tally CLI - matches recipe manifests against container stock.
//!
//! This crate provides the configuration, manifest loading and report
//! building behind the `tally` binary.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod cli;
pub mod config;
pub mod manifest;
pub mod report;
