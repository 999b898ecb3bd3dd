//! Flyover CLI - simulation tooling for the route flyover camera.
//!
//! This crate provides the `flyover_sim` binary, which drives a camera
//! controller over a synthetic route and prints per-tick telemetry.

pub mod config;
pub mod sim;

pub use config::{load_config, parse_config};
