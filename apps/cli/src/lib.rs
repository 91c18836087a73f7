//! # fpm
//!
//! Command line front end of the provisioning engine. Settings come from an optional
//! `fpm.toml` layered with `FPM__*` environment variables; command-line flags win over both.

pub mod args;
pub mod handlers;
pub mod settings;
