//! Common utilities and types shared across the gate crates.

#![warn(clippy::pedantic)]

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for compact JWT primitives (size limit, segment splitting, header model)
pub mod jwt;
