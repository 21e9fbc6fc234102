//! wqcodes Library
//!
//! This module exposes the cache, lookup, and CLI modules for use in integration tests.

pub mod cache;
pub mod cli;
pub mod codes;
pub mod config;
pub mod fetch;
pub mod logging;
