//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the stream preload crates:
//! - Logging and tracing setup
//! - Bridge wiring and configuration
//! - Event bus for preload and cache notifications

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
