//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the OneTap player core:
//! - Logging and tracing infrastructure
//! - Configuration management with fail-fast capability checks
//! - Event bus system
//!
//! ## Overview
//!
//! Every other core crate depends on this one for its logging conventions,
//! its view of the injected host capabilities, and the broadcast channel it
//! publishes state changes on.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
