//! # Offline Shell Cache Router
//!
//! Decides, per outbound request, whether the answer comes from the shell
//! cache or the network:
//!
//! - same-origin `GET` requests are served cache-first, and network answers
//!   are written back in the background
//! - every other request goes straight to the network and is never stored
//!
//! The router also owns the cache lifecycle: [`CacheRouter::install`] fills
//! the current cache generation from the shell manifest, and
//! [`CacheRouter::activate`] purges every other generation.

pub mod config;
pub mod error;
pub mod router;
pub mod stats;

pub use config::{ShellCacheConfig, DEFAULT_CACHE_NAME, DEFAULT_SHELL_MANIFEST};
pub use error::{CacheRouterError, Result};
pub use router::{CacheRouter, Route};
pub use stats::CacheRouterStats;
