//! Workspace umbrella crate.
//!
//! Re-exports the player façade so host applications can depend on
//! `onetap-workspace` and pick features instead of wiring each crate.
//! `desktop-shims` pulls in the SQLite/reqwest bridges; `offline-shell`
//! adds the app-shell cache router.

#[cfg(any(feature = "desktop-shims", feature = "offline-shell"))]
pub use core_service::*;

#[cfg(feature = "offline-shell")]
pub use core_offline as offline;
