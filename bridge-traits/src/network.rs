//! Network Reachability Abstraction
//!
//! Provides the boolean online/offline signal the offline gate consults.

use crate::{
    error::Result,
    platform::{PlatformSend, PlatformSendSync},
};

/// Network connection status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    /// Connected to network
    Connected,
    /// Not connected to any network
    Disconnected,
    /// Connection status unknown or indeterminate
    Indeterminate,
}

impl NetworkStatus {
    /// Only a definite `Disconnected` counts as offline. An indeterminate
    /// status is treated as online, like `navigator.onLine`.
    pub fn is_online(&self) -> bool {
        !matches!(self, NetworkStatus::Disconnected)
    }
}

/// Network monitor trait
///
/// The current value is read synchronously at the moment of each `play`, so
/// implementations must keep a cached status rather than probing on demand.
///
/// # Platform Support
///
/// - **Desktop**: cached status updated by an optional TCP reachability check or a manual override
/// - **Web**: `navigator.onLine` plus `online`/`offline` window events
///
/// # Example
///
/// ```ignore
/// use bridge_traits::network::NetworkMonitor;
///
/// fn may_stream(monitor: &dyn NetworkMonitor) -> bool {
///     monitor.is_online()
/// }
/// ```
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait NetworkMonitor: PlatformSendSync {
    /// Last known reachability status.
    fn current_status(&self) -> NetworkStatus;

    /// Check if currently considered online
    fn is_online(&self) -> bool {
        self.current_status().is_online()
    }

    /// Subscribe to network status changes
    ///
    /// Returns a stream of status updates. Implementations should emit an
    /// event whenever the status changes.
    async fn subscribe_changes(&self) -> Result<Box<dyn NetworkChangeStream>>;
}

/// Stream of network status changes
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait NetworkChangeStream: PlatformSend {
    /// Get the next status update
    ///
    /// Returns `None` when the stream is closed.
    async fn next(&mut self) -> Option<NetworkStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indeterminate_counts_as_online() {
        assert!(NetworkStatus::Connected.is_online());
        assert!(NetworkStatus::Indeterminate.is_online());
        assert!(!NetworkStatus::Disconnected.is_online());
    }
}
