//! Network Monitoring Implementation

use async_trait::async_trait;
use bridge_traits::{
    error::Result,
    network::{NetworkChangeStream, NetworkMonitor, NetworkStatus},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

const DEFAULT_CHECK_ADDR: &str = "8.8.8.8:53";
const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Desktop network monitor implementation
///
/// Keeps the last known status in a watch channel so `current_status` is a
/// cheap synchronous read. The status is updated either by the host through
/// [`set_status`](Self::set_status) or by a TCP reachability check, run once
/// via [`check_reachability`](Self::check_reachability) or periodically via
/// [`spawn_polling`](Self::spawn_polling).
///
/// Note: Platform-specific implementations (Linux netlink, macOS SystemConfiguration,
/// Windows WinAPI) would be more robust but require additional dependencies.
pub struct DesktopNetworkMonitor {
    status: watch::Sender<NetworkStatus>,
    check_addr: String,
}

impl DesktopNetworkMonitor {
    /// Create a monitor whose status is unknown (treated as online) until the
    /// first check or override.
    pub fn new() -> Self {
        Self::with_status(NetworkStatus::Indeterminate)
    }

    /// Create a monitor with a known initial status.
    pub fn with_status(status: NetworkStatus) -> Self {
        let (tx, _rx) = watch::channel(status);
        Self {
            status: tx,
            check_addr: DEFAULT_CHECK_ADDR.to_string(),
        }
    }

    /// Check a different `host:port` instead of the public DNS resolver.
    pub fn with_check_addr(mut self, addr: impl Into<String>) -> Self {
        self.check_addr = addr.into();
        self
    }

    /// Override the current status. Subscribers are notified only on change.
    pub fn set_status(&self, status: NetworkStatus) {
        let changed = self.status.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                *current = status;
                true
            }
        });

        if changed {
            info!(status = ?status, "Network status changed");
        }
    }

    /// Check connectivity by opening a TCP connection to the check address
    /// and record the result.
    pub async fn check_reachability(&self) -> NetworkStatus {
        let status = match tokio::time::timeout(
            CHECK_TIMEOUT,
            tokio::net::TcpStream::connect(self.check_addr.as_str()),
        )
        .await
        {
            Ok(Ok(_)) => NetworkStatus::Connected,
            Ok(Err(_)) => NetworkStatus::Disconnected,
            Err(_) => NetworkStatus::Disconnected,
        };

        debug!(addr = %self.check_addr, status = ?status, "Reachability check finished");
        self.set_status(status);
        status
    }

    /// Check every `interval` until the returned task is aborted.
    pub fn spawn_polling(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let monitor = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                monitor.check_reachability().await;
            }
        })
    }
}

impl Default for DesktopNetworkMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkMonitor for DesktopNetworkMonitor {
    fn current_status(&self) -> NetworkStatus {
        *self.status.borrow()
    }

    async fn subscribe_changes(&self) -> Result<Box<dyn NetworkChangeStream>> {
        Ok(Box::new(DesktopNetworkChangeStream {
            rx: self.status.subscribe(),
        }))
    }
}

/// Stream over the monitor's watch channel
struct DesktopNetworkChangeStream {
    rx: watch::Receiver<NetworkStatus>,
}

#[async_trait]
impl NetworkChangeStream for DesktopNetworkChangeStream {
    async fn next(&mut self) -> Option<NetworkStatus> {
        self.rx.changed().await.ok()?;
        let status = *self.rx.borrow_and_update();
        Some(status)
    }
}
