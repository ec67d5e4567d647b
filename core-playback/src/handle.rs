//! Transient local references.
//!
//! An imported blob is played through a short-lived reference created by the
//! host's [`ObjectUrlRegistry`]. The reference is revoked when its
//! [`TransientHandle`] is dropped, so whoever owns the handle owns the
//! resource.

use std::fmt;
use std::sync::Arc;

use bridge_traits::media::ObjectUrlRegistry;
use tracing::trace;

pub struct TransientHandle {
    url: String,
    registry: Arc<dyn ObjectUrlRegistry>,
}

impl TransientHandle {
    pub fn new(url: String, registry: Arc<dyn ObjectUrlRegistry>) -> Self {
        Self { url, registry }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Revoke the reference now.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for TransientHandle {
    fn drop(&mut self) {
        trace!(url = %self.url, "Revoking transient reference");
        self.registry.revoke(&self.url);
    }
}

impl fmt::Debug for TransientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransientHandle").field("url", &self.url).finish()
    }
}
