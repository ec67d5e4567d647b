//! Named response cache abstraction.
//!
//! Mirrors the browser Cache Storage API: a set of named caches, each mapping
//! a request key (see [`HttpRequest::cache_key`](crate::http::HttpRequest::cache_key))
//! to a stored response.

use crate::{error::Result, http::HttpResponse, platform::PlatformSendSync};

#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait CacheStorage: PlatformSendSync {
    /// Look up a stored response in `cache`.
    async fn match_request(&self, cache: &str, key: &str) -> Result<Option<HttpResponse>>;

    /// Store one response, replacing any previous entry for `key`.
    async fn put(&self, cache: &str, key: &str, response: HttpResponse) -> Result<()>;

    /// Store several responses at once. Either all entries are written or none are.
    async fn put_all(&self, cache: &str, entries: Vec<(String, HttpResponse)>) -> Result<()>;

    /// Names of every cache currently present.
    async fn cache_names(&self) -> Result<Vec<String>>;

    /// Drop a whole cache. Returns `false` when it did not exist.
    async fn delete_cache(&self, cache: &str) -> Result<bool>;
}
