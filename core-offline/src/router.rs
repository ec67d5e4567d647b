//! # Cache Router
//!
//! Request routing plus install/activate lifecycle for the shell cache.

use std::sync::Arc;

use bridge_traits::{
    cache::CacheStorage,
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse},
};
use core_runtime::events::{CoreEvent, EventBus, ShellEvent};
use futures::future::try_join_all;
use tracing::{debug, info, instrument, warn};
use url::{Origin, Url};

use crate::config::ShellCacheConfig;
use crate::error::{CacheRouterError, Result};
use crate::stats::{CacheRouterStats, Counters};

/// Where a request is answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Shell cache first, network on a miss.
    CacheFirst,
    /// Network only; the cache is neither read nor written.
    Network,
}

pub struct CacheRouter {
    config: ShellCacheConfig,
    origin: Origin,
    http: Arc<dyn HttpClient>,
    cache: Arc<dyn CacheStorage>,
    counters: Arc<Counters>,
    event_bus: Option<EventBus>,
}

impl CacheRouter {
    /// Create a router for `config`.
    ///
    /// # Errors
    ///
    /// `Config` when the configuration does not validate.
    pub fn new(
        config: ShellCacheConfig,
        http: Arc<dyn HttpClient>,
        cache: Arc<dyn CacheStorage>,
    ) -> Result<Self> {
        config.validate().map_err(CacheRouterError::Config)?;
        let origin = config.base_url()?.origin();
        Ok(Self {
            config,
            origin,
            http,
            cache,
            counters: Arc::new(Counters::default()),
            event_bus: None,
        })
    }

    /// Publish install/activate events on `event_bus`.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn config(&self) -> &ShellCacheConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheRouterStats {
        self.counters.snapshot()
    }

    /// Routing decision for `request`.
    pub fn route(&self, request: &HttpRequest) -> Result<Route> {
        let url = parse(&request.url)?;
        Ok(self.route_url(request.method, &url))
    }

    fn route_url(&self, method: HttpMethod, url: &Url) -> Route {
        if method.is_cacheable() && url.origin() == self.origin {
            Route::CacheFirst
        } else {
            Route::Network
        }
    }

    /// Fetch every manifest entry and store them in the current cache.
    ///
    /// Nothing is stored unless every entry answered with a 2xx status.
    /// Returns the number of entries stored.
    #[instrument(skip(self), fields(cache = %self.config.cache_name))]
    pub async fn install(&self) -> Result<usize> {
        let fetches = self.config.manifest.iter().map(|path| self.fetch_shell_entry(path));
        let entries = try_join_all(fetches).await?;
        let count = entries.len();

        self.cache.put_all(&self.config.cache_name, entries).await?;
        info!(entries = count, "Shell cache installed");

        self.emit(ShellEvent::Installed {
            cache_name: self.config.cache_name.clone(),
            entries: count,
        });
        Ok(count)
    }

    async fn fetch_shell_entry(&self, path: &str) -> Result<(String, HttpResponse)> {
        let url = self.config.resolve(path)?;
        let request = HttpRequest::get(url.as_str());
        let key = request.cache_key();

        let response =
            self.http
                .execute(request)
                .await
                .map_err(|e| CacheRouterError::InstallFailed {
                    path: path.to_string(),
                    reason: e.to_string(),
                })?;
        if !response.is_success() {
            return Err(CacheRouterError::InstallFailed {
                path: path.to_string(),
                reason: format!("HTTP {}", response.status),
            });
        }
        debug!(path, "Fetched shell entry");
        Ok((key, response))
    }

    /// Delete every cache generation other than the current one.
    ///
    /// Returns the purged cache names.
    #[instrument(skip(self), fields(cache = %self.config.cache_name))]
    pub async fn activate(&self) -> Result<Vec<String>> {
        let mut purged = Vec::new();
        for name in self.cache.cache_names().await? {
            if name == self.config.cache_name {
                continue;
            }
            if self.cache.delete_cache(&name).await? {
                purged.push(name);
            }
        }

        if !purged.is_empty() {
            info!(?purged, "Purged stale shell caches");
        }
        self.emit(ShellEvent::Activated {
            cache_name: self.config.cache_name.clone(),
            purged: purged.clone(),
        });
        Ok(purged)
    }

    /// Answer `request` according to its [`Route`].
    ///
    /// # Errors
    ///
    /// `InvalidUrl` for an unparseable request URL. `Fetch` when the network
    /// fails and there is no cached copy. Cross-origin transport failures are
    /// returned as `Bridge`.
    pub async fn handle(&self, mut request: HttpRequest) -> Result<HttpResponse> {
        let url = parse(&request.url)?;

        if self.route_url(request.method, &url) == Route::Network {
            self.counters.passthrough();
            return Ok(self.http.execute(request).await?);
        }

        request.url = url.to_string();
        let key = request.cache_key();

        match self.cache.match_request(&self.config.cache_name, &key).await {
            Ok(Some(cached)) => {
                self.counters.hit();
                debug!(url = %url, "Shell cache hit");
                return Ok(cached);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Shell cache lookup failed, falling back to network"),
        }
        self.counters.miss();

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|source| CacheRouterError::Fetch {
                url: url.to_string(),
                source,
            })?;

        if response.is_success() {
            self.write_back(key, response.clone());
        }
        Ok(response)
    }

    fn write_back(&self, key: String, copy: HttpResponse) {
        let cache = self.cache.clone();
        let counters = self.counters.clone();
        let cache_name = self.config.cache_name.clone();

        tokio::spawn(async move {
            if let Err(e) = cache.put(&cache_name, &key, copy).await {
                counters.write_back_failed();
                warn!(error = %e, key, "Shell cache write-back failed");
            }
        });
    }

    fn emit(&self, event: ShellEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Shell(event));
        }
    }
}

fn parse(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| CacheRouterError::InvalidUrl {
        url: raw.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_desktop::MemoryCacheStorage;
    use bridge_traits::error::Result as BridgeResult;
    use mockall::mock;

    mock! {
        Http {}

        #[async_trait]
        impl HttpClient for Http {
            async fn execute(&self, request: HttpRequest) -> BridgeResult<HttpResponse>;
        }
    }

    mock! {
        Cache {}

        #[async_trait]
        impl CacheStorage for Cache {
            async fn match_request(&self, cache: &str, key: &str) -> BridgeResult<Option<HttpResponse>>;
            async fn put(&self, cache: &str, key: &str, response: HttpResponse) -> BridgeResult<()>;
            async fn put_all(&self, cache: &str, entries: Vec<(String, HttpResponse)>) -> BridgeResult<()>;
            async fn cache_names(&self) -> BridgeResult<Vec<String>>;
            async fn delete_cache(&self, cache: &str) -> BridgeResult<bool>;
        }
    }

    fn config() -> ShellCacheConfig {
        ShellCacheConfig::new("https://app.example/")
    }

    #[test]
    fn test_routes_by_origin_and_method() {
        let router = CacheRouter::new(
            config(),
            Arc::new(MockHttp::new()),
            Arc::new(MemoryCacheStorage::new()),
        )
        .unwrap();

        let same = HttpRequest::get("https://app.example/style.css");
        assert_eq!(router.route(&same).unwrap(), Route::CacheFirst);

        let other_port = HttpRequest::get("https://app.example:8443/style.css");
        assert_eq!(router.route(&other_port).unwrap(), Route::Network);

        let third_party = HttpRequest::get("https://www.youtube.com/iframe_api");
        assert_eq!(router.route(&third_party).unwrap(), Route::Network);

        let post = HttpRequest::new(HttpMethod::Post, "https://app.example/api");
        assert_eq!(router.route(&post).unwrap(), Route::Network);

        assert!(matches!(
            router.route(&HttpRequest::get("::nope")),
            Err(CacheRouterError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let result = CacheRouter::new(
            config().with_cache_name(""),
            Arc::new(MockHttp::new()),
            Arc::new(MemoryCacheStorage::new()),
        );
        assert!(matches!(result, Err(CacheRouterError::Config(_))));
    }

    #[tokio::test]
    async fn test_cross_origin_never_touches_cache() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, "api")));

        let mut cache = MockCache::new();
        cache.expect_match_request().never();
        cache.expect_put().never();

        let router = CacheRouter::new(config(), Arc::new(http), Arc::new(cache)).unwrap();
        let response = router
            .handle(HttpRequest::get("https://www.youtube.com/iframe_api"))
            .await
            .unwrap();

        assert_eq!(response.body.as_ref(), b"api");
        assert_eq!(router.stats().passthroughs, 1);
    }

    #[tokio::test]
    async fn test_lookup_failure_falls_back_to_network() {
        let mut http = MockHttp::new();
        http.expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(404, "")));

        let mut cache = MockCache::new();
        cache.expect_match_request().returning(|_, _| {
            Err(bridge_traits::BridgeError::DatabaseError("locked".into()))
        });
        cache.expect_put().never();

        let router = CacheRouter::new(config(), Arc::new(http), Arc::new(cache)).unwrap();
        let response = router
            .handle(HttpRequest::get("https://app.example/missing.png"))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(router.stats().misses, 1);
    }

    #[tokio::test]
    async fn test_activate_keeps_current_generation() {
        let http = MockHttp::new();
        let mut cache = MockCache::new();
        cache.expect_cache_names().returning(|| {
            Ok(vec![
                "otp-cache-v0".to_string(),
                "otp-cache-v1".to_string(),
                "scratch".to_string(),
            ])
        });
        cache
            .expect_delete_cache()
            .withf(|name| name != "otp-cache-v1")
            .times(2)
            .returning(|_| Ok(true));

        let router = CacheRouter::new(config(), Arc::new(http), Arc::new(cache)).unwrap();
        let purged = router.activate().await.unwrap();
        assert_eq!(purged, vec!["otp-cache-v0", "scratch"]);
    }
}
