//! Shell cache configuration

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CacheRouterError, Result};

/// Current cache generation. Bump it to replace every stored shell entry on
/// the next activation.
pub const DEFAULT_CACHE_NAME: &str = "otp-cache-v1";

/// Resources that must be present after a successful install, relative to
/// the application base URL.
pub const DEFAULT_SHELL_MANIFEST: &[&str] = &[
    "./",
    "./index.html",
    "./style.css",
    "./script.js",
    "./manifest.json",
    "./assets/sample.mp3",
    "./icons/icon-192.png",
    "./icons/icon-512.png",
];

/// Configuration for the [`CacheRouter`](crate::CacheRouter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellCacheConfig {
    /// Versioned cache identifier.
    pub cache_name: String,

    /// Application base URL. Its origin decides which requests are cached;
    /// its path is the base that manifest entries resolve against.
    pub origin: String,

    /// Shell resource paths stored on install.
    pub manifest: Vec<String>,
}

impl Default for ShellCacheConfig {
    fn default() -> Self {
        Self {
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            origin: "http://localhost/".to_string(),
            manifest: DEFAULT_SHELL_MANIFEST.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ShellCacheConfig {
    /// Default manifest and cache name for the application at `origin`.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            ..Self::default()
        }
    }

    /// Set the cache generation name.
    pub fn with_cache_name(mut self, name: impl Into<String>) -> Self {
        self.cache_name = name.into();
        self
    }

    /// Replace the shell manifest.
    pub fn with_manifest<I, S>(mut self, manifest: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.manifest = manifest.into_iter().map(Into::into).collect();
        self
    }

    /// Parsed application base URL.
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.origin).map_err(|e| CacheRouterError::InvalidUrl {
            url: self.origin.clone(),
            message: e.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(CacheRouterError::Config(format!(
                "origin must be http or https, got '{}'",
                other
            ))),
        }
    }

    /// Absolute URL of a manifest entry.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        self.base_url()?
            .join(path)
            .map_err(|e| CacheRouterError::InvalidUrl {
                url: path.to_string(),
                message: e.to_string(),
            })
    }

    /// Validate configuration.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.cache_name.trim().is_empty() {
            return Err("cache_name cannot be empty".to_string());
        }

        if self.manifest.is_empty() {
            return Err("manifest must list at least one resource".to_string());
        }

        if let Err(e) = self.base_url() {
            return Err(e.to_string());
        }

        for path in &self.manifest {
            if let Err(e) = self.resolve(path) {
                return Err(e.to_string());
            }
        }

        Ok(())
    }
}
