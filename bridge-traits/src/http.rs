//! Network fetches for the offline shell.
//!
//! The shell router sees every request the app makes. Same-origin `GET`s
//! are answered from the shell cache when possible; everything else goes
//! straight to the [`HttpClient`].

use std::collections::HashMap;

use bytes::Bytes;

use crate::{
    error::{BridgeError, Result},
    platform::PlatformSendSync,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Head => "HEAD",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Only `GET` responses ever enter the shell cache.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, HttpMethod::Get)
    }
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    /// Shell cache key: method and URL.
    pub fn cache_key(&self) -> String {
        format!("{} {}", self.method.as_str(), self.url)
    }
}

/// A complete response. Bodies of shell entries are small enough to buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| BridgeError::OperationFailed(format!("Invalid UTF-8: {}", e)))
    }

    /// 2xx. Only these are stored in the shell cache.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network side of the shell router.
///
/// Non-2xx statuses come back as responses. `Err` means the request never
/// completed; hosts should answer [`BridgeError::NotAvailable`] when the
/// device is offline.
#[cfg_attr(target_arch = "wasm32", async_trait::async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait::async_trait)]
pub trait HttpClient: PlatformSendSync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_includes_method() {
        let get = HttpRequest::get("https://app.example/app.js");
        let head = HttpRequest::new(HttpMethod::Head, "https://app.example/app.js");
        assert_eq!(get.cache_key(), "GET https://app.example/app.js");
        assert_ne!(get.cache_key(), head.cache_key());
    }

    #[test]
    fn test_only_get_is_cacheable() {
        assert!(HttpMethod::Get.is_cacheable());
        assert!(!HttpMethod::Head.is_cacheable());
        assert!(!HttpMethod::Post.is_cacheable());
    }

    #[test]
    fn test_success_response_text() {
        let response = HttpResponse::new(200, "<html>").with_header("content-type", "text/html");
        assert!(response.is_success());
        assert_eq!(response.text().unwrap(), "<html>");
    }

    #[test]
    fn test_redirects_and_errors_are_not_success() {
        assert!(!HttpResponse::new(304, Bytes::new()).is_success());
        assert!(!HttpResponse::new(503, Bytes::new()).is_success());
    }
}
