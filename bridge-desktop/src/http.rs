//! `reqwest` client for the shell router's network path.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse},
};
use reqwest::Client;
use tracing::debug;

/// Single-attempt fetches. A failed request is answered from the shell
/// cache by the router, so there is nothing to gain from retrying here.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(15))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("onetap-player/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BridgeError::NotAvailable(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }

    fn build(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(Self::method(request.method), &request.url);
        for (key, value) in request.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        builder
    }
}

/// Unreachable hosts read as "offline"; anything else is a failed fetch.
fn transport_error(e: reqwest::Error) -> BridgeError {
    if e.is_connect() || e.is_timeout() {
        BridgeError::NotAvailable(e.to_string())
    } else {
        BridgeError::OperationFailed(e.to_string())
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let key = request.cache_key();
        let response = self.build(request).send().await.map_err(transport_error)?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_string())))
            .collect();
        let body = response.bytes().await.map_err(transport_error)?;
        debug!(request = %key, status, bytes = body.len(), "Fetched");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_carries_method_and_headers() {
        let client = ReqwestHttpClient::new().unwrap();
        let request = client
            .build(HttpRequest::new(HttpMethod::Head, "https://app.example/").header("x-shell", "1"))
            .build()
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::HEAD);
        assert_eq!(request.headers().get("x-shell").unwrap(), "1");
    }

    #[tokio::test]
    async fn test_refused_connection_reads_as_offline() {
        let client = ReqwestHttpClient::new().unwrap();
        let err = client
            .execute(HttpRequest::get("http://127.0.0.1:1/index.html"))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotAvailable(_)));
    }
}
