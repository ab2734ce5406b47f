//! HTTP Transport
//!
//! The only capability the pull logic needs from the network: a GET with
//! headers and query parameters that yields a status and a body.

use crate::error::{DiamondError, Result};
use reqwest::header::HeaderMap;
use reqwest::Client;
use std::future::Future;
use std::time::Duration;

/// Status and body of a completed HTTP exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Issues GET requests for the client.
///
/// Any status the server answers with is returned as an [`HttpResponse`].
/// `Err` is reserved for exchanges that never produced a status: connection
/// failures, timeouts, invalid requests.
pub trait Transport: Send + Sync {
    fn get(
        &self,
        url: &str,
        headers: HeaderMap,
        query: &[(&str, &str)],
    ) -> impl Future<Output = Result<HttpResponse>> + Send;
}

/// Transport backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Inner reqwest client
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the given request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| DiamondError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        headers: HeaderMap,
        query: &[(&str, &str)],
    ) -> Result<HttpResponse> {
        let mut request = self.client.get(url).headers(headers);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(HttpResponse { status, body })
    }
}
