//! Server Discovery
//!
//! The address server publishes the config server pool as a newline
//! separated list. The pool is fetched once and kept for the lifetime of
//! the client; only an empty pool triggers another discovery.

use crate::client::Transport;
use crate::error::{DiamondError, Result};
use reqwest::header::HeaderMap;
use tokio::sync::Mutex;
use tracing::{debug, error};

/// Path of the server list on the address server
pub const DISCOVERY_PATH: &str = "/diamond-server/diamond";

/// Ordered pool of config server addresses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerList {
    servers: Vec<String>,
}

impl ServerList {
    pub fn new(servers: Vec<String>) -> Self {
        Self { servers }
    }

    /// Parse a discovery body, dropping empty lines
    pub fn parse(body: &str) -> Self {
        let servers = body
            .split('\n')
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { servers }
    }

    pub fn servers(&self) -> &[String] {
        &self.servers
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }
}

/// Discovers the server pool and caches it
#[derive(Debug)]
pub struct ServerListResolver {
    /// Port the address server and config servers listen on
    port: u16,

    cached: Mutex<ServerList>,
}

impl ServerListResolver {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            cached: Mutex::new(ServerList::default()),
        }
    }

    /// Return the cached pool, discovering it first if it is empty
    pub async fn ensure<T: Transport>(
        &self,
        transport: &T,
        endpoint: &str,
    ) -> Result<ServerList> {
        let mut cached = self.cached.lock().await;
        if !cached.is_empty() {
            return Ok(cached.clone());
        }

        let url = format!("http://{}:{}{}", endpoint, self.port, DISCOVERY_PATH);
        debug!(%url, "Discovering config servers");

        let response = transport.get(&url, HeaderMap::new(), &[]).await?;
        if !response.is_ok() {
            return Err(DiamondError::Discovery {
                endpoint: endpoint.to_string(),
                status: response.status,
            });
        }

        let servers = ServerList::parse(&response.body);
        if servers.is_empty() {
            error!(endpoint, "Server discovery returned no servers");
        } else {
            debug!(count = servers.len(), "Discovered config servers");
        }

        *cached = servers.clone();
        Ok(servers)
    }

    /// Snapshot of the cached pool
    pub async fn cached(&self) -> ServerList {
        self.cached.lock().await.clone()
    }
}
