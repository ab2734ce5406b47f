//! Diamond Pull - remote configuration pull client
//!
//! Fetches configuration groups from a Diamond-style config service and
//! merges them into one JSON object. A pull discovers the config server pool
//! through the address server, resolves credentials (static keys or a RAM
//! role via instance metadata), then requests every configured group with a
//! signed GET.
//!
//! Discovery and credential failures abort the pull. Failures of a single
//! group are logged and leave that group out of the result.

use serde_json::{Map, Value};
use tracing::debug;

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod router;

use auth::CredentialProvider;
use client::{FetchContext, GroupConfigFetcher, HttpTransport, Transport};
use config::{ConfigLoader, DiamondConfig};
use error::Result;
use router::{ServerListResolver, ServerSelector};

pub use client::{ConfigEntry, GroupFetch};
pub use error::{DiamondError, FetchFailure};

/// Entries of all requested groups; later groups win on key collisions
pub type MergedConfig = Map<String, Value>;

/// The pull client
///
/// Server pool and RAM credentials are cached on the instance and reused by
/// every [`pull`](DiamondClient::pull).
pub struct DiamondClient<T = HttpTransport> {
    /// Client configuration
    config: DiamondConfig,

    /// HTTP capability used for every request
    transport: T,

    /// Cached config server pool
    servers: ServerListResolver,

    /// Random server choice per group fetch
    selector: ServerSelector,

    /// Static or RAM role credentials
    credentials: CredentialProvider,
}

impl DiamondClient<HttpTransport> {
    /// Create a new client with configuration from default locations
    pub fn new() -> Result<Self> {
        let loader = ConfigLoader::new()?;
        Self::from_config(loader.into_config())
    }

    /// Create a client with a custom config path
    pub fn with_config_path(path: &str) -> Result<Self> {
        let loader = ConfigLoader::from_path(path)?;
        Self::from_config(loader.into_config())
    }

    /// Create a client from a config object
    pub fn from_config(config: DiamondConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout())?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> DiamondClient<T> {
    /// Create a client that sends its requests through `transport`
    pub fn with_transport(config: DiamondConfig, transport: T) -> Self {
        Self {
            servers: ServerListResolver::new(config.server_port),
            selector: ServerSelector::new(),
            credentials: CredentialProvider::new(config.ram_metadata_url.clone()),
            config,
            transport,
        }
    }

    /// Make server selection reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.selector = ServerSelector::seeded(seed);
        self
    }

    /// Configuration this client pulls with
    pub fn config(&self) -> &DiamondConfig {
        &self.config
    }

    /// Fetch every configured group and merge the results.
    ///
    /// Without a group list this returns an empty map and makes no requests.
    pub async fn pull(&self) -> Result<MergedConfig> {
        let groups = self.config.group_names();
        if groups.is_empty() {
            debug!("No config groups requested");
            return Ok(MergedConfig::new());
        }

        self.config.validate()?;

        let servers = self
            .servers
            .ensure(&self.transport, &self.config.endpoint)
            .await?;

        let credentials = self
            .credentials
            .resolve(
                &self.transport,
                self.config.access_key(),
                self.config.secret_key(),
                self.config.ram_role_name(),
            )
            .await?;

        let ctx = FetchContext {
            namespace: &self.config.namespace,
            data_id: &self.config.data_id,
            credentials: &credentials,
        };
        let fetcher =
            GroupConfigFetcher::new(&self.transport, &self.selector, self.config.server_port);

        let mut merged = MergedConfig::new();
        for group in groups {
            if let Some(entry) = fetcher.fetch(group, &ctx, &servers).await.into_entry() {
                merged.extend(entry);
            }
        }

        Ok(merged)
    }
}
