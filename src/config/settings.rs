//! Client Configuration
//!
//! Defines the configuration schema for a pull client.

use crate::auth::DEFAULT_RAM_METADATA_URL;
use crate::error::{DiamondError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Port the address server and config servers listen on
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Everything a pull needs to know
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiamondConfig {
    /// Host of the address server used for discovery
    #[serde(default)]
    pub endpoint: String,

    /// Static access key; takes precedence over the RAM role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    /// Static secret key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,

    /// RAM role whose credentials come from instance metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram_role_name: Option<String>,

    /// Tenant the config lives in
    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub data_id: String,

    /// Comma separated group names, fetched in order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<String>,

    #[serde(default = "default_server_port")]
    pub server_port: u16,

    /// Base URL the RAM role name is appended to
    #[serde(default = "default_ram_metadata_url")]
    pub ram_metadata_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_server_port() -> u16 {
    DEFAULT_SERVER_PORT
}

fn default_ram_metadata_url() -> String {
    DEFAULT_RAM_METADATA_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for DiamondConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_key: None,
            secret_key: None,
            ram_role_name: None,
            namespace: String::new(),
            data_id: String::new(),
            groups: None,
            server_port: DEFAULT_SERVER_PORT,
            ram_metadata_url: default_ram_metadata_url(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl DiamondConfig {
    /// Group names in request order.
    ///
    /// Tokens are kept verbatim, whitespace included. Empty when no group
    /// list is configured.
    pub fn group_names(&self) -> Vec<&str> {
        match self.groups.as_deref() {
            Some(groups) if !groups.is_empty() => groups.split(',').collect(),
            _ => Vec::new(),
        }
    }

    pub fn access_key(&self) -> Option<&str> {
        non_empty(&self.access_key)
    }

    pub fn secret_key(&self) -> Option<&str> {
        non_empty(&self.secret_key)
    }

    pub fn ram_role_name(&self) -> Option<&str> {
        non_empty(&self.ram_role_name)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check the fields a network pull cannot do without
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(DiamondError::Config(
                "endpoint must be set to discover config servers".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(DiamondError::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
