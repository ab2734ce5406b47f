//! Credential Resolution
//!
//! Credentials come either from configuration (access key + secret key) or
//! from the instance metadata service for a RAM role. Role credentials are
//! cached per role and refreshed once they get within a minute of expiring.

use crate::client::{HttpResponse, Transport};
use crate::error::{DiamondError, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue};
use serde::Deserialize;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

/// Header carrying the RAM security token
pub const SECURITY_TOKEN_HEADER: HeaderName = HeaderName::from_static("spas-securitytoken");

/// Default metadata endpoint for RAM role credentials
pub const DEFAULT_RAM_METADATA_URL: &str =
    "http://100.100.100.200/latest/meta-data/ram/security-credentials/";

/// Credentials are refreshed this long before they expire
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Access credentials, static or issued for a RAM role
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(rename = "AccessKeyId")]
    pub access_key: String,

    #[serde(rename = "AccessKeySecret")]
    pub secret_key: String,

    #[serde(rename = "SecurityToken", default)]
    pub security_token: Option<String>,

    #[serde(rename = "Expiration", default)]
    pub expiration: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Credentials supplied directly by configuration
    pub fn fixed(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            security_token: None,
            expiration: None,
        }
    }

    /// Whether these credentials must be refreshed at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiration {
            Some(expiration) => now + Duration::seconds(EXPIRY_MARGIN_SECS) >= expiration,
            None => false,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Keys and extra headers to sign and send a config request with
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub access_key: String,
    pub secret_key: String,
    pub security_token: Option<String>,
}

impl ResolvedCredentials {
    /// Headers that only dynamic credentials contribute
    pub fn security_headers(&self) -> std::result::Result<HeaderMap, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.security_token {
            headers.insert(SECURITY_TOKEN_HEADER, HeaderValue::from_str(token)?);
        }
        Ok(headers)
    }
}

impl From<Credentials> for ResolvedCredentials {
    fn from(creds: Credentials) -> Self {
        Self {
            access_key: creds.access_key,
            secret_key: creds.secret_key,
            security_token: creds.security_token,
        }
    }
}

/// Resolves credentials and owns the RAM role cache
#[derive(Debug)]
pub struct CredentialProvider {
    /// Base URL the role name is appended to
    metadata_url: String,

    /// Role name -> last issued credentials
    cache: Mutex<HashMap<String, Credentials>>,
}

impl CredentialProvider {
    pub fn new(metadata_url: impl Into<String>) -> Self {
        Self {
            metadata_url: metadata_url.into(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Pick static keys if configured, else the RAM role, else nothing.
    ///
    /// Empty strings count as unset. With neither configured the result has
    /// empty keys; requests are still signed, the server will reject them.
    pub async fn resolve<T: Transport>(
        &self,
        transport: &T,
        access_key: Option<&str>,
        secret_key: Option<&str>,
        ram_role: Option<&str>,
    ) -> Result<ResolvedCredentials> {
        if let Some(access_key) = access_key.filter(|k| !k.is_empty()) {
            return Ok(Credentials::fixed(access_key, secret_key.unwrap_or_default()).into());
        }

        if let Some(role) = ram_role.filter(|r| !r.is_empty()) {
            return Ok(self.credentials_for(transport, role).await?.into());
        }

        Ok(ResolvedCredentials::default())
    }

    /// Cached credentials for `role`, fetching fresh ones when absent or stale
    pub async fn credentials_for<T: Transport>(
        &self,
        transport: &T,
        role: &str,
    ) -> Result<Credentials> {
        let mut cache = self.cache.lock().await;

        if let Some(creds) = cache.get(role) {
            if !creds.is_expired() {
                debug!(role, "Reusing cached RAM credentials");
                return Ok(creds.clone());
            }
        }

        debug!(role, "Fetching RAM credentials");
        let url = format!("{}{}", self.metadata_url, role);
        let response = transport.get(&url, HeaderMap::new(), &[]).await?;
        let creds = parse_credentials(role, response)?;

        cache.insert(role.to_string(), creds.clone());
        Ok(creds)
    }

    /// Current cache entry for a role, if any
    pub async fn cached(&self, role: &str) -> Option<Credentials> {
        self.cache.lock().await.get(role).cloned()
    }
}

fn parse_credentials(role: &str, response: HttpResponse) -> Result<Credentials> {
    if !response.is_ok() {
        return Err(DiamondError::Credentials {
            role: role.to_string(),
            status: response.status,
        });
    }

    let invalid = |reason: String| DiamondError::InvalidCredentials {
        role: role.to_string(),
        reason,
    };

    if response.body.trim().is_empty() {
        return Err(invalid("empty response".to_string()));
    }

    let creds: Credentials =
        serde_json::from_str(&response.body).map_err(|e| invalid(e.to_string()))?;
    if creds.access_key.is_empty() {
        return Err(invalid("missing AccessKeyId".to_string()));
    }
    if let Some(token) = &creds.security_token {
        HeaderValue::from_str(token)
            .map_err(|e| invalid(format!("unusable SecurityToken: {}", e)))?;
    }

    Ok(creds)
}
