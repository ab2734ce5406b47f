//! Group Config Fetcher
//!
//! One signed request for one group against one randomly chosen server.
//! Every failure here is local to the group: it is logged and reported as
//! [`GroupFetch::Skipped`], never as an error.

use crate::auth::{sign, ResolvedCredentials};
use crate::client::Transport;
use crate::error::FetchFailure;
use crate::router::{ServerList, ServerSelector};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

/// Path of the config endpoint on a config server
pub const CONFIG_PATH: &str = "/diamond-server/config.co";

pub const ACCESS_KEY_HEADER: HeaderName = HeaderName::from_static("spas-accesskey");
pub const TIMESTAMP_HEADER: HeaderName = HeaderName::from_static("timestamp");
pub const SIGNATURE_HEADER: HeaderName = HeaderName::from_static("spas-signature");

const CONTENT_TYPE_FORM: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// Config entries returned for one group
pub type ConfigEntry = Map<String, Value>;

/// Outcome of fetching one group
#[derive(Debug, Clone, PartialEq)]
pub enum GroupFetch {
    /// 200 with a JSON object body
    Loaded(ConfigEntry),

    /// 200 with an empty body
    Empty,

    /// Anything else; the group contributes nothing
    Skipped(FetchFailure),
}

impl GroupFetch {
    /// Entries to merge, if any
    pub fn into_entry(self) -> Option<ConfigEntry> {
        match self {
            GroupFetch::Loaded(entry) => Some(entry),
            GroupFetch::Empty | GroupFetch::Skipped(_) => None,
        }
    }
}

/// Request scope shared by every group of one pull
#[derive(Debug, Clone)]
pub struct FetchContext<'a> {
    pub namespace: &'a str,
    pub data_id: &'a str,
    pub credentials: &'a ResolvedCredentials,
}

/// Fetches single groups from config servers
pub struct GroupConfigFetcher<'a, T> {
    transport: &'a T,
    selector: &'a ServerSelector,
    port: u16,
}

impl<'a, T: Transport> GroupConfigFetcher<'a, T> {
    pub fn new(transport: &'a T, selector: &'a ServerSelector, port: u16) -> Self {
        Self {
            transport,
            selector,
            port,
        }
    }

    /// Fetch `group` from a random server in `servers`
    pub async fn fetch(
        &self,
        group: &str,
        ctx: &FetchContext<'_>,
        servers: &ServerList,
    ) -> GroupFetch {
        let Some(server) = self.selector.pick(servers) else {
            error!(group, "No config server available");
            return GroupFetch::Skipped(FetchFailure::NoServer);
        };

        let headers = match build_headers(group, ctx) {
            Ok(headers) => headers,
            Err(e) => {
                error!(group, error = %e, "Failed to build request headers");
                return GroupFetch::Skipped(FetchFailure::Transport(e));
            }
        };

        let url = format!("http://{}:{}{}", server, self.port, CONFIG_PATH);
        let query = [
            ("tenant", ctx.namespace),
            ("dataId", ctx.data_id),
            ("group", group),
        ];

        let response = match self.transport.get(&url, headers, &query).await {
            Ok(response) => response,
            Err(e) => {
                error!(group, server, error = %e, "Get config request failed");
                return GroupFetch::Skipped(FetchFailure::Transport(e.to_string()));
            }
        };

        if response.status == 404 {
            warn!(group, server, "Group not found");
            return GroupFetch::Skipped(FetchFailure::NotFound);
        }

        if !response.is_ok() {
            error!(group, server, status = response.status, "Get config failed");
            return GroupFetch::Skipped(FetchFailure::Status(response.status));
        }

        if response.body.is_empty() {
            return GroupFetch::Empty;
        }

        match serde_json::from_str::<ConfigEntry>(&response.body) {
            Ok(entry) => {
                debug!(group, server, keys = entry.len(), "Loaded config group");
                GroupFetch::Loaded(entry)
            }
            Err(e) => {
                error!(group, server, error = %e, "Config body is not a JSON object");
                GroupFetch::Skipped(FetchFailure::Decode(e.to_string()))
            }
        }
    }
}

fn build_headers(group: &str, ctx: &FetchContext<'_>) -> Result<HeaderMap, String> {
    let creds = ctx.credentials;
    let signed = sign(ctx.namespace, group, &creds.secret_key);

    let mut headers = HeaderMap::new();
    headers.insert(
        ACCESS_KEY_HEADER,
        HeaderValue::from_str(&creds.access_key)
            .map_err(|e| format!("invalid access key header: {}", e))?,
    );
    headers.insert(TIMESTAMP_HEADER, HeaderValue::from(signed.timestamp));
    headers.insert(
        SIGNATURE_HEADER,
        HeaderValue::from_str(&signed.signature)
            .map_err(|e| format!("invalid signature header: {}", e))?,
    );
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_FORM));

    let security = creds
        .security_headers()
        .map_err(|e| format!("invalid security token header: {}", e))?;
    headers.extend(security);

    Ok(headers)
}
