//! Client Module
//!
//! HTTP transport and single-group config fetching.

pub mod fetcher;
pub mod http;

pub use fetcher::{ConfigEntry, FetchContext, GroupConfigFetcher, GroupFetch, CONFIG_PATH};
pub use http::{HttpResponse, HttpTransport, Transport};
