//! Router Module
//!
//! Config server discovery and per-request server selection.

pub mod selector;
pub mod server_list;

pub use selector::ServerSelector;
pub use server_list::{ServerList, ServerListResolver, DISCOVERY_PATH};
