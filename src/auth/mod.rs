//! Auth Module
//!
//! Credential resolution and request signing.

pub mod credentials;
pub mod signer;

pub use credentials::{
    CredentialProvider, Credentials, ResolvedCredentials, DEFAULT_RAM_METADATA_URL,
    SECURITY_TOKEN_HEADER,
};
pub use signer::{sign, sign_at, RequestSignature};
