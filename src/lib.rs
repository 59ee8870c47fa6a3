//! # domainsale
//!
//! Determines whether a domain advertises itself as "for sale" by
//! resolving a DNSSEC-validated `_for-sale` TXT record, validating its
//! payload against a closed JSON schema with sanitized field formats, and
//! optionally corroborating the claim against the domain's RDAP `status`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use domainsale::{DomainSaleClient, DomainSaleOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DomainSaleClient::new()?;
//!     let response = client.get_status("example.com", &DomainSaleOptions::default()).await;
//!     println!("for sale: {}", response.for_sale);
//!     Ok(())
//! }
//! ```
//!
//! A process-wide convenience client is available via [`default_client`]
//! for callers who don't need per-call isolation (most tests should
//! construct their own [`DomainSaleClient`] instead).

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod rdap;
pub mod renderer;
pub mod resolver;
pub mod validator;

pub use api::DomainSaleClient;
pub use config::Config;
pub use error::DomainSaleError;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Per-call options. Defaults mirror `spec.md` §4.6: RDAP off, 300s cache
/// TTL, 5s timeout.
#[derive(Debug, Clone)]
pub struct DomainSaleOptions {
    pub enable_rdap_check: bool,
    pub cache_ttl_sec: u64,
    pub timeout_sec: u64,
}

impl Default for DomainSaleOptions {
    fn default() -> Self {
        let config = Config::default();
        DomainSaleOptions {
            enable_rdap_check: config.enable_rdap_check,
            cache_ttl_sec: config.cache_ttl_sec,
            timeout_sec: config.timeout_sec,
        }
    }
}

/// Result of a lookup. Serializes with the exact field names in
/// `spec.md` §6, including the camelCase `forSale` (the rest of the
/// struct is already `camelCase`-compatible without renaming).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub domain: String,
    #[serde(rename = "forSale")]
    pub for_sale: bool,
    pub price: Option<String>,
    pub url: Option<String>,
    pub contact: Option<String>,
    pub expires: Option<String>,
    pub source: Vec<String>,
    pub errors: Vec<String>,
}

static DEFAULT_CLIENT: OnceCell<Arc<DomainSaleClient>> = OnceCell::new();

/// Lazily-initialized process-wide client, for callers who just want to
/// call `get_status` without managing a `DomainSaleClient` themselves.
/// Each call to [`DomainSaleClient::new`] owns its own caches, so prefer
/// constructing one explicitly in tests that need isolation.
pub fn default_client() -> Result<Arc<DomainSaleClient>, DomainSaleError> {
    if let Some(client) = DEFAULT_CLIENT.get() {
        return Ok(client.clone());
    }
    let client = Arc::new(DomainSaleClient::new()?);
    let _ = DEFAULT_CLIENT.set(client.clone());
    Ok(DEFAULT_CLIENT.get().expect("just set").clone())
}

/// Convenience free function mirroring the original module-level
/// `get_domain_sale_status`, using the lazily-initialized default client.
pub async fn get_status(domain: &str, options: &DomainSaleOptions) -> Result<Response, DomainSaleError> {
    let client = default_client()?;
    Ok(client.get_status(domain, options).await)
}
