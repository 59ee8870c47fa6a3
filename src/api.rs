use std::sync::Arc;
use std::time::Duration;

use chrono::Local;

use crate::cache::{cached, Cache};
use crate::config::Config;
use crate::error::DomainSaleError;
use crate::rdap::RdapClient;
use crate::resolver::Resolver;
use crate::validator;
use crate::{DomainSaleOptions, Response};

/// Owns the resources a lookup needs: the DNS resolver, the RDAP client,
/// and two independent TTL caches (`dns:<domain>`, `rdap:<domain>`). An
/// explicit owned value rather than process-wide globals, so tests (and
/// multiple callers in one process) can run in parallel without sharing
/// state; [`crate::default_client`] provides a lazily-initialized
/// convenience instance for callers who don't need that isolation.
pub struct DomainSaleClient {
    resolver: Resolver,
    rdap: RdapClient,
    dns_cache: Cache<Vec<String>>,
    rdap_cache: Cache<bool>,
    config: Config,
}

impl DomainSaleClient {
    pub fn new() -> Result<Self, DomainSaleError> {
        Self::with_config(Config::load()?)
    }

    pub fn with_config(config: Config) -> Result<Self, DomainSaleError> {
        Ok(DomainSaleClient {
            resolver: Resolver::new()?,
            rdap: RdapClient::new(Duration::from_secs(config.rdap_bootstrap_ttl_sec))?,
            dns_cache: Cache::new(),
            rdap_cache: Cache::new(),
            config,
        })
    }

    /// Runs the full pipeline in `spec.md` §4.6: cached DNS lookup,
    /// per-record validation, then an optional cached RDAP corroboration
    /// step. Never returns an error directly — every failure is folded
    /// into `Response.errors` and `for_sale=false`.
    pub async fn get_status(&self, domain: &str, options: &DomainSaleOptions) -> Response {
        let timeout = Duration::from_secs(options.timeout_sec);
        let ttl = Duration::from_secs(options.cache_ttl_sec);

        let mut errors = Vec::new();

        let payloads = match self.cached_dns_lookup(domain, timeout, ttl).await {
            Ok(payloads) => payloads,
            Err(err) => {
                errors.push(err.to_string());
                return Response {
                    domain: domain.to_string(),
                    for_sale: false,
                    price: None,
                    url: None,
                    contact: None,
                    expires: None,
                    source: Vec::new(),
                    errors,
                };
            }
        };

        let today = Local::now().date_naive();
        let mut validated = None;
        for payload in &payloads {
            match validator::extract(payload, today) {
                Ok(Some(record)) => {
                    validated = Some(record);
                    break;
                }
                Ok(None) => continue,
                Err(err) => errors.push(err.to_string()),
            }
        }

        let Some(record) = validated else {
            return Response {
                domain: domain.to_string(),
                for_sale: false,
                price: None,
                url: None,
                contact: None,
                expires: None,
                source: Vec::new(),
                errors,
            };
        };

        if !options.enable_rdap_check {
            return Response {
                domain: domain.to_string(),
                for_sale: true,
                price: Some(record.price),
                url: Some(record.url),
                contact: Some(record.contact),
                expires: record.expires,
                source: vec!["dns".to_string()],
                errors,
            };
        }

        match self.cached_rdap_check(domain, timeout, ttl).await {
            Ok(true) => Response {
                domain: domain.to_string(),
                for_sale: true,
                price: Some(record.price),
                url: Some(record.url),
                contact: Some(record.contact),
                expires: record.expires,
                source: vec!["dns".to_string(), "rdap".to_string()],
                errors,
            },
            Ok(false) => {
                // DNS validated but RDAP disagrees: a policy decision, not
                // an error — the two-source mismatch is not surfaced as a
                // typed failure, per the asymmetric corroboration policy.
                Response {
                    domain: domain.to_string(),
                    for_sale: false,
                    price: None,
                    url: None,
                    contact: None,
                    expires: None,
                    source: Vec::new(),
                    errors,
                }
            }
            Err(err) => {
                errors.push(err.to_string());
                Response {
                    domain: domain.to_string(),
                    for_sale: false,
                    price: None,
                    url: None,
                    contact: None,
                    expires: None,
                    source: Vec::new(),
                    errors,
                }
            }
        }
    }

    async fn cached_dns_lookup(
        &self,
        domain: &str,
        timeout: Duration,
        ttl: Duration,
    ) -> Result<Vec<String>, DomainSaleError> {
        let key = format!("dns:{domain}");
        cached(&self.dns_cache, &key, ttl, || async {
            self.resolver.lookup(domain, timeout).await
        })
        .await
    }

    async fn cached_rdap_check(
        &self,
        domain: &str,
        timeout: Duration,
        ttl: Duration,
    ) -> Result<bool, DomainSaleError> {
        let key = format!("rdap:{domain}");
        cached(&self.rdap_cache, &key, ttl, || async {
            self.rdap.is_for_sale(domain, timeout).await
        })
        .await
    }

    /// The layered config this client was constructed with (built-in
    /// defaults overridden by `DOMAINSALE_*` environment variables). Callers
    /// that want per-call overrides on top of it should start from
    /// [`default_options`] rather than `DomainSaleOptions::default()`, which
    /// only sees the hardcoded built-in defaults.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

pub fn default_options(config: &Config) -> DomainSaleOptions {
    DomainSaleOptions {
        enable_rdap_check: config.enable_rdap_check,
        cache_ttl_sec: config.cache_ttl_sec,
        timeout_sec: config.timeout_sec,
    }
}

pub type SharedClient = Arc<DomainSaleClient>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_follow_config() {
        let config = Config::default();
        let options = default_options(&config);
        assert!(!options.enable_rdap_check);
        assert_eq!(options.cache_ttl_sec, 300);
        assert_eq!(options.timeout_sec, 5);
    }
}
