use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::error::DomainSaleError;

const RDAP_BOOTSTRAP_URL: &str = "https://data.iana.org/rdap/dns.json";

#[derive(Debug, Deserialize)]
struct RdapBootstrapDocument {
    services: Vec<RdapService>,
}

/// Each service entry is `[[tld, tld, ...], [baseUrl, baseUrl, ...]]`.
type RdapService = (Vec<String>, Vec<String>);

#[derive(Debug, Deserialize)]
struct RdapDomainResponse {
    #[serde(default)]
    status: Vec<String>,
}

struct Bootstrap {
    /// TLD (lowercase, no leading dot) -> ordered base URLs.
    table: HashMap<String, Vec<String>>,
    fetched_at: Instant,
}

/// RDAP client. Owns the bootstrap table across lookups; refreshed lazily
/// when absent or older than its TTL. A failed refresh never serves stale
/// entries — it surfaces as `RdapError` instead.
pub struct RdapClient {
    http: reqwest::Client,
    bootstrap: Mutex<Option<Bootstrap>>,
    bootstrap_ttl: Duration,
}

impl RdapClient {
    pub fn new(bootstrap_ttl: Duration) -> Result<Self, DomainSaleError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(DomainSaleError::from)?;

        Ok(RdapClient {
            http,
            bootstrap: Mutex::new(None),
            bootstrap_ttl,
        })
    }

    /// `true`/`false` if the domain's RDAP `status` array does/doesn't
    /// contain the literal tag `for-sale`.
    pub async fn is_for_sale(
        &self,
        domain: &str,
        timeout: Duration,
    ) -> Result<bool, DomainSaleError> {
        let base = self.find_rdap_server(domain, timeout).await?;
        let url = format!("{}/domain/{}", base.trim_end_matches('/'), domain);

        let response = tokio::time::timeout(
            timeout,
            self.http
                .get(&url)
                .header("Accept", "application/rdap+json")
                .send(),
        )
        .await
        .map_err(|_| DomainSaleError::Timeout(timeout.as_secs()))?
        .map_err(DomainSaleError::from)?;

        if !response.status().is_success() {
            return Err(DomainSaleError::RdapError(format!(
                "RDAP server returned {}",
                response.status()
            )));
        }

        let body: RdapDomainResponse = response.json().await.map_err(DomainSaleError::from)?;
        Ok(body.status.iter().any(|s| s == "for-sale"))
    }

    async fn find_rdap_server(
        &self,
        domain: &str,
        timeout: Duration,
    ) -> Result<String, DomainSaleError> {
        self.ensure_bootstrap(timeout).await?;

        let guard = self.bootstrap.lock().unwrap();
        let table = &guard.as_ref().expect("bootstrap just ensured").table;

        let lowercase = domain.to_lowercase();
        let labels: Vec<&str> = lowercase.split('.').collect();

        // Exact match on the registrable suffix guess (everything after
        // the first label), then on the rightmost label alone, then a
        // suffix scan over the bootstrap's own keys.
        if labels.len() >= 2 {
            let candidate = labels[1..].join(".");
            if let Some(urls) = table.get(&candidate) {
                return urls
                    .first()
                    .cloned()
                    .ok_or_else(|| DomainSaleError::RdapError("empty server list".to_string()));
            }
        }

        if let Some(tld) = labels.last() {
            if let Some(urls) = table.get(*tld) {
                return urls
                    .first()
                    .cloned()
                    .ok_or_else(|| DomainSaleError::RdapError("empty server list".to_string()));
            }
        }

        for (known_tld, urls) in table.iter() {
            if lowercase.ends_with(&format!(".{known_tld}")) {
                return urls
                    .first()
                    .cloned()
                    .ok_or_else(|| DomainSaleError::RdapError("empty server list".to_string()));
            }
        }

        Err(DomainSaleError::RdapError(format!(
            "no RDAP server found for {domain}"
        )))
    }

    async fn ensure_bootstrap(&self, timeout: Duration) -> Result<(), DomainSaleError> {
        {
            let guard = self.bootstrap.lock().unwrap();
            if let Some(bootstrap) = guard.as_ref() {
                if bootstrap.fetched_at.elapsed() < self.bootstrap_ttl {
                    return Ok(());
                }
            }
        }

        let response = tokio::time::timeout(timeout, self.http.get(RDAP_BOOTSTRAP_URL).send())
            .await
            .map_err(|_| DomainSaleError::Timeout(timeout.as_secs()))?
            .map_err(DomainSaleError::from)?;

        if !response.status().is_success() {
            return Err(DomainSaleError::RdapError(format!(
                "bootstrap fetch returned {}",
                response.status()
            )));
        }

        let document: RdapBootstrapDocument =
            response.json().await.map_err(DomainSaleError::from)?;

        let mut table = HashMap::new();
        for (tlds, urls) in document.services {
            for tld in tlds {
                table.insert(tld.to_lowercase(), urls.clone());
            }
        }

        tracing::info!(entries = table.len(), "refreshed RDAP bootstrap table");

        *self.bootstrap.lock().unwrap() = Some(Bootstrap {
            table,
            fetched_at: Instant::now(),
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_document_parses_tuple_shaped_services() {
        let json = r#"{"services":[[["com","net"],["https://rdap.verisign.com/"]]]}"#;
        let doc: RdapBootstrapDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.services.len(), 1);
        assert_eq!(doc.services[0].0, vec!["com", "net"]);
    }

    #[test]
    fn domain_response_defaults_status_when_absent() {
        let json = r#"{"objectClassName":"domain"}"#;
        let resp: RdapDomainResponse = serde_json::from_str(json).unwrap();
        assert!(resp.status.is_empty());
    }

    #[test]
    fn domain_response_detects_for_sale_tag() {
        let json = r#"{"status":["active","for-sale"]}"#;
        let resp: RdapDomainResponse = serde_json::from_str(json).unwrap();
        assert!(resp.status.iter().any(|s| s == "for-sale"));
    }
}
