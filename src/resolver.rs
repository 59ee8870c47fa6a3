use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::TokioAsyncResolver;
use std::time::Duration;

use crate::error::DomainSaleError;

const MAX_TXT_BYTES: usize = 255;

/// DNSSEC-validated resolver for the `_for-sale.<domain>` TXT record.
///
/// Construction enables local chain validation (`ResolverOpts::validate =
/// true`) rather than trusting an upstream recursor's AD bit: the resolver
/// performs its own signature verification, so a forwarder that silently
/// strips DNSSEC data cannot make a bogus answer look authentic.
pub struct Resolver {
    resolver: TokioAsyncResolver,
}

impl Resolver {
    pub fn new() -> Result<Self, DomainSaleError> {
        let mut opts = ResolverOpts::default();
        opts.validate = true;

        let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), opts);
        Ok(Resolver { resolver })
    }

    /// Looks up `_for-sale.<domain>` TXT records and returns the
    /// concatenated character strings, dropping (with a log warning) any
    /// whose encoded length exceeds 255 bytes. Never parses the payload.
    ///
    /// An unsigned zone, NXDOMAIN, or NOERROR/NODATA answer is not an
    /// error: it returns an empty list, meaning "no record is present".
    /// A SERVFAIL from the validating chain is reported as
    /// `DnssecValidation`, since that is how this resolver signals a
    /// bogus/failed signature chain on a zone that claims to be signed.
    pub async fn lookup(&self, domain: &str, timeout: Duration) -> Result<Vec<String>, DomainSaleError> {
        let query_name = format!("_for-sale.{domain}");

        let lookup_future = self.resolver.txt_lookup(query_name.clone());
        let lookup_result = tokio::time::timeout(timeout, lookup_future).await;

        let lookup = match lookup_result {
            Err(_elapsed) => return Err(DomainSaleError::Timeout(timeout.as_secs())),
            Ok(Err(err)) => return Self::classify_error(&err),
            Ok(Ok(lookup)) => lookup,
        };

        let mut payloads = Vec::new();
        for record in lookup.iter() {
            let mut bytes = Vec::new();
            for chunk in record.iter() {
                bytes.extend_from_slice(chunk);
            }
            if bytes.len() > MAX_TXT_BYTES {
                tracing::warn!(
                    domain,
                    len = bytes.len(),
                    "dropping oversized _for-sale TXT record"
                );
                continue;
            }
            payloads.push(String::from_utf8_lossy(&bytes).into_owned());
        }

        Ok(payloads)
    }

    fn classify_error(err: &hickory_resolver::error::ResolveError) -> Result<Vec<String>, DomainSaleError> {
        if err.is_nx_domain() {
            return Ok(Vec::new());
        }

        if let ResolveErrorKind::NoRecordsFound { response_code, .. } = err.kind() {
            if *response_code == ResponseCode::ServFail {
                return Err(DomainSaleError::DnssecValidation(err.to_string()));
            }
            return Ok(Vec::new());
        }

        Err(DomainSaleError::Internal(err.to_string()))
    }
}
