use thiserror::Error;

/// Typed error taxonomy for the domain-sale lookup pipeline.
///
/// Validation-category variants (`SchemaValidation`, `FieldValidation`,
/// `SizeExceeded`) never escape the per-record loop in the resolver/API
/// boundary: they are converted to strings and appended to
/// `Response.errors`. Transport-category variants (`DnssecValidation`,
/// `Timeout`, `RdapError`) are likewise caught once at the API facade.
/// `get_status` never returns this type directly to a caller; it is always
/// folded into a `Response`.
#[derive(Error, Debug)]
pub enum DomainSaleError {
    #[error("DNSSEC validation failed for {0}")]
    DnssecValidation(String),

    #[error("operation timed out after {0}s")]
    Timeout(u64),

    #[error("schema validation failed: {0}")]
    SchemaValidation(String),

    #[error("field validation failed: {field}: {reason}")]
    FieldValidation { field: String, reason: String },

    #[error("payload exceeded 255 bytes ({0} bytes)")]
    SizeExceeded(usize),

    #[error("RDAP error: {0}")]
    RdapError(String),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for DomainSaleError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DomainSaleError::Timeout(0)
        } else {
            DomainSaleError::RdapError(err.to_string())
        }
    }
}
