use serde::{Deserialize, Serialize};

use crate::error::DomainSaleError;

const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_TIMEOUT_SECS: u64 = 5;
const DEFAULT_RDAP_BOOTSTRAP_TTL_SECS: u64 = 3600;
const DEFAULT_RDAP_ENABLED: bool = false;

/// Process-wide defaults, loaded once and overridable per-call via
/// [`crate::DomainSaleOptions`].
///
/// Layering follows the `config` crate's usual builder pattern: built-in
/// defaults first, then `DOMAINSALE_*` environment variables on top.
#[derive(Debug, Clone)]
pub struct Config {
    pub cache_ttl_sec: u64,
    pub timeout_sec: u64,
    pub rdap_bootstrap_ttl_sec: u64,
    pub enable_rdap_check: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigData {
    cache_ttl_sec: u64,
    timeout_sec: u64,
    rdap_bootstrap_ttl_sec: u64,
    enable_rdap_check: bool,
}

impl Config {
    pub fn load() -> Result<Self, DomainSaleError> {
        let mut builder = config::Config::builder()
            .set_default("cache_ttl_sec", DEFAULT_CACHE_TTL_SECS)?
            .set_default("timeout_sec", DEFAULT_TIMEOUT_SECS)?
            .set_default("rdap_bootstrap_ttl_sec", DEFAULT_RDAP_BOOTSTRAP_TTL_SECS)?
            .set_default("enable_rdap_check", DEFAULT_RDAP_ENABLED)?;

        builder = Self::apply_env_overrides(builder)?;

        let data: ConfigData = builder.build()?.try_deserialize()?;

        Ok(Config {
            cache_ttl_sec: data.cache_ttl_sec,
            timeout_sec: data.timeout_sec,
            rdap_bootstrap_ttl_sec: data.rdap_bootstrap_ttl_sec,
            enable_rdap_check: data.enable_rdap_check,
        })
    }

    fn apply_env_overrides(
        mut builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
        let env_mappings = [
            ("DOMAINSALE_CACHE_TTL_SEC", "cache_ttl_sec"),
            ("DOMAINSALE_TIMEOUT_SEC", "timeout_sec"),
            ("DOMAINSALE_RDAP_BOOTSTRAP_TTL_SEC", "rdap_bootstrap_ttl_sec"),
            ("DOMAINSALE_ENABLE_RDAP_CHECK", "enable_rdap_check"),
        ];

        for (env_var, key) in env_mappings {
            if let Ok(value) = std::env::var(env_var) {
                builder = builder.set_override(key, value)?;
            }
        }

        Ok(builder)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cache_ttl_sec: DEFAULT_CACHE_TTL_SECS,
            timeout_sec: DEFAULT_TIMEOUT_SECS,
            rdap_bootstrap_ttl_sec: DEFAULT_RDAP_BOOTSTRAP_TTL_SECS,
            enable_rdap_check: DEFAULT_RDAP_ENABLED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let cfg = Config::default();
        assert_eq!(cfg.cache_ttl_sec, 300);
        assert_eq!(cfg.timeout_sec, 5);
        assert_eq!(cfg.rdap_bootstrap_ttl_sec, 3600);
        assert!(!cfg.enable_rdap_check);
    }
}
