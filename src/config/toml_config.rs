use crate::core::orchestrator::OrchestratorConfig;
use crate::core::retry::{BackoffConfig, RetryPolicy};
use crate::utils::error::{ConnectorError, Result};
use crate::utils::validation;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// File-based connector configuration.
///
/// Every section beyond `source` and `store` is optional; omitted values
/// fall back to the built-in policies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub source: SourceSection,
    pub store: StoreSection,
    pub sync: Option<SyncSection>,
    pub retry: Option<RetrySection>,
    pub cache: Option<CacheSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    pub base_url: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    pub output_path: String,
    pub collection: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSection {
    pub default_limit: Option<usize>,
    pub max_concurrent_writes: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySection {
    pub fetch: Option<RetryParams>,
    pub write: Option<RetryParams>,
    pub pipeline: Option<RetryParams>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryParams {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
    pub jitter: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSection {
    pub max_entries: Option<usize>,
    pub ttl_seconds: Option<u64>,
}

impl RetryParams {
    fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            BackoffConfig {
                initial_delay: Duration::from_millis(self.initial_delay_ms),
                multiplier: self.multiplier,
                max_delay: Duration::from_millis(self.max_delay_ms),
                jitter: self.jitter.unwrap_or(true),
            },
        )
    }
}

impl SyncConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| ConnectorError::Config {
            message: format!("{}: {e}", path.as_ref().display()),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);
        toml::from_str(&processed).map_err(|e| ConnectorError::Config {
            message: format!("TOML parsing error: {e}"),
        })
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("source.base_url", &self.source.base_url)?;
        validation::validate_non_empty_string("store.output_path", &self.store.output_path)?;

        if let Some(collection) = self.store.collection.as_deref() {
            validation::validate_non_empty_string("store.collection", collection)?;
        }
        if let Some(sync) = &self.sync {
            if let Some(limit) = sync.default_limit {
                validation::validate_range("sync.default_limit", limit, 1, 100)?;
            }
            if let Some(concurrency) = sync.max_concurrent_writes {
                validation::validate_positive_number("sync.max_concurrent_writes", concurrency, 1)?;
            }
        }
        if let Some(cache) = &self.cache {
            if let Some(max_entries) = cache.max_entries {
                validation::validate_positive_number("cache.max_entries", max_entries, 1)?;
            }
        }
        Ok(())
    }

    pub fn collection(&self) -> &str {
        self.store.collection.as_deref().unwrap_or("issues")
    }

    pub fn default_limit(&self) -> usize {
        self.sync
            .as_ref()
            .and_then(|s| s.default_limit)
            .unwrap_or(crate::core::orchestrator::DEFAULT_LIMIT)
    }

    /// Assemble the runtime orchestrator configuration, filling gaps with
    /// the built-in policies.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let defaults = OrchestratorConfig::default();
        let retry = self.retry.as_ref();

        OrchestratorConfig {
            fetch_policy: retry
                .and_then(|r| r.fetch.as_ref())
                .map(RetryParams::to_policy)
                .unwrap_or(defaults.fetch_policy),
            write_policy: retry
                .and_then(|r| r.write.as_ref())
                .map(RetryParams::to_policy)
                .unwrap_or(defaults.write_policy),
            pipeline_policy: retry
                .and_then(|r| r.pipeline.as_ref())
                .map(RetryParams::to_policy)
                .unwrap_or(defaults.pipeline_policy),
            max_concurrent_writes: self
                .sync
                .as_ref()
                .and_then(|s| s.max_concurrent_writes)
                .unwrap_or(defaults.max_concurrent_writes),
            cache_max_entries: self
                .cache
                .as_ref()
                .and_then(|c| c.max_entries)
                .unwrap_or(defaults.cache_max_entries),
            cache_ttl: self
                .cache
                .as_ref()
                .and_then(|c| c.ttl_seconds)
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
        }
    }
}

/// Replace `${VAR_NAME}` placeholders with environment values; unknown
/// variables are left as-is.
fn substitute_env_vars(content: &str) -> String {
    use regex::Regex;
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{var_name}}}"))
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [source]
        base_url = "https://api.github.com"

        [store]
        output_path = "./data"
    "#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = SyncConfig::from_toml_str(MINIMAL).unwrap();
        config.validate_config().unwrap();

        assert_eq!(config.collection(), "issues");
        assert_eq!(config.default_limit(), 30);

        let runtime = config.orchestrator_config();
        assert_eq!(runtime.max_concurrent_writes, 8);
        assert_eq!(runtime.fetch_policy.max_attempts, 3);
        assert_eq!(runtime.pipeline_policy.max_attempts, 2);
    }

    #[test]
    fn test_full_config_overrides() {
        let config = SyncConfig::from_toml_str(
            r#"
            [source]
            base_url = "https://git.internal.example.com"
            timeout_seconds = 10

            [store]
            output_path = "/var/lib/issue-sync"
            collection = "tickets"

            [sync]
            default_limit = 50
            max_concurrent_writes = 4

            [retry.fetch]
            max_attempts = 5
            initial_delay_ms = 100
            multiplier = 3.0
            max_delay_ms = 2000
            jitter = false

            [cache]
            max_entries = 256
            ttl_seconds = 60
            "#,
        )
        .unwrap();
        config.validate_config().unwrap();

        assert_eq!(config.collection(), "tickets");
        assert_eq!(config.default_limit(), 50);

        let runtime = config.orchestrator_config();
        assert_eq!(runtime.fetch_policy.max_attempts, 5);
        assert!(!runtime.fetch_policy.backoff.jitter);
        assert_eq!(runtime.max_concurrent_writes, 4);
        assert_eq!(runtime.cache_max_entries, 256);
        assert_eq!(runtime.cache_ttl, Duration::from_secs(60));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = SyncConfig::from_toml_str(
            r#"
            [source]
            base_url = "ftp://example.com"

            [store]
            output_path = "./data"
            "#,
        )
        .unwrap();
        assert!(config.validate_config().is_err());
    }

    #[test]
    fn test_limit_out_of_range_rejected() {
        let config = SyncConfig::from_toml_str(
            r#"
            [source]
            base_url = "https://api.github.com"

            [store]
            output_path = "./data"

            [sync]
            default_limit = 500
            "#,
        )
        .unwrap();
        assert!(config.validate_config().is_err());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("ISSUE_SYNC_TEST_URL", "https://api.github.com");
        let config = SyncConfig::from_toml_str(
            r#"
            [source]
            base_url = "${ISSUE_SYNC_TEST_URL}"

            [store]
            output_path = "./data"
            "#,
        )
        .unwrap();
        assert_eq!(config.source.base_url, "https://api.github.com");
        std::env::remove_var("ISSUE_SYNC_TEST_URL");
    }

    #[test]
    fn test_unknown_env_var_left_in_place() {
        let out = substitute_env_vars("url = \"${DEFINITELY_NOT_SET_ANYWHERE}\"");
        assert!(out.contains("${DEFINITELY_NOT_SET_ANYWHERE}"));
    }

    #[test]
    fn test_broken_toml_is_config_error() {
        let err = SyncConfig::from_toml_str("not toml [[").unwrap_err();
        assert!(matches!(err, ConnectorError::Config { .. }));
    }
}
