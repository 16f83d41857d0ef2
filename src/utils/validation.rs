use crate::utils::error::{ConnectorError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ConnectorError::Config {
            message: format!("{field_name}: URL cannot be empty"),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ConnectorError::Config {
                message: format!("{field_name}: unsupported URL scheme: {scheme}"),
            }),
        },
        Err(e) => Err(ConnectorError::Config {
            message: format!("{field_name}: invalid URL format: {e}"),
        }),
    }
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(ConnectorError::Config {
            message: format!("{field_name}: value must be at least {min_value} (got {value})"),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConnectorError::Config {
            message: format!("{field_name}: value cannot be empty or whitespace-only"),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(ConnectorError::Config {
            message: format!("{field_name}: value must be between {min} and {max} (got {value})"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("source.base_url", "https://api.github.com").is_ok());
        assert!(validate_url("source.base_url", "http://localhost:8080").is_ok());
        assert!(validate_url("source.base_url", "").is_err());
        assert!(validate_url("source.base_url", "not-a-url").is_err());
        assert!(validate_url("source.base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("sync.max_concurrent_writes", 8, 1).is_ok());
        assert!(validate_positive_number("sync.max_concurrent_writes", 0, 1).is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("store.collection", "issues").is_ok());
        assert!(validate_non_empty_string("store.collection", "   ").is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("sync.default_limit", 30, 1, 100).is_ok());
        assert!(validate_range("sync.default_limit", 0, 1, 100).is_err());
        assert!(validate_range("sync.default_limit", 101, 1, 100).is_err());
    }
}
