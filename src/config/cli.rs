use crate::core::orchestrator::{DEFAULT_LIMIT, MAX_LIMIT, MIN_LIMIT};
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "issue-sync")]
#[command(about = "Sync issues from a source API into a local document store")]
pub struct CliConfig {
    /// Repository owner (organization or user)
    pub owner: String,

    /// Repository name
    pub repo: String,

    #[arg(long, default_value = "https://api.github.com")]
    pub api_base_url: String,

    #[arg(long, default_value = "./data")]
    pub output_path: String,

    #[arg(long, default_value = "issues")]
    pub collection: String,

    /// Maximum number of issues to fetch (1-100)
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,

    /// Optional TOML config file; CLI flags take precedence over it
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("owner", &self.owner)?;
        validation::validate_non_empty_string("repo", &self.repo)?;
        validation::validate_url("api_base_url", &self.api_base_url)?;
        validation::validate_non_empty_string("output_path", &self.output_path)?;
        validation::validate_non_empty_string("collection", &self.collection)?;
        validation::validate_range("limit", self.limit, MIN_LIMIT, MAX_LIMIT)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CliConfig {
        CliConfig {
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
            api_base_url: "https://api.github.com".to_string(),
            output_path: "./data".to_string(),
            collection: "issues".to_string(),
            limit: 30,
            config: None,
            verbose: false,
            json_logs: false,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_limit_out_of_range_rejected() {
        let mut bad = config();
        bad.limit = 0;
        assert!(bad.validate().is_err());
        bad.limit = 101;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_blank_owner_rejected() {
        let mut bad = config();
        bad.owner = "  ".to_string();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_parses_from_args() {
        let parsed =
            CliConfig::parse_from(["issue-sync", "acme", "widgets", "--limit", "10", "--verbose"]);
        assert_eq!(parsed.owner, "acme");
        assert_eq!(parsed.repo, "widgets");
        assert_eq!(parsed.limit, 10);
        assert!(parsed.verbose);
    }
}
