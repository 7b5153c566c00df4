//! Configuration loading, merging, and validation
//!
//! A JSON config file supplies the long-lived settings (role ARNs,
//! counter parameter path, email prefix/domain, tags); CLI flags override
//! per invocation. Validation runs before any remote call so a bad config
//! never produces side effects.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use org_lifecycle_common::defaults::{
    default_poll_interval, default_poll_max_attempts, default_validation_role,
};

use crate::aws::credentials::SessionTarget;
use crate::engine::create::EmailSource;
use crate::engine::ou::OuTarget;
use crate::wait::PollConfig;

/// Email prefix and domain for generated addresses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailSettings {
    pub prefix: Option<String>,
    pub domain: Option<String>,
}

/// Poll interval and attempt budget for both lifecycle state machines
#[derive(Debug, Clone, Deserialize)]
pub struct PollingSettings {
    #[serde(default = "default_poll_interval")]
    pub interval_seconds: u64,
    #[serde(default = "default_poll_max_attempts")]
    pub max_attempts: u32,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            interval_seconds: default_poll_interval(),
            max_attempts: default_poll_max_attempts(),
        }
    }
}

/// Configuration for a lifecycle run, merged from file and CLI.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Role ARN for the management account (alternative to a profile)
    pub management_role_arn: Option<String>,
    /// Role ARN for the automation account holding the counter
    pub automation_role_arn: Option<String>,
    /// AWS profile for the management account
    pub mgmt_profile: Option<String>,
    /// AWS profile for the automation account
    pub automation_profile: Option<String>,
    pub region: Option<String>,
    /// SSM parameter holding the shared sequence number
    pub ssm_parameter_path: Option<String>,
    /// OU name to place new accounts into (tree search)
    pub default_ou_name: Option<String>,
    /// OU id to place new accounts into (skips the search)
    pub ou_id: Option<String>,
    #[serde(default = "default_validation_role")]
    pub validation_role_name: String,
    #[serde(default)]
    pub email: EmailSettings,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub polling: PollingSettings,
    /// Set from the CLI only: a fixed address that bypasses the counter
    #[serde(skip)]
    pub email_override: Option<String>,
}

/// CLI flags that override file settings for one invocation.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub management_role_arn: Option<String>,
    pub automation_role_arn: Option<String>,
    pub mgmt_profile: Option<String>,
    pub automation_profile: Option<String>,
    pub ou_name: Option<String>,
    pub ou_id: Option<String>,
    pub email: Option<String>,
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Merge CLI overrides into the loaded configuration.
    pub fn merge_overrides(mut self, overrides: CliOverrides) -> Self {
        if overrides.management_role_arn.is_some() {
            self.management_role_arn = overrides.management_role_arn;
        }
        if overrides.automation_role_arn.is_some() {
            self.automation_role_arn = overrides.automation_role_arn;
        }
        if overrides.mgmt_profile.is_some() {
            self.mgmt_profile = overrides.mgmt_profile;
        }
        if overrides.automation_profile.is_some() {
            self.automation_profile = overrides.automation_profile;
        }
        if overrides.ou_name.is_some() {
            self.default_ou_name = overrides.ou_name;
        }
        if overrides.ou_id.is_some() {
            self.ou_id = overrides.ou_id;
        }
        if overrides.email.is_some() {
            self.email_override = overrides.email;
        }
        self
    }

    /// Validate everything account creation needs, before any remote call.
    pub fn validate_for_create(&self) -> Result<()> {
        self.require_management_access()?;

        if let Some(email) = &self.email_override {
            validate_email_address(email)?;
            return Ok(());
        }

        if self.ssm_parameter_path.is_none() {
            bail!("Missing required config field: ssm_parameter_path");
        }
        if self.automation_profile.is_none() && self.automation_role_arn.is_none() {
            bail!("Must provide either automation_profile or automation_role_arn");
        }

        let prefix = self
            .email
            .prefix
            .as_deref()
            .context("Missing required config field: email.prefix")?;
        let domain = self
            .email
            .domain
            .as_deref()
            .context("Missing required config field: email.domain")?;
        if prefix.is_empty() || prefix.contains('@') {
            bail!("Invalid email.prefix: {prefix:?}");
        }
        validate_email_domain(domain)?;

        Ok(())
    }

    /// Validate everything account closure needs.
    pub fn validate_for_close(&self) -> Result<()> {
        self.require_management_access()
    }

    fn require_management_access(&self) -> Result<()> {
        if self.mgmt_profile.is_none() && self.management_role_arn.is_none() {
            bail!("Must provide either mgmt_profile or management_role_arn");
        }
        Ok(())
    }

    /// Credentials for the management account. A role ARN wins over a
    /// profile when both are configured.
    pub fn management_target(&self) -> SessionTarget {
        match &self.management_role_arn {
            Some(arn) => SessionTarget::Role {
                role_arn: arn.clone(),
            },
            None => SessionTarget::Ambient {
                profile: self.mgmt_profile.clone(),
            },
        }
    }

    /// Credentials for the automation account holding the counter.
    pub fn automation_target(&self) -> SessionTarget {
        match &self.automation_role_arn {
            Some(arn) => SessionTarget::Role {
                role_arn: arn.clone(),
            },
            None => SessionTarget::Ambient {
                profile: self.automation_profile.clone(),
            },
        }
    }

    /// Where the new account's email comes from. Call after validation.
    pub fn email_source(&self) -> Result<EmailSource> {
        if let Some(email) = &self.email_override {
            return Ok(EmailSource::Override(email.clone()));
        }
        let prefix = self
            .email
            .prefix
            .clone()
            .context("Missing required config field: email.prefix")?;
        let domain = self
            .email
            .domain
            .clone()
            .context("Missing required config field: email.domain")?;
        Ok(EmailSource::Counter { prefix, domain })
    }

    /// Target OU for new accounts. An explicit id skips the tree search.
    pub fn ou_target(&self) -> Option<OuTarget> {
        if let Some(id) = &self.ou_id {
            return Some(OuTarget::Id(id.clone()));
        }
        self.default_ou_name.clone().map(OuTarget::Name)
    }

    pub fn poll_config(&self) -> PollConfig {
        PollConfig::new(self.polling.interval_seconds, self.polling.max_attempts)
    }
}

/// Reject domains that cannot possibly receive account mail.
fn validate_email_domain(domain: &str) -> Result<()> {
    let malformed = domain.is_empty()
        || domain.contains('@')
        || domain.contains(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.');
    if malformed {
        bail!("Invalid email.domain: {domain:?}");
    }
    Ok(())
}

/// Sanity check for a full override address.
fn validate_email_address(email: &str) -> Result<()> {
    let Some((local, domain)) = email.split_once('@') else {
        bail!("Invalid email address: {email:?}");
    };
    if local.is_empty() {
        bail!("Invalid email address: {email:?}");
    }
    validate_email_domain(domain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{json}").unwrap();
        file
    }

    fn creatable() -> Config {
        Config {
            management_role_arn: Some("arn:aws:iam::999900001111:role/Mgmt".into()),
            automation_role_arn: Some("arn:aws:iam::888800002222:role/Auto".into()),
            ssm_parameter_path: Some("/org/account-number".into()),
            email: EmailSettings {
                prefix: Some("will".into()),
                domain: Some("example.com".into()),
            },
            ..Config::default()
        }
    }

    #[test]
    fn load_full_config() {
        let file = write_config(
            r#"{
                "management_role_arn": "arn:aws:iam::999900001111:role/Mgmt",
                "automation_role_arn": "arn:aws:iam::888800002222:role/Auto",
                "region": "us-east-1",
                "ssm_parameter_path": "/org/account-number",
                "default_ou_name": "Sandbox",
                "email": { "prefix": "will", "domain": "example.com" },
                "tags": { "team": "platform" },
                "polling": { "interval_seconds": 5, "max_attempts": 60 }
            }"#,
        );

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.region.as_deref(), Some("us-east-1"));
        assert_eq!(config.polling.interval_seconds, 5);
        assert_eq!(config.polling.max_attempts, 60);
        assert_eq!(config.tags["team"], "platform");
        assert_eq!(config.validation_role_name, "OrganizationAccountAccessRole");
        assert!(config.validate_for_create().is_ok());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load(Path::new("/nonexistent/config.json")).is_err());
    }

    #[test]
    fn polling_defaults_apply_when_section_absent() {
        let file = write_config(r#"{ "mgmt_profile": "mgmt" }"#);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.polling.interval_seconds, 10);
        assert_eq!(config.polling.max_attempts, 30);
    }

    #[test]
    fn cli_overrides_take_precedence() {
        let config = creatable().merge_overrides(CliOverrides {
            ou_name: Some("Workloads".into()),
            mgmt_profile: Some("other".into()),
            ..CliOverrides::default()
        });
        assert_eq!(config.default_ou_name.as_deref(), Some("Workloads"));
        assert_eq!(config.mgmt_profile.as_deref(), Some("other"));
        // Untouched fields survive the merge
        assert_eq!(config.ssm_parameter_path.as_deref(), Some("/org/account-number"));
    }

    #[test]
    fn create_requires_management_access() {
        let config = Config::default();
        let err = config.validate_for_create().unwrap_err();
        assert!(err.to_string().contains("mgmt_profile"));
    }

    #[test]
    fn create_requires_counter_path_and_automation_access() {
        let mut config = creatable();
        config.ssm_parameter_path = None;
        assert!(config.validate_for_create().is_err());

        let mut config = creatable();
        config.automation_role_arn = None;
        assert!(config.validate_for_create().is_err());
    }

    #[test]
    fn email_override_relaxes_counter_requirements() {
        let config = Config {
            mgmt_profile: Some("mgmt".into()),
            ..Config::default()
        }
        .merge_overrides(CliOverrides {
            email: Some("platform@example.com".into()),
            ..CliOverrides::default()
        });
        assert!(config.validate_for_create().is_ok());
        assert!(matches!(
            config.email_source().unwrap(),
            EmailSource::Override(_)
        ));
    }

    #[test]
    fn malformed_domains_are_rejected() {
        for domain in ["", "no-dot", "has @sign.com", ".leading.dot", "trailing.dot."] {
            let mut config = creatable();
            config.email.domain = Some(domain.into());
            assert!(
                config.validate_for_create().is_err(),
                "domain {domain:?} should be rejected"
            );
        }
    }

    #[test]
    fn malformed_override_addresses_are_rejected() {
        for email in ["not-an-email", "@example.com", "x@nodot"] {
            let config = Config {
                mgmt_profile: Some("mgmt".into()),
                ..Config::default()
            }
            .merge_overrides(CliOverrides {
                email: Some(email.into()),
                ..CliOverrides::default()
            });
            assert!(
                config.validate_for_create().is_err(),
                "email {email:?} should be rejected"
            );
        }
    }

    #[test]
    fn ou_id_wins_over_name() {
        let mut config = creatable();
        config.default_ou_name = Some("Sandbox".into());
        config.ou_id = Some("ou-abcd".into());
        assert_eq!(config.ou_target(), Some(OuTarget::Id("ou-abcd".into())));
    }

    #[test]
    fn close_only_needs_management_access() {
        let config = Config {
            mgmt_profile: Some("mgmt".into()),
            ..Config::default()
        };
        assert!(config.validate_for_close().is_ok());
        assert!(Config::default().validate_for_close().is_err());
    }
}
