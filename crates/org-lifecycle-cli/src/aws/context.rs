//! Shared AWS configuration context
//!
//! Provides `AwsContext` for loading AWS SDK configuration once and
//! creating multiple service clients from the same config. A context is
//! built either from ambient credentials (default provider chain, with an
//! optional named profile) or from an assumed-role credential lease.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use std::sync::Arc;

use crate::aws::credentials::CredentialLease;

/// Shared AWS configuration context for creating service clients.
///
/// Holds a loaded AWS SDK config and provides methods to create service
/// clients without re-loading configuration.
#[derive(Clone)]
pub struct AwsContext {
    config: Arc<SdkConfig>,
}

impl AwsContext {
    /// Load AWS configuration from the ambient environment.
    ///
    /// Uses the default credential provider chain (env vars, config files,
    /// instance roles). A named profile overrides the chain when given;
    /// region falls back to the environment when `None`.
    pub async fn ambient(region: Option<&str>, profile: Option<&str>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;

        Self {
            config: Arc::new(config),
        }
    }

    /// Build a context from an assumed-role credential lease.
    ///
    /// The lease is scoped to one logical operation; the derived context
    /// must not outlive it.
    pub async fn from_lease(region: Option<&str>, lease: &CredentialLease) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(lease.to_provider());
        if let Some(region) = region {
            loader = loader.region(Region::new(region.to_string()));
        }
        let config = loader.load().await;

        Self {
            config: Arc::new(config),
        }
    }

    /// Get the underlying SDK config for direct client construction.
    pub fn sdk_config(&self) -> &SdkConfig {
        &self.config
    }

    /// Create an Organizations client from this context.
    pub fn organizations_client(&self) -> aws_sdk_organizations::Client {
        aws_sdk_organizations::Client::new(self.sdk_config())
    }

    /// Create an SSM client from this context.
    pub fn ssm_client(&self) -> aws_sdk_ssm::Client {
        aws_sdk_ssm::Client::new(self.sdk_config())
    }

    /// Create an STS client from this context.
    pub fn sts_client(&self) -> aws_sdk_sts::Client {
        aws_sdk_sts::Client::new(self.sdk_config())
    }
}

impl std::fmt::Debug for AwsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsContext")
            .field("region", &self.config.region())
            .finish_non_exhaustive()
    }
}
