//! Cross-account credential broker
//!
//! Every operation that must act in a non-local account goes through
//! [`SessionTarget::resolve`]: either a pass-through of ambient credentials
//! (optionally via a named profile) or an STS AssumeRole exchange that
//! yields a [`CredentialLease`]. Leases are scoped to a single logical
//! operation and are never cached or reused across accounts.

use anyhow::{Context, Result};
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;
use backon::{ExponentialBuilder, Retryable};
use chrono::{DateTime, TimeZone, Utc};
use std::time::{Duration, UNIX_EPOCH};
use tracing::{debug, info, warn};

use org_lifecycle_common::defaults::{
    VALIDATION_INITIAL_DELAY_SECS, VALIDATION_MAX_ATTEMPTS, VALIDATION_MAX_DELAY_SECS,
};

use crate::aws::context::AwsContext;
use crate::aws::error::classify_anyhow_error;

/// Strongly-typed AWS account ID (12-digit string)
///
/// This newtype prevents accidentally mixing account IDs with other strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display, derive_more::Deref)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(s: impl Into<String>) -> Self {
        AccountId(s.into())
    }
}

/// Identity resolved from STS GetCallerIdentity
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub account_id: AccountId,
    pub arn: String,
}

/// Temporary credentials for one logical operation in a target account.
///
/// Owned exclusively by the operation that requested it, never persisted,
/// discarded at the end of the operation's scope.
#[derive(Clone)]
pub struct CredentialLease {
    pub access_key_id: String,
    secret_access_key: String,
    session_token: String,
    pub expiry: Option<DateTime<Utc>>,
}

impl CredentialLease {
    /// Wrap the lease in a provider usable by `aws_config`.
    pub fn to_provider(&self) -> SharedCredentialsProvider {
        let expires_after = self
            .expiry
            .map(|t| UNIX_EPOCH + Duration::from_secs(t.timestamp().max(0) as u64));
        SharedCredentialsProvider::new(Credentials::new(
            self.access_key_id.clone(),
            self.secret_access_key.clone(),
            Some(self.session_token.clone()),
            expires_after,
            "OrgLifecycleAssumeRole",
        ))
    }
}

impl std::fmt::Debug for CredentialLease {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialLease")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}

/// How to obtain credentials for an account context.
#[derive(Debug, Clone)]
pub enum SessionTarget {
    /// Ambient credentials, optionally via a named profile (no-op pass-through)
    Ambient { profile: Option<String> },
    /// Assume a role in the target account
    Role { role_arn: String },
}

impl SessionTarget {
    /// Resolve this target into a ready-to-use [`AwsContext`].
    ///
    /// Fails with `AuthFailure` on a denied assume-role, a bad trust
    /// policy, or expired source credentials; such errors are never retried.
    pub async fn resolve(&self, region: Option<&str>, session_name: &str) -> Result<AwsContext> {
        match self {
            SessionTarget::Ambient { profile } => {
                debug!(profile = ?profile, "Using ambient credentials");
                Ok(AwsContext::ambient(region, profile.as_deref()).await)
            }
            SessionTarget::Role { role_arn } => {
                let base = AwsContext::ambient(region, None).await;
                let lease = assume_role(&base, role_arn, session_name).await?;
                Ok(AwsContext::from_lease(region, &lease).await)
            }
        }
    }
}

/// Exchange the base identity for a temporary lease in the target account.
pub async fn assume_role(
    base: &AwsContext,
    role_arn: &str,
    session_name: &str,
) -> Result<CredentialLease> {
    let sts = base.sts_client();
    let response = sts
        .assume_role()
        .role_arn(role_arn)
        .role_session_name(session_name)
        .send()
        .await
        .map_err(anyhow::Error::from)
        .map_err(|e| {
            let classified = classify_anyhow_error(&e);
            e.context(classified)
        })
        .with_context(|| format!("Failed to assume role {role_arn}"))?;

    let creds = response
        .credentials()
        .context("No credentials returned from AssumeRole")?;

    let expiry = Utc
        .timestamp_opt(creds.expiration().secs(), 0)
        .single();

    debug!(role_arn = %role_arn, session_name = %session_name, "Assumed role");

    Ok(CredentialLease {
        access_key_id: creds.access_key_id().to_string(),
        secret_access_key: creds.secret_access_key().to_string(),
        session_token: creds.session_token().to_string(),
        expiry,
    })
}

/// Fetch the caller's account ID and ARN via STS GetCallerIdentity.
///
/// Requires no special permissions; always succeeds if credentials are
/// valid. Used to validate credentials and announce the operating identity
/// at the start of a run.
pub async fn get_caller_identity(ctx: &AwsContext) -> Result<CallerIdentity> {
    let sts = ctx.sts_client();
    let identity = sts
        .get_caller_identity()
        .send()
        .await
        .context("Failed to get AWS caller identity - check credentials")?;

    let account = identity
        .account()
        .context("No account ID returned from STS GetCallerIdentity")?;
    let arn = identity
        .arn()
        .context("No ARN returned from STS GetCallerIdentity")?;

    info!(account_id = %account, arn = %arn, "Caller identity resolved");

    Ok(CallerIdentity {
        account_id: AccountId::new(account),
        arn: arn.to_string(),
    })
}

/// Trait for cross-account access validation that can be mocked in tests.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait AccessValidator: Send + Sync {
    /// Confirm the provider-created role in a new account is assumable.
    async fn validate(&self, account_id: String, role_name: String) -> Result<()>;
}

/// Validates reachability of a new account by assuming its access role and
/// running an identity check, with exponential backoff for the expected
/// role-propagation delay.
pub struct StsAccessValidator {
    mgmt: AwsContext,
    region: Option<String>,
}

impl StsAccessValidator {
    pub fn new(mgmt: AwsContext, region: Option<String>) -> Self {
        Self { mgmt, region }
    }
}

impl AccessValidator for StsAccessValidator {
    async fn validate(&self, account_id: String, role_name: String) -> Result<()> {
        let role_arn = format!("arn:aws:iam::{account_id}:role/{role_name}");

        let attempt = || async {
            let lease = assume_role(&self.mgmt, &role_arn, "lifecycle-validation").await?;
            let target = AwsContext::from_lease(self.region.as_deref(), &lease).await;
            let identity = get_caller_identity(&target).await?;
            info!(
                account_id = %identity.account_id,
                arn = %identity.arn,
                "Validated cross-account access"
            );
            Ok(())
        };

        attempt
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_secs(VALIDATION_INITIAL_DELAY_SECS))
                    .with_max_delay(Duration::from_secs(VALIDATION_MAX_DELAY_SECS))
                    .with_max_times(VALIDATION_MAX_ATTEMPTS - 1),
            )
            .notify(|err: &anyhow::Error, delay: Duration| {
                warn!(
                    role_arn = %role_arn,
                    delay_secs = delay.as_secs(),
                    error = %err,
                    "Validation attempt failed, retrying"
                );
            })
            .await
            .with_context(|| format!("Could not validate access to account {account_id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lease() -> CredentialLease {
        CredentialLease {
            access_key_id: "AKIAEXAMPLE".into(),
            secret_access_key: "wJalrXUtnFEMI".into(),
            session_token: "FQoGZXIvYXdz".into(),
            expiry: Some(Utc::now()),
        }
    }

    #[test]
    fn debug_redacts_secrets() {
        let out = format!("{:?}", lease());
        assert!(out.contains("AKIAEXAMPLE"));
        assert!(out.contains("<redacted>"));
        assert!(!out.contains("wJalrXUtnFEMI"));
        assert!(!out.contains("FQoGZXIvYXdz"));
    }

    #[test]
    fn lease_converts_to_provider() {
        // Must not panic on a lease with or without an expiry
        let _ = lease().to_provider();
        let no_expiry = CredentialLease {
            expiry: None,
            ..lease()
        };
        let _ = no_expiry.to_provider();
    }
}
