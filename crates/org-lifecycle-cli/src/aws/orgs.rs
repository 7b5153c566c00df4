//! Organizations API client wrapper
//!
//! Thin typed layer over the Organizations SDK: account creation and
//! closure, OU listing and moves, and paginated account resolution. The
//! [`OrgOperations`] trait is the seam the engines are written against so
//! orchestration logic can be unit tested with a mock.

use anyhow::{Context, Result};
use aws_sdk_organizations::error::ProvideErrorMetadata;
use std::collections::BTreeMap;
use tracing::{debug, info};

use org_lifecycle_common::status::{AccountStatus, CreateState};

use crate::aws::context::AwsContext;
use crate::aws::error::classify_aws_error;

/// Summary of a member account from ListAccounts/DescribeAccount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSummary {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub status: AccountStatus,
}

/// Progress of an asynchronous CreateAccount request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateAccountProgress {
    pub state: CreateState,
    pub account_id: Option<String>,
    pub failure_reason: Option<String>,
}

/// An organizational unit (or root) in the OU tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OuSummary {
    pub id: String,
    pub name: String,
}

/// Result of a CloseAccount request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseRequestOutcome {
    /// Closure accepted; the account will leave ACTIVE asynchronously
    Requested,
    /// Provider reported the account already closed (idempotent success)
    AlreadyClosed,
}

/// Trait for Organizations operations that can be mocked in tests.
///
/// Note: parameters use owned `String`/`BTreeMap` types to work around
/// mockall lifetime limitations.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait OrgOperations: Send + Sync {
    /// Management account id of the organization
    async fn management_account_id(&self) -> Result<String>;

    /// Submit an asynchronous account creation; returns the request id
    async fn create_account(
        &self,
        name: String,
        email: String,
        tags: BTreeMap<String, String>,
    ) -> Result<String>;

    /// Check the state of a pending creation request
    async fn describe_create_account_status(&self, request_id: String)
        -> Result<CreateAccountProgress>;

    /// Roots of the OU tree
    async fn list_roots(&self) -> Result<Vec<OuSummary>>;

    /// Direct children OUs of a root or OU
    async fn list_organizational_units_for_parent(
        &self,
        parent_id: String,
    ) -> Result<Vec<OuSummary>>;

    /// Validate an OU id without traversal
    async fn describe_organizational_unit(&self, ou_id: String) -> Result<OuSummary>;

    /// Current parent (root or OU) of an account
    async fn parent_of(&self, child_id: String) -> Result<String>;

    /// Move an account between parents
    async fn move_account(
        &self,
        account_id: String,
        source_parent_id: String,
        destination_parent_id: String,
    ) -> Result<()>;

    /// Look up one account by id
    async fn describe_account(&self, account_id: String) -> Result<AccountSummary>;

    /// Full paginated account listing (management account included)
    async fn list_accounts(&self) -> Result<Vec<AccountSummary>>;

    /// Request account closure; already-closed is reported, not an error
    async fn close_account(&self, account_id: String) -> Result<CloseRequestOutcome>;
}

/// Organizations client for managing member accounts
pub struct OrganizationsClient {
    client: aws_sdk_organizations::Client,
}

impl OrganizationsClient {
    /// Create an Organizations client from a pre-loaded AWS context
    pub fn from_context(ctx: &AwsContext) -> Self {
        Self {
            client: ctx.organizations_client(),
        }
    }
}

fn account_summary(
    id: Option<&str>,
    name: Option<&str>,
    email: Option<&str>,
    status: Option<&str>,
) -> Result<AccountSummary> {
    Ok(AccountSummary {
        id: id.context("Account entry without an id")?.to_string(),
        name: name.map(str::to_string),
        email: email.map(str::to_string),
        status: status.map(AccountStatus::parse).unwrap_or(AccountStatus::Unknown),
    })
}

impl OrgOperations for OrganizationsClient {
    async fn management_account_id(&self) -> Result<String> {
        let response = self
            .client
            .describe_organization()
            .send()
            .await
            .context("Failed to describe organization")?;

        let id = response
            .organization()
            .and_then(|o| o.master_account_id())
            .context("Organization has no management account id")?;

        Ok(id.to_string())
    }

    async fn create_account(
        &self,
        name: String,
        email: String,
        tags: BTreeMap<String, String>,
    ) -> Result<String> {
        let mut request = self.client.create_account().email(&email).account_name(&name);
        for (key, value) in &tags {
            let tag = aws_sdk_organizations::types::Tag::builder()
                .key(key)
                .value(value)
                .build()
                .map_err(|e| anyhow::anyhow!("Failed to build account tag: {e}"))?;
            request = request.tags(tag);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("Failed to create account {name}"))?;

        let request_id = response
            .create_account_status()
            .and_then(|s| s.id())
            .context("CreateAccount returned no request id")?;

        info!(account_name = %name, request_id = %request_id, "Account creation requested");
        Ok(request_id.to_string())
    }

    async fn describe_create_account_status(
        &self,
        request_id: String,
    ) -> Result<CreateAccountProgress> {
        let response = self
            .client
            .describe_create_account_status()
            .create_account_request_id(&request_id)
            .send()
            .await
            .with_context(|| format!("Failed to describe creation request {request_id}"))?;

        let status = response
            .create_account_status()
            .context("DescribeCreateAccountStatus returned no status")?;

        let state = status
            .state()
            .map(|s| CreateState::parse(s.as_str()).unwrap_or(CreateState::InProgress))
            .unwrap_or(CreateState::InProgress);

        Ok(CreateAccountProgress {
            state,
            account_id: status.account_id().map(str::to_string),
            failure_reason: status.failure_reason().map(|r| r.as_str().to_string()),
        })
    }

    async fn list_roots(&self) -> Result<Vec<OuSummary>> {
        let response = self
            .client
            .list_roots()
            .send()
            .await
            .context("Failed to list organization roots")?;

        Ok(response
            .roots()
            .iter()
            .filter_map(|r| {
                Some(OuSummary {
                    id: r.id()?.to_string(),
                    name: r.name().unwrap_or("Root").to_string(),
                })
            })
            .collect())
    }

    async fn list_organizational_units_for_parent(
        &self,
        parent_id: String,
    ) -> Result<Vec<OuSummary>> {
        let mut units = Vec::new();
        let mut pages = self
            .client
            .list_organizational_units_for_parent()
            .parent_id(&parent_id)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page =
                page.with_context(|| format!("Failed to list OUs under parent {parent_id}"))?;
            for ou in page.organizational_units() {
                if let Some(id) = ou.id() {
                    units.push(OuSummary {
                        id: id.to_string(),
                        name: ou.name().unwrap_or_default().to_string(),
                    });
                }
            }
        }

        debug!(parent_id = %parent_id, count = units.len(), "Listed child OUs");
        Ok(units)
    }

    async fn describe_organizational_unit(&self, ou_id: String) -> Result<OuSummary> {
        let response = self
            .client
            .describe_organizational_unit()
            .organizational_unit_id(&ou_id)
            .send()
            .await
            .with_context(|| format!("Failed to describe OU {ou_id}"))?;

        let ou = response
            .organizational_unit()
            .with_context(|| format!("OU {ou_id} has no description"))?;

        Ok(OuSummary {
            id: ou.id().unwrap_or(&ou_id).to_string(),
            name: ou.name().unwrap_or_default().to_string(),
        })
    }

    async fn parent_of(&self, child_id: String) -> Result<String> {
        let response = self
            .client
            .list_parents()
            .child_id(&child_id)
            .send()
            .await
            .with_context(|| format!("Failed to list parents of {child_id}"))?;

        let parent = response
            .parents()
            .first()
            .and_then(|p| p.id())
            .with_context(|| format!("Account {child_id} has no parent"))?;

        Ok(parent.to_string())
    }

    async fn move_account(
        &self,
        account_id: String,
        source_parent_id: String,
        destination_parent_id: String,
    ) -> Result<()> {
        self.client
            .move_account()
            .account_id(&account_id)
            .source_parent_id(&source_parent_id)
            .destination_parent_id(&destination_parent_id)
            .send()
            .await
            .with_context(|| {
                format!("Failed to move account {account_id} to {destination_parent_id}")
            })?;

        info!(
            account_id = %account_id,
            destination = %destination_parent_id,
            "Account moved"
        );
        Ok(())
    }

    async fn describe_account(&self, account_id: String) -> Result<AccountSummary> {
        let response = self
            .client
            .describe_account()
            .account_id(&account_id)
            .send()
            .await
            .with_context(|| format!("Failed to describe account {account_id}"))?;

        let account = response
            .account()
            .with_context(|| format!("Account {account_id} has no description"))?;

        account_summary(
            account.id(),
            account.name(),
            account.email(),
            account.status().map(|s| s.as_str()),
        )
    }

    async fn list_accounts(&self) -> Result<Vec<AccountSummary>> {
        let mut accounts = Vec::new();
        let mut pages = self.client.list_accounts().into_paginator().send();

        while let Some(page) = pages.next().await {
            let page = page.context("Failed to list accounts")?;
            for account in page.accounts() {
                accounts.push(account_summary(
                    account.id(),
                    account.name(),
                    account.email(),
                    account.status().map(|s| s.as_str()),
                )?);
            }
        }

        debug!(count = accounts.len(), "Listed organization accounts");
        Ok(accounts)
    }

    async fn close_account(&self, account_id: String) -> Result<CloseRequestOutcome> {
        match self.client.close_account().account_id(&account_id).send().await {
            Ok(_) => {
                info!(account_id = %account_id, "Account closure requested");
                Ok(CloseRequestOutcome::Requested)
            }
            Err(e) => {
                let classified = classify_aws_error(e.code(), e.message());
                if classified.is_already_closed() {
                    info!(account_id = %account_id, "Account is already closed");
                    return Ok(CloseRequestOutcome::AlreadyClosed);
                }
                Err(anyhow::Error::from(e)
                    .context(classified)
                    .context(format!("Failed to close account {account_id}")))
            }
        }
    }
}
