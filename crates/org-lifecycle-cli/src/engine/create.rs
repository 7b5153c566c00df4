//! Account creation state machine
//!
//! REQUESTED -> PENDING -> SUCCEEDED | FAILED.
//!
//! Ordering constraint: the shared counter is read as a snapshot up front
//! and advanced exactly once, only after the creation reaches terminal
//! success and OU placement and validation have been attempted. A FAILED
//! or timed-out creation never advances the counter. OU-move and
//! validation failures degrade to warnings inside the success record; the
//! created account is never rolled back.

use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use org_lifecycle_common::email::generate_email;
use org_lifecycle_common::record::AccountRecord;
use org_lifecycle_common::status::CreateState;

use crate::aws::counter::CounterStore;
use crate::aws::credentials::AccessValidator;
use crate::aws::error::OrgError;
use crate::aws::orgs::OrgOperations;
use crate::engine::ou::{move_account_to_ou, resolve_ou, OuTarget};
use crate::wait::{poll_until, PollConfig, PollOutcome};

/// Where the new account's email comes from.
#[derive(Debug, Clone)]
pub enum EmailSource {
    /// Derived from the shared counter: `{prefix}+{n}-{slug}@{domain}`
    Counter { prefix: String, domain: String },
    /// Caller-supplied address; the counter is neither read nor advanced
    Override(String),
}

/// Inputs for one account creation run.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub name: String,
    pub email: EmailSource,
    pub ou_target: Option<OuTarget>,
    pub tags: BTreeMap<String, String>,
    pub dry_run: bool,
}

/// Drives one account creation to completion.
pub struct CreateEngine<'a, O, C, V> {
    pub ops: &'a O,
    /// Absent only on the email-override path
    pub counter: Option<&'a C>,
    pub validator: &'a V,
    pub poll: PollConfig,
    /// Role assumed inside the new account for the reachability check
    pub validation_role: String,
}

impl<O, C, V> CreateEngine<'_, O, C, V>
where
    O: OrgOperations,
    C: CounterStore,
    V: AccessValidator,
{
    /// Run the state machine and produce the immutable creation record.
    pub async fn execute<S, SFut>(&self, request: &CreateRequest, sleep: S) -> Result<AccountRecord>
    where
        S: Fn(Duration) -> SFut,
        SFut: Future<Output = ()>,
    {
        // REQUESTED: allocate the email. The counter read is a snapshot;
        // nothing is reserved until the increment after success.
        let (email, counter_snapshot) = match &request.email {
            EmailSource::Counter { prefix, domain } => {
                let counter = self
                    .counter
                    .context("Counter store required for generated emails")?;
                let n = counter.read().await?;
                (generate_email(prefix, n, &request.name, domain), Some(n))
            }
            EmailSource::Override(email) => (email.clone(), None),
        };

        info!(account_name = %request.name, email = %email, "Creation requested");

        if request.dry_run {
            return Ok(self.projected_record(request, email));
        }

        // Resolve the OU before the mutating call so an unknown OU fails
        // with no side effects.
        let target_ou = match &request.ou_target {
            Some(target) => Some(resolve_ou(self.ops, target).await?),
            None => None,
        };

        let request_id = self
            .ops
            .create_account(request.name.clone(), email.clone(), request.tags.clone())
            .await?;

        // PENDING: poll to a terminal state within the budget.
        let ops = self.ops;
        let rid = request_id.clone();
        let outcome = poll_until(
            self.poll,
            move || {
                let rid = rid.clone();
                async move {
                    let progress = ops.describe_create_account_status(rid).await?;
                    info!(state = %progress.state, "Creation status");
                    if progress.state.is_terminal() {
                        Ok(Some(progress))
                    } else {
                        Ok(None)
                    }
                }
            },
            sleep,
            "account creation",
        )
        .await?;

        let progress = match outcome {
            PollOutcome::Ready(progress) => progress,
            PollOutcome::TimedOut { attempts } => {
                // The request may still complete asynchronously; the
                // counter must not advance for an unconfirmed account.
                return Err(OrgError::CreationTimeout {
                    request_id,
                    attempts,
                }
                .into());
            }
        };

        if progress.state == CreateState::Failed {
            let reason = progress
                .failure_reason
                .unwrap_or_else(|| "Unknown".to_string());
            return Err(OrgError::CreationFailed { reason }.into());
        }

        let account_id = progress
            .account_id
            .context("Creation succeeded but no account id was returned")?;
        info!(account_id = %account_id, "Account created");

        let mut warnings = Vec::new();

        // OU placement: at most one move; failure is partial success.
        let placed_ou = match &target_ou {
            Some(ou) => match move_account_to_ou(self.ops, &account_id, ou).await {
                Ok(()) => Some(ou.clone()),
                Err(e) => {
                    warn!(account_id = %account_id, error = %e, "OU move failed");
                    warnings.push(format!(
                        "Account created but move to OU {} failed: {e:#}",
                        ou.name
                    ));
                    None
                }
            },
            None => None,
        };

        // Reachability check: role propagation into a fresh account is
        // slow, so an exhausted retry budget is a warning, not a failure.
        let validated = match self
            .validator
            .validate(account_id.clone(), self.validation_role.clone())
            .await
        {
            Ok(()) => true,
            Err(e) => {
                warn!(account_id = %account_id, error = %e, "Access validation unreachable");
                warnings.push(format!("Cross-account access not validated: {e:#}"));
                false
            }
        };

        // Counter commit: single attempt, only now that the account
        // durably exists. A rejected write cannot roll the account back.
        if let Some(n) = counter_snapshot {
            let counter = self
                .counter
                .context("Counter store required for generated emails")?;
            if let Err(e) = counter.increment_from(n).await {
                warn!(error = %e, "Counter increment failed");
                warnings.push(format!("Counter increment failed: {e:#}"));
            }
        }

        Ok(AccountRecord {
            account_id: Some(account_id),
            name: request.name.clone(),
            email,
            created_at: Utc::now(),
            status: CreateState::Succeeded,
            ou_id: placed_ou.as_ref().map(|ou| ou.id.clone()),
            ou_name: placed_ou.as_ref().map(|ou| ou.name.clone()),
            validated,
            dry_run: false,
            warnings,
        })
    }

    /// Dry-run projection: the plan with no mutating calls issued.
    fn projected_record(&self, request: &CreateRequest, email: String) -> AccountRecord {
        let (ou_id, ou_name) = match &request.ou_target {
            Some(OuTarget::Id(id)) => (Some(id.clone()), None),
            Some(OuTarget::Name(name)) => (None, Some(name.clone())),
            None => (None, None),
        };

        AccountRecord {
            account_id: None,
            name: request.name.clone(),
            email,
            created_at: Utc::now(),
            status: CreateState::InProgress,
            ou_id,
            ou_name,
            validated: false,
            dry_run: true,
            warnings: vec![],
        }
    }
}
