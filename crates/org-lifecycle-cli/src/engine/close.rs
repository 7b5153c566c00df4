//! Account closure state machine
//!
//! RESOLVED -> PRECHECKED -> CLOSE_REQUESTED -> POLLING -> DONE.
//!
//! Idempotency: an account that is not ACTIVE short-circuits to
//! ALREADY_CLOSED with zero mutating calls, and the provider's
//! already-closed rejection is treated as success. The management account
//! is rejected before any mutating call, dry-run included. In a bulk run
//! accounts are processed one at a time in discovery order and one
//! account's failure never aborts the rest.

use anyhow::{Context, Result};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

use org_lifecycle_common::quota::closure_rate_ceiling;
use org_lifecycle_common::record::ClosureOutcome;
use org_lifecycle_common::status::FinalStatus;

use crate::aws::error::OrgError;
use crate::aws::orgs::{AccountSummary, CloseRequestOutcome, OrgOperations};
use crate::wait::{poll_until, PollConfig, PollOutcome};

/// What to close.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosureTarget {
    AccountId(String),
    Email(String),
    /// Every member account (management excluded); requires confirmation
    All,
}

/// Inputs for one closure run.
#[derive(Debug, Clone)]
pub struct CloseRequest {
    pub target: ClosureTarget,
    pub dry_run: bool,
    /// Skip status polling after the close call
    pub no_wait: bool,
}

/// Seam for the interactive bulk confirmation.
#[cfg_attr(test, mockall::automock)]
pub trait BulkConfirmer: Send + Sync {
    /// Return true to proceed with closing `count` accounts.
    fn confirm(&self, count: usize) -> Result<bool>;
}

/// Reads the affirmation from stdin, prompting on stderr.
pub struct StdinConfirmer;

impl BulkConfirmer for StdinConfirmer {
    fn confirm(&self, count: usize) -> Result<bool> {
        use std::io::{BufRead, Write};

        let mut stderr = std::io::stderr();
        write!(
            stderr,
            "WARNING: this will close {count} account(s). Type \"yes\" to confirm: "
        )?;
        stderr.flush()?;

        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read confirmation")?;
        Ok(line.trim() == "yes")
    }
}

/// Drives one closure run (single account or bulk) to completion.
pub struct CloseEngine<'a, O, K> {
    pub ops: &'a O,
    pub confirmer: &'a K,
    pub poll: PollConfig,
}

impl<O, K> CloseEngine<'_, O, K>
where
    O: OrgOperations,
    K: BulkConfirmer,
{
    /// Run the state machine; one outcome per resolved account.
    pub async fn execute<S, SFut>(
        &self,
        request: &CloseRequest,
        sleep: S,
    ) -> Result<Vec<ClosureOutcome>>
    where
        S: Fn(Duration) -> SFut,
        SFut: Future<Output = ()>,
    {
        let management_id = self.ops.management_account_id().await?;

        match &request.target {
            ClosureTarget::AccountId(id) => {
                // Hard stop before even the read call
                if *id == management_id {
                    return Err(OrgError::ManagementAccountClose {
                        account_id: id.clone(),
                    }
                    .into());
                }
                let account = self.ops.describe_account(id.clone()).await?;
                let outcome = self.close_one(&account, request, &sleep).await;
                Ok(vec![outcome])
            }
            ClosureTarget::Email(email) => {
                let accounts = self.ops.list_accounts().await?;
                let account = accounts
                    .into_iter()
                    .find(|a| a.email.as_deref() == Some(email.as_str()))
                    .ok_or_else(|| OrgError::AccountNotFound {
                        lookup: email.clone(),
                    })?;
                if account.id == management_id {
                    return Err(OrgError::ManagementAccountClose {
                        account_id: account.id,
                    }
                    .into());
                }
                let outcome = self.close_one(&account, request, &sleep).await;
                Ok(vec![outcome])
            }
            ClosureTarget::All => self.close_all(request, management_id, &sleep).await,
        }
    }

    /// Bulk path: list, partition, warn on the rate ceiling, confirm, then
    /// close sequentially in discovery order.
    async fn close_all<S, SFut>(
        &self,
        request: &CloseRequest,
        management_id: String,
        sleep: &S,
    ) -> Result<Vec<ClosureOutcome>>
    where
        S: Fn(Duration) -> SFut,
        SFut: Future<Output = ()>,
    {
        let members: Vec<AccountSummary> = self
            .ops
            .list_accounts()
            .await?
            .into_iter()
            .filter(|a| a.id != management_id)
            .collect();

        let to_close = members.iter().filter(|a| a.status.is_closable()).count();
        info!(
            total_members = members.len(),
            to_close,
            already_closed = members.len() - to_close,
            "Resolved bulk closure targets"
        );

        // No historical closure tracking (no local state): the ceiling is
        // advisory, surfaced before any mutating call.
        let ceiling = closure_rate_ceiling(members.len());
        if to_close > ceiling {
            warn!(
                requested = to_close,
                ceiling,
                "Batch exceeds the closure quota of {ceiling} per rolling 30-day window; \
                 later closures may be rejected by the provider"
            );
        }

        if to_close > 0 && !request.dry_run {
            let confirmed = self.confirmer.confirm(to_close)?;
            if !confirmed {
                anyhow::bail!("Bulk closure aborted: confirmation declined");
            }
        }

        let mut outcomes = Vec::with_capacity(members.len());
        for (i, account) in members.iter().enumerate() {
            info!(
                account_id = %account.id,
                index = i + 1,
                total = members.len(),
                "Processing account"
            );
            outcomes.push(self.close_one(account, request, sleep).await);
        }
        Ok(outcomes)
    }

    /// Close a single resolved account, isolating any failure to its
    /// outcome entry.
    async fn close_one<S, SFut>(
        &self,
        account: &AccountSummary,
        request: &CloseRequest,
        sleep: &S,
    ) -> ClosureOutcome
    where
        S: Fn(Duration) -> SFut,
        SFut: Future<Output = ()>,
    {
        let previous_status = account.status;
        let mut outcome = ClosureOutcome {
            account_id: account.id.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
            previous_status: previous_status.to_string(),
            final_status: FinalStatus::AlreadyClosed,
            requested_closure: false,
            error: None,
        };

        // PRECHECKED: idempotency guarantee - nothing to do for an
        // account that already left ACTIVE.
        if !previous_status.is_closable() {
            info!(
                account_id = %account.id,
                status = %previous_status,
                "Account is not active, skipping closure"
            );
            return outcome;
        }

        if request.dry_run {
            info!(account_id = %account.id, "Dry-run: account would be closed");
            outcome.final_status = FinalStatus::DryRun;
            return outcome;
        }

        // CLOSE_REQUESTED
        match self.ops.close_account(account.id.clone()).await {
            Ok(CloseRequestOutcome::AlreadyClosed) => {
                outcome.requested_closure = true;
                outcome.final_status = FinalStatus::AlreadyClosed;
                return outcome;
            }
            Ok(CloseRequestOutcome::Requested) => {
                outcome.requested_closure = true;
            }
            Err(e) => {
                warn!(account_id = %account.id, error = %e, "Closure request failed");
                outcome.final_status = FinalStatus::Active;
                outcome.error = Some(format!("{e:#}"));
                return outcome;
            }
        }

        if request.no_wait {
            outcome.final_status = FinalStatus::CloseRequested;
            return outcome;
        }

        // POLLING: wait for the account to leave ACTIVE. The closure is
        // asynchronous, so an exhausted budget is a warning, not a failure.
        let ops = self.ops;
        let account_id = account.id.clone();
        let polled = poll_until(
            self.poll,
            move || {
                let account_id = account_id.clone();
                async move {
                    let current = ops.describe_account(account_id).await?;
                    info!(account_id = %current.id, status = %current.status, "Closure status");
                    if current.status.is_closable() {
                        Ok(None)
                    } else {
                        Ok(Some(current.status))
                    }
                }
            },
            sleep,
            "account closure",
        )
        .await;

        match polled {
            Ok(PollOutcome::Ready(status)) => {
                outcome.final_status = FinalStatus::from(status);
            }
            Ok(PollOutcome::TimedOut { attempts }) => {
                warn!(
                    account_id = %account.id,
                    attempts,
                    "Account still active after polling budget; closure may still complete"
                );
                outcome.final_status = FinalStatus::Active;
            }
            Err(e) => {
                warn!(account_id = %account.id, error = %e, "Closure status polling failed");
                outcome.final_status = FinalStatus::Active;
                outcome.error = Some(format!("{e:#}"));
            }
        }

        outcome
    }
}
