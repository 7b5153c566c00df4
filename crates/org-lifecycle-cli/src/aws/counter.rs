//! Shared sequence counter store
//!
//! A single integer parameter in the automation account's SSM Parameter
//! Store hands out collision-free email local-parts. The store itself does
//! not enforce read-then-write atomicity: the engine treats `read` as a
//! snapshot and only calls `increment_from` once the dependent creation
//! has durably succeeded. Exactly one write attempt, never retried - a
//! duplicate increment would corrupt uniqueness.

use anyhow::{Context, Result};
use aws_sdk_ssm::types::ParameterType;
use tracing::info;

use crate::aws::context::AwsContext;
use crate::aws::error::OrgError;

/// Operations on the shared sequence counter.
///
/// Seam between the creation engine and SSM so orchestration logic can be
/// unit tested without hitting real AWS. Platforms with a conditional-write
/// parameter store can implement `increment_from` as a real compare-and-set.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait CounterStore: Send + Sync {
    /// Read the current counter value (a snapshot, not a reservation)
    async fn read(&self) -> Result<u64>;

    /// Advance the counter from the previously read value.
    ///
    /// Called at most once per creation, only after terminal success.
    async fn increment_from(&self, expected: u64) -> Result<u64>;
}

/// SSM-backed counter store
pub struct SsmCounter {
    client: aws_sdk_ssm::Client,
    path: String,
}

impl SsmCounter {
    pub fn new(ctx: &AwsContext, path: impl Into<String>) -> Self {
        Self {
            client: ctx.ssm_client(),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl CounterStore for SsmCounter {
    async fn read(&self) -> Result<u64> {
        let response = self
            .client
            .get_parameter()
            .name(&self.path)
            .send()
            .await
            .map_err(anyhow::Error::from)
            .with_context(|| format!("Failed to read counter parameter {}", self.path))?;

        let raw = response
            .parameter()
            .and_then(|p| p.value())
            .with_context(|| format!("Counter parameter {} has no value", self.path))?;

        let value: u64 = raw.parse().with_context(|| {
            format!("Counter parameter {} is not a valid integer: {raw:?}", self.path)
        })?;

        info!(path = %self.path, value, "Counter read");
        Ok(value)
    }

    async fn increment_from(&self, expected: u64) -> Result<u64> {
        let new_value = expected + 1;

        // Single attempt by contract. SSM has no compare-and-set; the
        // expected prior value is logged so a concurrent-writer race is
        // diagnosable after the fact.
        self.client
            .put_parameter()
            .name(&self.path)
            .value(new_value.to_string())
            .r#type(ParameterType::String)
            .overwrite(true)
            .send()
            .await
            .map_err(|e| OrgError::CounterWrite {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        info!(path = %self.path, from = expected, to = new_value, "Counter advanced");
        Ok(new_value)
    }
}
