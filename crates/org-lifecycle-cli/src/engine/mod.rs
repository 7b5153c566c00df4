//! Lifecycle orchestration engines
//!
//! Two entry points, independent of how they are invoked:
//! [`run_create`] drives the creation state machine, [`run_close`] the
//! closure state machine. Each wires credentials, clients and engines for
//! exactly one invocation and produces a structured result.

pub mod close;
pub mod create;
pub mod ou;

pub use close::{CloseEngine, CloseRequest, ClosureTarget, StdinConfirmer};
pub use create::{CreateEngine, CreateRequest, EmailSource};
pub use ou::OuTarget;

use anyhow::{Context, Result};
use tracing::info;

use org_lifecycle_common::record::{AccountRecord, ClosureOutcome};

use crate::aws::counter::SsmCounter;
use crate::aws::credentials::{get_caller_identity, StsAccessValidator};
use crate::aws::orgs::OrganizationsClient;
use crate::config::Config;
use crate::wait::tokio_sleep;

/// Create one member account per the validated configuration.
pub async fn run_create(config: &Config, name: &str, dry_run: bool) -> Result<AccountRecord> {
    let region = config.region.as_deref();

    let mgmt_ctx = config
        .management_target()
        .resolve(region, "lifecycle-create-account")
        .await?;
    let mgmt_identity = get_caller_identity(&mgmt_ctx).await?;
    info!(
        management_account = %mgmt_identity.account_id,
        arn = %mgmt_identity.arn,
        "Operating in management account"
    );

    let email = config.email_source()?;

    // The counter lives in the automation account; only the generated-email
    // path needs a session there.
    let counter = match &email {
        EmailSource::Counter { .. } => {
            let automation_ctx = config
                .automation_target()
                .resolve(region, "lifecycle-counter")
                .await?;
            let automation_identity = get_caller_identity(&automation_ctx).await?;
            info!(
                automation_account = %automation_identity.account_id,
                "Counter store session established"
            );
            let path = config
                .ssm_parameter_path
                .as_ref()
                .context("ssm_parameter_path is required for generated emails")?;
            Some(SsmCounter::new(&automation_ctx, path))
        }
        EmailSource::Override(_) => None,
    };

    let ops = OrganizationsClient::from_context(&mgmt_ctx);
    let validator = StsAccessValidator::new(mgmt_ctx.clone(), config.region.clone());

    let engine = CreateEngine {
        ops: &ops,
        counter: counter.as_ref(),
        validator: &validator,
        poll: config.poll_config(),
        validation_role: config.validation_role_name.clone(),
    };

    let request = CreateRequest {
        name: name.to_string(),
        email,
        ou_target: config.ou_target(),
        tags: config.tags.clone(),
        dry_run,
    };

    engine.execute(&request, tokio_sleep).await
}

/// Close one or many member accounts per the validated configuration.
pub async fn run_close(
    config: &Config,
    target: ClosureTarget,
    dry_run: bool,
    no_wait: bool,
) -> Result<Vec<ClosureOutcome>> {
    let region = config.region.as_deref();

    let mgmt_ctx = config
        .management_target()
        .resolve(region, "lifecycle-close-account")
        .await?;
    let mgmt_identity = get_caller_identity(&mgmt_ctx).await?;
    info!(
        management_account = %mgmt_identity.account_id,
        arn = %mgmt_identity.arn,
        "Operating in management account"
    );

    let ops = OrganizationsClient::from_context(&mgmt_ctx);
    let confirmer = StdinConfirmer;

    let engine = CloseEngine {
        ops: &ops,
        confirmer: &confirmer,
        poll: config.poll_config(),
    };

    let request = CloseRequest {
        target,
        dry_run,
        no_wait,
    };

    engine.execute(&request, tokio_sleep).await
}
