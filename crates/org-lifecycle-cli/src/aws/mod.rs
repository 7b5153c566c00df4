//! AWS client modules for the lifecycle CLI
//!
//! This module provides wrappers around AWS SDK clients for:
//! - Organizations: account creation, closure, OU placement
//! - SSM: the shared sequence counter parameter
//! - STS: cross-account role assumption and identity checks

pub mod context;
pub mod counter;
pub mod credentials;
pub mod error;
pub mod orgs;

// Core clients
pub use context::AwsContext;
pub use counter::{CounterStore, SsmCounter};
pub use credentials::{
    assume_role, get_caller_identity, AccessValidator, AccountId, CallerIdentity, CredentialLease,
    SessionTarget, StsAccessValidator,
};
pub use orgs::{
    AccountSummary, CloseRequestOutcome, CreateAccountProgress, OrgOperations,
    OrganizationsClient, OuSummary,
};

// Error handling
pub use error::{classify_anyhow_error, classify_aws_error, OrgError};
