//! Organizations integration tests - actually call AWS APIs
//!
//! These tests are marked `#[ignore]` and only run with:
//! ```
//! AWS_PROFILE=your_profile cargo test --test aws_integration -- --ignored
//! ```
//!
//! They are read-only: no account is created, closed, or moved.

mod aws_test_helpers;

use aws_test_helpers::*;
use org_lifecycle_cli::aws::{get_caller_identity, AwsContext, OrgOperations, OrganizationsClient};
use org_lifecycle_cli::engine::ou::find_ou_by_name;

#[tokio::test]
#[ignore = "requires AWS credentials"]
async fn caller_identity_resolves() {
    let region = get_test_region();
    let ctx = AwsContext::ambient(Some(&region), None).await;

    let identity = get_caller_identity(&ctx)
        .await
        .expect("AWS credentials required - set AWS_PROFILE or AWS_ACCESS_KEY_ID");

    assert_eq!(identity.account_id.len(), 12, "Account IDs are 12 digits");
    assert!(identity.arn.starts_with("arn:aws:"));
}

#[tokio::test]
#[ignore = "requires AWS credentials in an organization's management account"]
async fn management_account_appears_in_listing() {
    let region = get_test_region();
    let ctx = AwsContext::ambient(Some(&region), None).await;
    let ops = OrganizationsClient::from_context(&ctx);

    let management_id = ops
        .management_account_id()
        .await
        .expect("Should describe the organization");

    let accounts = ops.list_accounts().await.expect("Should list accounts");
    assert!(
        accounts.iter().any(|a| a.id == management_id),
        "The management account should be part of the paginated listing"
    );
}

#[tokio::test]
#[ignore = "requires AWS credentials in an organization's management account"]
async fn ou_search_misses_cleanly() {
    let region = get_test_region();
    let ctx = AwsContext::ambient(Some(&region), None).await;
    let ops = OrganizationsClient::from_context(&ctx);

    // An OU name that should exist in no organization
    let result = find_ou_by_name(&ops, "org-lifecycle-integration-missing-ou").await;
    assert!(result.is_err(), "Nonsense OU name should not resolve");
}
