//! Organizational-unit resolution and placement
//!
//! Name lookup walks the OU tree from the roots with an explicit worklist,
//! bounded in depth against malformed listings; first exact match wins.
//! Callers that already know the OU id skip the traversal entirely.

use anyhow::{Context, Result};
use std::collections::VecDeque;
use tracing::{info, warn};

use org_lifecycle_common::defaults::MAX_OU_TREE_DEPTH;

use crate::aws::error::OrgError;
use crate::aws::orgs::{OrgOperations, OuSummary};

/// Target OU for a new account
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OuTarget {
    /// Search the tree for an OU with this exact name
    Name(String),
    /// Use the id directly, skipping the search cost
    Id(String),
}

/// Resolve an OU target to a concrete id and name.
pub async fn resolve_ou<O: OrgOperations>(ops: &O, target: &OuTarget) -> Result<OuSummary> {
    match target {
        OuTarget::Id(id) => ops
            .describe_organizational_unit(id.clone())
            .await
            .with_context(|| format!("OU id {id} did not resolve")),
        OuTarget::Name(name) => find_ou_by_name(ops, name).await,
    }
}

/// Breadth-first search of the OU tree for an exact name match.
pub async fn find_ou_by_name<O: OrgOperations>(ops: &O, name: &str) -> Result<OuSummary> {
    let roots = ops.list_roots().await?;

    let mut worklist: VecDeque<(String, usize)> =
        roots.into_iter().map(|r| (r.id, 0)).collect();

    while let Some((parent_id, depth)) = worklist.pop_front() {
        if depth >= MAX_OU_TREE_DEPTH {
            warn!(
                parent_id = %parent_id,
                depth,
                "OU tree exceeds depth bound, pruning branch"
            );
            continue;
        }

        let children = ops
            .list_organizational_units_for_parent(parent_id)
            .await?;

        for child in children {
            if child.name == name {
                info!(ou_id = %child.id, ou_name = %child.name, "Resolved OU by name");
                return Ok(child);
            }
            worklist.push_back((child.id, depth + 1));
        }
    }

    Err(OrgError::OuNotFound {
        name: name.to_string(),
    }
    .into())
}

/// Move an account into the target OU, skipping when it is already there.
///
/// Performed exactly once per creation; the caller treats a failure as
/// partial success, never a rollback.
pub async fn move_account_to_ou<O: OrgOperations>(
    ops: &O,
    account_id: &str,
    destination: &OuSummary,
) -> Result<()> {
    let source = ops.parent_of(account_id.to_string()).await?;

    if source == destination.id {
        info!(account_id = %account_id, ou_id = %destination.id, "Account already in target OU");
        return Ok(());
    }

    ops.move_account(account_id.to_string(), source, destination.id.clone())
        .await
}
