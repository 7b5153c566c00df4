//! Serializable lifecycle result records
//!
//! These are the machine-readable documents printed to stdout at the end
//! of a run. Field names are camelCase on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::{CreateState, FinalStatus};

/// Result of one account creation, immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AccountRecord {
    /// Provider-assigned 12-digit account id (absent for dry-run)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub status: CreateState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ou_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ou_name: Option<String>,
    /// Whether the cross-account access role was assumable at creation time
    pub validated: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dry_run: bool,
    /// Partial-success conditions (OU move failed, counter write failed,
    /// validation unreachable). Never silently dropped.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Per-account result of a closure attempt (array element for bulk runs).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClosureOutcome {
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Status observed before any mutating call
    pub previous_status: String,
    pub final_status: FinalStatus,
    /// Whether a CloseAccount call was actually issued
    pub requested_closure: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClosureOutcome {
    /// An outcome counts as failed only when the close call itself was
    /// rejected; idempotent skips and poll timeouts do not.
    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn creation_record_serializes_camel_case() {
        let record = AccountRecord {
            account_id: Some("123456789012".into()),
            name: "demo".into(),
            email: "will+5-demo@example.com".into(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            status: CreateState::Succeeded,
            ou_id: Some("ou-root-abcd1234".into()),
            ou_name: Some("Sandbox".into()),
            validated: true,
            dry_run: false,
            warnings: vec![],
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["accountId"], "123456789012");
        assert_eq!(json["status"], "SUCCEEDED");
        assert_eq!(json["ouName"], "Sandbox");
        assert_eq!(json["validated"], true);
        // empty warnings and a false dry-run flag are omitted entirely
        assert!(json.get("warnings").is_none());
        assert!(json.get("dryRun").is_none());
    }

    #[test]
    fn closure_outcome_serializes_camel_case() {
        let outcome = ClosureOutcome {
            account_id: "210987654321".into(),
            name: Some("old-sandbox".into()),
            email: Some("will+3-old-sandbox@example.com".into()),
            previous_status: "ACTIVE".into(),
            final_status: FinalStatus::PendingClosure,
            requested_closure: true,
            error: None,
        };

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["accountId"], "210987654321");
        assert_eq!(json["previousStatus"], "ACTIVE");
        assert_eq!(json["finalStatus"], "PENDING_CLOSURE");
        assert!(json.get("error").is_none());
        assert!(!outcome.is_failure());
    }

    #[test]
    fn failed_outcome_carries_error() {
        let outcome = ClosureOutcome {
            account_id: "210987654321".into(),
            name: None,
            email: None,
            previous_status: "ACTIVE".into(),
            final_status: FinalStatus::Active,
            requested_closure: true,
            error: Some("ConstraintViolationException: quota exceeded".into()),
        };
        assert!(outcome.is_failure());
    }
}
