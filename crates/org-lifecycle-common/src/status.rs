//! Canonical account and creation status values
//!
//! These enums mirror the wire strings the Organizations API uses
//! (`ACTIVE`, `PENDING_CLOSURE`, `IN_PROGRESS`, ...) so records serialize
//! to exactly what the provider reports.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a member account as reported by DescribeAccount
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum AccountStatus {
    /// Account is open and usable
    Active,
    /// Account has been suspended (closure completed)
    Suspended,
    /// Closure has been requested and is in flight
    PendingClosure,
    /// Status string the provider returned was not recognized
    Unknown,
}

impl AccountStatus {
    /// Parse a wire string, mapping unrecognized values to `Unknown`
    pub fn parse(s: &str) -> Self {
        s.parse().unwrap_or(Self::Unknown)
    }

    /// An account can only be closed while it is still active
    pub fn is_closable(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// State of an asynchronous CreateAccount request
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum CreateState {
    /// Request accepted, account not yet provisioned
    InProgress,
    /// Account exists
    Succeeded,
    /// Provider rejected the request (email in use, quota, ...)
    Failed,
}

impl CreateState {
    /// Parse a wire string, returning None for unknown values
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }

    /// Check if the state is terminal
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Final disposition of a closure attempt, as reported in the outcome record
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum FinalStatus {
    /// Closure observed in flight before the poll budget ran out
    PendingClosure,
    /// Closure completed while we were polling
    Suspended,
    /// Still active when the poll budget ran out (closure is asynchronous
    /// and may complete later)
    Active,
    /// Account was not active to begin with, or the provider reported it
    /// already closed; no mutating call was needed
    AlreadyClosed,
    /// Close was issued and polling was skipped (`--no-wait`)
    CloseRequested,
    /// Dry-run: the account would have been closed
    DryRun,
}

impl From<AccountStatus> for FinalStatus {
    fn from(status: AccountStatus) -> Self {
        match status {
            AccountStatus::Active => Self::Active,
            AccountStatus::Suspended => Self::Suspended,
            AccountStatus::PendingClosure => Self::PendingClosure,
            AccountStatus::Unknown => Self::AlreadyClosed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn account_status_wire_roundtrip() {
        assert_eq!(AccountStatus::parse("ACTIVE"), AccountStatus::Active);
        assert_eq!(
            AccountStatus::parse("PENDING_CLOSURE"),
            AccountStatus::PendingClosure
        );
        assert_eq!(AccountStatus::parse("SUSPENDED"), AccountStatus::Suspended);
        assert_eq!(AccountStatus::parse("banana"), AccountStatus::Unknown);
        assert_eq!(AccountStatus::Active.to_string(), "ACTIVE");
    }

    #[test]
    fn only_active_is_closable() {
        assert!(AccountStatus::Active.is_closable());
        assert!(!AccountStatus::Suspended.is_closable());
        assert!(!AccountStatus::PendingClosure.is_closable());
        assert!(!AccountStatus::Unknown.is_closable());
    }

    #[test]
    fn create_state_terminality() {
        assert!(!CreateState::InProgress.is_terminal());
        assert!(CreateState::Succeeded.is_terminal());
        assert!(CreateState::Failed.is_terminal());
    }

    #[test]
    fn final_status_serializes_as_wire_string() {
        let json = serde_json::to_string(&FinalStatus::PendingClosure).unwrap();
        assert_eq!(json, "\"PENDING_CLOSURE\"");
        let json = serde_json::to_string(&FinalStatus::CloseRequested).unwrap();
        assert_eq!(json, "\"CLOSE_REQUESTED\"");
    }
}
