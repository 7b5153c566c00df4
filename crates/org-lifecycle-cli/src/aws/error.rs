//! AWS error classification and handling
//!
//! Provides typed errors for Organizations/SSM/STS operations using the
//! `.code()` method instead of string matching on Debug format.

use thiserror::Error;

/// Error categories for lifecycle orchestration
#[derive(Debug, Clone, Error)]
pub enum OrgError {
    /// No member account matched the id or email used for lookup
    #[error("Account not found: {lookup}")]
    AccountNotFound { lookup: String },

    /// OU name search exhausted the tree without a match
    #[error("Organizational unit not found: {name}")]
    OuNotFound { name: String },

    /// The management account can never be closed
    #[error("Account {account_id} is the organization's management account and cannot be closed")]
    ManagementAccountClose { account_id: String },

    /// Creation poll budget exhausted; the request may still complete
    /// asynchronously, so the caller may retry with the same inputs
    #[error("Account creation timed out after {attempts} attempts (request {request_id})")]
    CreationTimeout { request_id: String, attempts: u32 },

    /// Provider reported the creation request terminally failed
    #[error("Account creation failed: {reason}")]
    CreationFailed { reason: String },

    /// The single counter write was rejected. The dependent account exists
    /// regardless; callers surface this as a warning, never a rollback.
    #[error("Counter write failed at {path}: {message}")]
    CounterWrite { path: String, message: String },

    /// Role assumption denied or source credentials expired
    #[error("Authentication failed: {message}")]
    AuthFailure { message: String },

    /// Account was already closed (idempotent success for closure)
    #[error("Account is already closed")]
    AlreadyClosed,

    /// Rate limit exceeded (retryable within a poll budget)
    #[error("Rate limit exceeded")]
    Throttled,

    /// Another Organizations mutation is in flight (retryable)
    #[error("Concurrent organization modification in progress")]
    ConcurrentModification,

    /// Generic resource-not-found from the provider
    #[error("Resource not found: {resource_type} '{resource_id}'")]
    NotFound {
        resource_type: &'static str,
        resource_id: String,
    },

    /// Generic AWS SDK error with code and message
    #[error("AWS error: {message}")]
    Sdk {
        code: Option<String>,
        message: String,
    },
}

impl OrgError {
    /// Check if this error is safe to retry inside a poll budget
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            OrgError::Throttled | OrgError::ConcurrentModification | OrgError::CreationTimeout { .. }
        )
    }

    /// Check if this is the idempotent "already closed" condition
    pub fn is_already_closed(&self) -> bool {
        matches!(self, OrgError::AlreadyClosed)
    }

    /// Check if this is a credential problem (fatal, never retried)
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, OrgError::AuthFailure { .. })
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            OrgError::NotFound { .. } | OrgError::AccountNotFound { .. } | OrgError::OuNotFound { .. }
        )
    }
}

/// Known error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "AccountNotFoundException",
    "OrganizationalUnitNotFoundException",
    "ParentNotFoundException",
    "ChildNotFoundException",
    "CreateAccountStatusNotFoundException",
    "ParameterNotFound",
];

/// Known error codes for the idempotent closed condition
const ALREADY_CLOSED_CODES: &[&str] = &["AccountAlreadyClosedException"];

/// Known error codes for throttling/rate limiting
const THROTTLING_CODES: &[&str] = &[
    "TooManyRequestsException",
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
];

/// Known error codes for credential and trust-policy problems
const AUTH_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "AccessDeniedForDependencyException",
    "ExpiredToken",
    "ExpiredTokenException",
    "InvalidClientTokenId",
    "UnrecognizedClientException",
];

/// Known error codes for in-flight organization mutations
const CONCURRENT_CODES: &[&str] = &["ConcurrentModificationException"];

/// Classify an AWS SDK error using the error code.
pub fn classify_aws_error(code: Option<&str>, message: Option<&str>) -> OrgError {
    let message = message.unwrap_or("Unknown error").to_string();

    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => OrgError::NotFound {
            resource_type: "resource",
            resource_id: message,
        },
        Some(c) if ALREADY_CLOSED_CODES.contains(&c) => OrgError::AlreadyClosed,
        Some(c) if THROTTLING_CODES.contains(&c) => OrgError::Throttled,
        Some(c) if AUTH_CODES.contains(&c) => OrgError::AuthFailure { message },
        Some(c) if CONCURRENT_CODES.contains(&c) => OrgError::ConcurrentModification,
        _ => OrgError::Sdk {
            code: code.map(|s| s.to_string()),
            message,
        },
    }
}

/// Classify an error from an anyhow::Error by extracting the AWS error code.
///
/// Walks the error chain using `ProvideErrorMetadata` to extract `.code()`
/// and `.message()` from any AWS SDK error. Falls back to string matching on
/// the Debug representation if no typed error is found.
pub fn classify_anyhow_error(error: &anyhow::Error) -> OrgError {
    use aws_sdk_organizations::error::ProvideErrorMetadata;

    macro_rules! try_downcast {
        ($cause:expr, $sdk:ident, $op:ident, $err:ident) => {
            if let Some(e) = $cause.downcast_ref::<$sdk::error::SdkError<
                $sdk::operation::$op::$err,
            >>() {
                let meta = ProvideErrorMetadata::meta(e);
                return classify_aws_error(meta.code(), meta.message());
            }
        };
    }

    for cause in error.chain() {
        // Already classified upstream
        if let Some(e) = cause.downcast_ref::<OrgError>() {
            return e.clone();
        }
        // Organizations operation errors
        try_downcast!(cause, aws_sdk_organizations, create_account, CreateAccountError);
        try_downcast!(
            cause,
            aws_sdk_organizations,
            describe_create_account_status,
            DescribeCreateAccountStatusError
        );
        try_downcast!(cause, aws_sdk_organizations, describe_account, DescribeAccountError);
        try_downcast!(cause, aws_sdk_organizations, close_account, CloseAccountError);
        try_downcast!(cause, aws_sdk_organizations, list_accounts, ListAccountsError);
        try_downcast!(cause, aws_sdk_organizations, move_account, MoveAccountError);
        try_downcast!(
            cause,
            aws_sdk_organizations,
            describe_organizational_unit,
            DescribeOrganizationalUnitError
        );
        // SSM operation errors
        try_downcast!(cause, aws_sdk_ssm, get_parameter, GetParameterError);
        try_downcast!(cause, aws_sdk_ssm, put_parameter, PutParameterError);
        // STS operation errors
        try_downcast!(cause, aws_sdk_sts, assume_role, AssumeRoleError);
    }

    // Fallback: extract error code from debug string representation
    let debug_str = format!("{:?}", error);
    if let Some(code) = extract_error_code(&debug_str) {
        return classify_aws_error(Some(&code), Some(&debug_str));
    }

    OrgError::Sdk {
        code: None,
        message: error.to_string(),
    }
}

/// All known error codes for extraction from debug strings (flat list)
const ALL_KNOWN_CODES: &[&str] = &[
    // Not found
    "AccountNotFoundException",
    "OrganizationalUnitNotFoundException",
    "ParentNotFoundException",
    "ChildNotFoundException",
    "CreateAccountStatusNotFoundException",
    "ParameterNotFound",
    // Already closed
    "AccountAlreadyClosedException",
    // Throttling
    "TooManyRequestsException",
    "Throttling",
    "ThrottlingException",
    "RequestLimitExceeded",
    // Auth
    "AccessDenied",
    "AccessDeniedException",
    "AccessDeniedForDependencyException",
    "ExpiredToken",
    "ExpiredTokenException",
    "InvalidClientTokenId",
    "UnrecognizedClientException",
    // Concurrency
    "ConcurrentModificationException",
    // Quotas
    "ConstraintViolationException",
];

/// Extract an AWS error code from a debug string representation
fn extract_error_code(debug_str: &str) -> Option<String> {
    for code in ALL_KNOWN_CODES {
        if debug_str.contains(code) {
            return Some((*code).to_string());
        }
    }

    // Try to extract any code from `code: Some("...")` pattern
    if let Some(start) = debug_str.find("code: Some(\"") {
        let rest = &debug_str[start + 12..];
        if let Some(end) = rest.find('"') {
            return Some(rest[..end].to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_codes() {
        for code in NOT_FOUND_CODES {
            let err = classify_aws_error(Some(code), Some("some message"));
            assert!(err.is_not_found(), "Expected NotFound for code: {code}");
        }
    }

    #[test]
    fn already_closed_code() {
        let err = classify_aws_error(Some("AccountAlreadyClosedException"), Some("msg"));
        assert!(err.is_already_closed());
    }

    #[test]
    fn throttling_codes() {
        for code in THROTTLING_CODES {
            let err = classify_aws_error(Some(code), Some("msg"));
            assert!(err.is_retryable(), "Expected retryable for code: {code}");
            assert!(matches!(err, OrgError::Throttled));
        }
    }

    #[test]
    fn auth_codes_are_fatal_not_retryable() {
        for code in AUTH_CODES {
            let err = classify_aws_error(Some(code), Some("denied"));
            assert!(err.is_auth_failure(), "Expected AuthFailure for code: {code}");
            assert!(!err.is_retryable());
        }
    }

    #[test]
    fn concurrent_modification_is_retryable() {
        let err = classify_aws_error(Some("ConcurrentModificationException"), Some("busy"));
        assert!(err.is_retryable());
        assert!(matches!(err, OrgError::ConcurrentModification));
    }

    #[test]
    fn unknown_and_missing_codes() {
        let err = classify_aws_error(Some("SomeNewError"), Some("details"));
        assert!(matches!(err, OrgError::Sdk { .. }));

        let err2 = classify_aws_error(None, Some("something failed"));
        assert!(matches!(err2, OrgError::Sdk { code: None, .. }));
    }

    #[test]
    fn creation_timeout_carries_retriable_flag() {
        let err = OrgError::CreationTimeout {
            request_id: "car-abc123".into(),
            attempts: 30,
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn extract_known_codes_from_debug_string() {
        for code in ALL_KNOWN_CODES {
            let debug_str = format!("SdkError {{ code: Some(\"{code}\"), message: \"fail\" }}");
            assert!(
                extract_error_code(&debug_str).is_some(),
                "Failed to extract any code from string containing: {code}"
            );
        }
    }

    #[test]
    fn extract_code_from_code_field() {
        let debug_str = r#"SdkError { code: Some("SomeRandomCode"), message: "fail" }"#;
        assert_eq!(
            extract_error_code(debug_str).as_deref(),
            Some("SomeRandomCode")
        );
    }

    #[test]
    fn extract_none_from_unrelated_string() {
        assert!(extract_error_code("connection refused").is_none());
    }
}
