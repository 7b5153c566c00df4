//! Default configuration values shared between the engines and the CLI
//!
//! These constants keep polling and validation behavior consistent across
//! the creation and closure paths.

/// Default seconds between status poll attempts
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Default maximum poll attempts (30 x 10s = 5 minutes total)
pub const DEFAULT_POLL_MAX_ATTEMPTS: u32 = 30;

/// Role created by Organizations in every new member account
pub const DEFAULT_VALIDATION_ROLE: &str = "OrganizationAccountAccessRole";

/// Maximum attempts when validating cross-account access to a new account
pub const VALIDATION_MAX_ATTEMPTS: usize = 6;

/// Initial delay before retrying access validation (seconds)
pub const VALIDATION_INITIAL_DELAY_SECS: u64 = 5;

/// Delay cap for access validation retries (seconds)
pub const VALIDATION_MAX_DELAY_SECS: u64 = 30;

/// Depth bound for OU tree traversal. Organizations allows five levels of
/// nesting; anything deeper indicates a malformed listing response.
pub const MAX_OU_TREE_DEPTH: usize = 16;

// Serde default functions for struct field defaults

/// Returns the default poll interval in seconds
pub fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

/// Returns the default maximum poll attempts
pub fn default_poll_max_attempts() -> u32 {
    DEFAULT_POLL_MAX_ATTEMPTS
}

/// Returns the default validation role name
pub fn default_validation_role() -> String {
    DEFAULT_VALIDATION_ROLE.to_string()
}
