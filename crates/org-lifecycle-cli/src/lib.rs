//! org-lifecycle - AWS Organizations member-account lifecycle tooling
//!
//! This crate provides the `org-lifecycle` binary: it creates member
//! accounts with deterministic, collision-free email addresses, places
//! them into an organizational unit and validates cross-account access,
//! and closes accounts individually or in bulk following the provider's
//! asynchronous closure lifecycle.

pub mod aws;
pub mod config;
pub mod engine;
pub mod wait;
