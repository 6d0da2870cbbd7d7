//! AWS-oriented adapters and handlers for the account password policy
//! custom resource.
//!
//! This crate owns runtime integration details (the SNS entry point, lifecycle
//! dispatch, STS credential resolution and the IAM policy calls) on top of the
//! contract primitives in `password_policy_core`.

pub mod adapters;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
#[cfg(feature = "test-helpers")]
pub mod test_helpers;
