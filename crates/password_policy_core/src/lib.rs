//! Shared password policy custom resource primitives.
//!
//! This crate owns the provisioning event contract, stack identifier parsing
//! and resource property normalization. It intentionally excludes AWS SDK and
//! Lambda runtime concerns.
//! See `crates/password_policy_lambda` for the runtime integration.

pub mod contract;
pub mod properties;
pub mod stack;
