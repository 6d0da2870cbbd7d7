use password_policy_core::contract::ROLE_SESSION_NAME;
use thiserror::Error;

pub const PARTITION_ENV: &str = "AWS_PARTITION";
pub const TARGET_ROLE_ENV: &str = "TARGET_ROLE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    pub partition: String,
    pub target_role: String,
    pub role_session_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be configured")]
    Missing(&'static str),
}

impl HandlerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            partition: required(&lookup, PARTITION_ENV)?,
            target_role: required(&lookup, TARGET_ROLE_ENV)?,
            role_session_name: ROLE_SESSION_NAME.to_string(),
        })
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(key))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    #[test]
    fn reads_partition_and_role() {
        let config = HandlerConfig::from_lookup(lookup_from(&[
            (PARTITION_ENV, "aws"),
            (TARGET_ROLE_ENV, "PasswordPolicyExecution"),
        ]))
        .expect("config should load");

        assert_eq!(config.partition, "aws");
        assert_eq!(config.target_role, "PasswordPolicyExecution");
        assert_eq!(config.role_session_name, "assumed-role-session");
    }

    #[test]
    fn missing_partition_is_reported() {
        let error = HandlerConfig::from_lookup(lookup_from(&[(TARGET_ROLE_ENV, "Role")]))
            .expect_err("partition is required");
        assert_eq!(error, ConfigError::Missing(PARTITION_ENV));
        assert_eq!(error.to_string(), "AWS_PARTITION must be configured");
    }

    #[test]
    fn blank_role_is_treated_as_missing() {
        let error = HandlerConfig::from_lookup(lookup_from(&[
            (PARTITION_ENV, "aws"),
            (TARGET_ROLE_ENV, "   "),
        ]))
        .expect_err("blank role should fail");
        assert_eq!(error, ConfigError::Missing(TARGET_ROLE_ENV));
    }
}
