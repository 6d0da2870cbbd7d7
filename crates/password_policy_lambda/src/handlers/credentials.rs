use password_policy_core::stack::{is_account_id, AssumeRoleTarget};
use serde_json::json;
use thiserror::Error;

use crate::adapters::identity::{IdentityService, TemporaryCredentials};
use crate::logging::log_info;

const COMPONENT: &str = "credential_resolver";

/// Identity the IAM client acts under for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSession {
    /// The function's own credentials; the caller already is the target account.
    Default { region: String },
    Assumed {
        region: String,
        role_arn: String,
        credentials: TemporaryCredentials,
    },
}

impl CredentialSession {
    pub fn region(&self) -> &str {
        match self {
            Self::Default { region } | Self::Assumed { region, .. } => region,
        }
    }

    pub fn is_assumed(&self) -> bool {
        matches!(self, Self::Assumed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("failed to query caller identity: {0}")]
    Identity(String),
    #[error("caller identity returned an unrecognized account id '{0}'")]
    UnrecognizedCallerAccount(String),
    #[error("failed to assume role {role_arn}: {reason}")]
    AssumeRole { role_arn: String, reason: String },
}

/// Returns the default session when the caller already runs in the target
/// account, otherwise assumes `target.role_arn` exactly once.
pub fn resolve_session(
    identity: &(impl IdentityService + ?Sized),
    target: &AssumeRoleTarget,
    region: &str,
) -> Result<CredentialSession, CredentialError> {
    let caller_account = identity
        .caller_account_id()
        .map_err(CredentialError::Identity)?;
    if !is_account_id(&caller_account) {
        return Err(CredentialError::UnrecognizedCallerAccount(caller_account));
    }

    if caller_account == target.account_id {
        log_info(
            COMPONENT,
            "same_account_session",
            json!({
                "account_id": caller_account,
                "region": region,
            }),
        );
        return Ok(CredentialSession::Default {
            region: region.to_string(),
        });
    }

    let credentials = identity
        .assume_role(&target.role_arn, &target.session_name)
        .map_err(|reason| CredentialError::AssumeRole {
            role_arn: target.role_arn.clone(),
            reason,
        })?;
    log_info(
        COMPONENT,
        "role_assumed",
        json!({
            "caller_account_id": caller_account,
            "target_account_id": target.account_id.clone(),
            "role_arn": target.role_arn.clone(),
            "region": region,
        }),
    );

    Ok(CredentialSession::Assumed {
        region: region.to_string(),
        role_arn: target.role_arn.clone(),
        credentials,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        credentials_expiration, sample_credentials, FakeIdentityService, OTHER_ACCOUNT,
        STACK_ACCOUNT,
    };

    fn target() -> AssumeRoleTarget {
        AssumeRoleTarget {
            role_arn: format!("arn:aws:iam::{STACK_ACCOUNT}:role/PasswordPolicyExecution"),
            account_id: STACK_ACCOUNT.to_string(),
            session_name: "assumed-role-session".to_string(),
        }
    }

    #[test]
    fn same_account_skips_role_assumption() {
        let identity = FakeIdentityService::in_account(STACK_ACCOUNT);

        let session =
            resolve_session(&identity, &target(), "us-east-1").expect("session should resolve");

        assert_eq!(
            session,
            CredentialSession::Default {
                region: "us-east-1".to_string()
            }
        );
        assert_eq!(identity.identity_calls(), 1);
        assert!(identity.assume_role_calls().is_empty());
    }

    #[test]
    fn other_account_assumes_role_once() {
        let identity = FakeIdentityService::in_account(OTHER_ACCOUNT);

        let session =
            resolve_session(&identity, &target(), "eu-west-1").expect("session should resolve");

        assert_eq!(
            identity.assume_role_calls(),
            vec![(target().role_arn, "assumed-role-session".to_string())]
        );
        assert!(session.is_assumed());
        assert_eq!(session.region(), "eu-west-1");
        match session {
            CredentialSession::Assumed { credentials, .. } => {
                assert_eq!(credentials, sample_credentials());
                assert_eq!(credentials.expiration, Some(credentials_expiration()));
            }
            other => panic!("expected assumed session, got {other:?}"),
        }
    }

    #[test]
    fn identity_failure_is_fatal() {
        let identity = FakeIdentityService::failing_identity("ExpiredToken");

        let error = resolve_session(&identity, &target(), "us-east-1")
            .expect_err("identity failure should propagate");

        assert_eq!(error, CredentialError::Identity("ExpiredToken".to_string()));
        assert!(identity.assume_role_calls().is_empty());
    }

    #[test]
    fn assume_role_failure_names_the_role() {
        let identity =
            FakeIdentityService::in_account(OTHER_ACCOUNT).with_assume_role_failure("AccessDenied");

        let error = resolve_session(&identity, &target(), "us-east-1")
            .expect_err("assume role failure should propagate");

        let message = error.to_string();
        assert!(message.contains("AccessDenied"));
        assert!(message.contains(&target().role_arn));
    }

    #[test]
    fn unrecognized_caller_account_is_fatal() {
        let identity = FakeIdentityService::in_account("arn:aws:sts::111111111111:assumed-role/x");

        let error = resolve_session(&identity, &target(), "us-east-1")
            .expect_err("non account id should be rejected");

        assert!(matches!(error, CredentialError::UnrecognizedCallerAccount(_)));
        assert!(identity.assume_role_calls().is_empty());
    }
}
