use crate::contract::ValidationError;

const REGION_SEGMENT: usize = 3;
const ACCOUNT_SEGMENT: usize = 4;
const MIN_ARN_SEGMENTS: usize = 6;

/// Account and region the provisioning stack lives in, taken from its ARN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackIdentity {
    pub region: String,
    pub account_id: String,
}

/// Role to assume in the stack's account when the caller is in another one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleTarget {
    pub role_arn: String,
    pub account_id: String,
    pub session_name: String,
}

impl StackIdentity {
    pub fn parse(stack_id: &str) -> Result<Self, ValidationError> {
        let malformed = |reason: &str| ValidationError::MalformedStackId {
            stack_id: stack_id.to_string(),
            reason: reason.to_string(),
        };

        let segments: Vec<&str> = stack_id.split(':').collect();
        if segments.len() < MIN_ARN_SEGMENTS || segments[0] != "arn" {
            return Err(malformed(
                "expected arn:<partition>:<service>:<region>:<account>:<resource>",
            ));
        }

        let region = segments[REGION_SEGMENT];
        if region.is_empty() {
            return Err(malformed("region segment is empty"));
        }

        let account_id = segments[ACCOUNT_SEGMENT];
        if !is_account_id(account_id) {
            return Err(malformed("account segment must be a 12-digit account id"));
        }

        Ok(Self {
            region: region.to_string(),
            account_id: account_id.to_string(),
        })
    }

    pub fn assume_role_target(
        &self,
        partition: &str,
        role_name: &str,
        session_name: &str,
    ) -> AssumeRoleTarget {
        AssumeRoleTarget {
            role_arn: role_arn(partition, &self.account_id, role_name),
            account_id: self.account_id.clone(),
            session_name: session_name.to_string(),
        }
    }
}

pub fn role_arn(partition: &str, account_id: &str, role_name: &str) -> String {
    format!("arn:{partition}:iam::{account_id}:role/{role_name}")
}

pub fn is_account_id(candidate: &str) -> bool {
    candidate.len() == 12 && candidate.bytes().all(|byte| byte.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_region_and_account() {
        let stack = StackIdentity::parse(
            "arn:aws:cloudformation:us-east-1:111111111111:stack/x/1f2e3d4c",
        )
        .expect("stack id should parse");

        assert_eq!(stack.region, "us-east-1");
        assert_eq!(stack.account_id, "111111111111");
    }

    #[test]
    fn builds_role_arn_from_configured_partition() {
        let stack = StackIdentity::parse(
            "arn:aws-us-gov:cloudformation:us-gov-west-1:222222222222:stack/x/1",
        )
        .expect("stack id should parse");

        let target = stack.assume_role_target("aws-us-gov", "PasswordPolicyAdmin", "session");
        assert_eq!(
            target.role_arn,
            "arn:aws-us-gov:iam::222222222222:role/PasswordPolicyAdmin"
        );
        assert_eq!(target.account_id, "222222222222");
        assert_eq!(target.session_name, "session");
    }

    #[test]
    fn rejects_short_or_non_arn_identifiers() {
        for stack_id in [
            "",
            "stack/x",
            "arn:aws:cloudformation:us-east-1:111111111111",
            "urn:aws:cloudformation:us-east-1:111111111111:stack/x",
        ] {
            let error = StackIdentity::parse(stack_id).expect_err("should be rejected");
            assert!(matches!(error, ValidationError::MalformedStackId { .. }));
        }
    }

    #[test]
    fn rejects_ambiguous_account_segments() {
        for account in ["", "11111111111", "1111111111111", "assumed-role", "11111111111a"] {
            let stack_id = format!("arn:aws:cloudformation:us-east-1:{account}:stack/x");
            let error = StackIdentity::parse(&stack_id).expect_err("should be rejected");
            assert!(error.to_string().contains("12-digit account id"));
        }
    }

    #[test]
    fn rejects_empty_region() {
        let error = StackIdentity::parse("arn:aws:cloudformation::111111111111:stack/x")
            .expect_err("should be rejected");
        assert!(error.to_string().contains("region segment is empty"));
    }
}
