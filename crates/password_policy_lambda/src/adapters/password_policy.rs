use password_policy_core::properties::PasswordPolicySpec;

use crate::handlers::credentials::CredentialSession;

/// Outcome of a delete call. `AlreadyAbsent` is the IAM `NoSuchEntity` case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyRemoval {
    Deleted,
    AlreadyAbsent,
    Failed(String),
}

pub trait PasswordPolicyApi {
    fn update_account_password_policy(&self, policy: &PasswordPolicySpec) -> Result<(), String>;

    fn delete_account_password_policy(&self) -> PolicyRemoval;
}

impl<T: PasswordPolicyApi + ?Sized> PasswordPolicyApi for &T {
    fn update_account_password_policy(&self, policy: &PasswordPolicySpec) -> Result<(), String> {
        (**self).update_account_password_policy(policy)
    }

    fn delete_account_password_policy(&self) -> PolicyRemoval {
        (**self).delete_account_password_policy()
    }
}

/// Builds an IAM client bound to a resolved session and its region.
pub trait PasswordPolicyConnector {
    fn connect(&self, session: &CredentialSession) -> Box<dyn PasswordPolicyApi + '_>;
}
