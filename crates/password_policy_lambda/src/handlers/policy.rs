use password_policy_core::contract::ProvisioningEvent;
use password_policy_core::properties::{normalize_event, PasswordPolicySpec};
use password_policy_core::stack::StackIdentity;
use serde_json::json;

use crate::adapters::identity::IdentityService;
use crate::adapters::password_policy::{PasswordPolicyConnector, PolicyRemoval};
use crate::config::HandlerConfig;
use crate::error::HandlerError;
use crate::handlers::credentials::{resolve_session, CredentialSession};
use crate::handlers::lifecycle::LifecycleHandler;
use crate::logging::{log_info, log_warn};

const COMPONENT: &str = "policy_handler";

/// Applies or removes the account password policy for one provisioning event.
///
/// Built per invocation; holds no state beyond borrowed collaborators.
pub struct PasswordPolicyHandler<'a, I: ?Sized, C: ?Sized> {
    config: &'a HandlerConfig,
    identity: &'a I,
    connector: &'a C,
}

impl<'a, I, C> PasswordPolicyHandler<'a, I, C>
where
    I: IdentityService + ?Sized,
    C: PasswordPolicyConnector + ?Sized,
{
    pub fn new(config: &'a HandlerConfig, identity: &'a I, connector: &'a C) -> Self {
        Self {
            config,
            identity,
            connector,
        }
    }

    /// Create/Update path. Properties are validated before any AWS call.
    pub fn apply(&self, event: &mut ProvisioningEvent) -> Result<PasswordPolicySpec, HandlerError> {
        let policy = normalize_event(event)?;
        log_info(
            COMPONENT,
            "properties_normalized",
            json!({
                "logical_resource_id": event.logical_resource_id.clone(),
                "resource_properties": event.resource_properties.clone(),
            }),
        );

        let session = self.session_for(event)?;
        let api = self.connector.connect(&session);
        api.update_account_password_policy(&policy)
            .map_err(|reason| {
                HandlerError::Api(format!("failed to update account password policy: {reason}"))
            })?;

        log_info(
            COMPONENT,
            "policy_updated",
            json!({
                "stack_id": event.stack_id.clone(),
                "region": session.region(),
                "assumed_role": session.is_assumed(),
                "policy": policy,
            }),
        );
        Ok(policy)
    }

    /// Delete path. Never returns `PolicyRemoval::Failed`; that case becomes
    /// `HandlerError::Api`.
    pub fn remove(&self, event: &ProvisioningEvent) -> Result<PolicyRemoval, HandlerError> {
        let session = self.session_for(event)?;
        let api = self.connector.connect(&session);

        match api.delete_account_password_policy() {
            PolicyRemoval::Deleted => {
                log_info(
                    COMPONENT,
                    "policy_deleted",
                    json!({
                        "stack_id": event.stack_id.clone(),
                        "region": session.region(),
                    }),
                );
                Ok(PolicyRemoval::Deleted)
            }
            PolicyRemoval::AlreadyAbsent => {
                log_warn(
                    COMPONENT,
                    "policy_already_absent",
                    json!({
                        "stack_id": event.stack_id.clone(),
                        "message": "The entity does not exist",
                    }),
                );
                Ok(PolicyRemoval::AlreadyAbsent)
            }
            PolicyRemoval::Failed(reason) => {
                Err(HandlerError::Api(format!("Unexpected error: {reason}")))
            }
        }
    }

    fn session_for(&self, event: &ProvisioningEvent) -> Result<CredentialSession, HandlerError> {
        let stack = StackIdentity::parse(&event.stack_id)?;
        let target = stack.assume_role_target(
            &self.config.partition,
            &self.config.target_role,
            &self.config.role_session_name,
        );
        Ok(resolve_session(self.identity, &target, &stack.region)?)
    }
}

impl<I, C> LifecycleHandler for PasswordPolicyHandler<'_, I, C>
where
    I: IdentityService + ?Sized,
    C: PasswordPolicyConnector + ?Sized,
{
    fn create(&self, event: &mut ProvisioningEvent) -> Result<(), HandlerError> {
        self.apply(event).map(|_| ())
    }

    fn update(&self, event: &mut ProvisioningEvent) -> Result<(), HandlerError> {
        self.apply(event).map(|_| ())
    }

    fn delete(&self, event: &ProvisioningEvent) -> Result<(), HandlerError> {
        self.remove(event).map(|_| ())
    }
}
