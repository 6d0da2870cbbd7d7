use password_policy_core::contract::ProvisioningEvent;
use serde_json::Value;

use crate::adapters::identity::IdentityService;
use crate::adapters::password_policy::PasswordPolicyConnector;
use crate::adapters::response::ResponseSink;
use crate::config::{ConfigError, HandlerConfig};
use crate::error::HandlerError;
use crate::handlers::lifecycle::{
    dispatch_provisioning_event, report_outcome, DispatchReport, InvocationContext,
};
use crate::handlers::policy::PasswordPolicyHandler;

/// Handles one SNS notification carrying a CloudFormation custom resource
/// request. A configuration error is reported to CloudFormation as FAILED
/// rather than leaving the stack waiting on a response.
pub fn handle_notification_event(
    envelope: &Value,
    context: &InvocationContext,
    config: Result<HandlerConfig, ConfigError>,
    identity: &(impl IdentityService + ?Sized),
    connector: &(impl PasswordPolicyConnector + ?Sized),
    sink: &impl ResponseSink,
) -> Result<DispatchReport, HandlerError> {
    let event = unwrap_notification(envelope)?;

    match config {
        Ok(config) => {
            let handler = PasswordPolicyHandler::new(&config, identity, connector);
            dispatch_provisioning_event(event, context, &handler, sink)
        }
        Err(error) => report_outcome(&event, context, Err(error.into()), sink),
    }
}

/// Extracts the provisioning event from `Records[0].Sns.Message`.
pub fn unwrap_notification(envelope: &Value) -> Result<ProvisioningEvent, HandlerError> {
    let record = envelope
        .get("Records")
        .and_then(Value::as_array)
        .ok_or_else(|| HandlerError::Envelope("SNS event must include Records array".to_string()))?
        .first()
        .ok_or_else(|| HandlerError::Envelope("SNS event contains no records".to_string()))?;

    let message = record
        .get("Sns")
        .and_then(|sns| sns.get("Message"))
        .and_then(Value::as_str)
        .ok_or_else(|| HandlerError::Envelope("SNS record Message must be a string".to_string()))?;

    serde_json::from_str(message)
        .map_err(|error| HandlerError::Envelope(format!("invalid provisioning event: {error}")))
}
