//! Recording fakes and fixtures shared by unit and integration tests.
//!
//! Each fake implements one adapter trait and records every call it receives
//! so tests can assert on what would have reached AWS.

use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use password_policy_core::contract::{ProvisioningEvent, RequestType};
use password_policy_core::properties::PasswordPolicySpec;
use serde_json::{json, Value};

use crate::adapters::identity::{IdentityService, TemporaryCredentials};
use crate::adapters::password_policy::{
    PasswordPolicyApi, PasswordPolicyConnector, PolicyRemoval,
};
use crate::adapters::response::ResponseSink;
use crate::config::HandlerConfig;
use crate::handlers::credentials::CredentialSession;
use crate::handlers::lifecycle::InvocationContext;

pub const STACK_ACCOUNT: &str = "111111111111";
pub const OTHER_ACCOUNT: &str = "999999999999";
pub const STACK_ID: &str = "arn:aws:cloudformation:us-east-1:111111111111:stack/x/4a5b6c";
pub const RESPONSE_URL: &str = "https://cloudformation-custom-resource-response-useast1.example/signed";
pub const LOG_STREAM: &str = "2026/10/19/[$LATEST]0123456789abcdef";
pub const CREDENTIALS_EXPIRE_AT_SECS: u64 = 1_792_400_000;

pub fn sample_credentials() -> TemporaryCredentials {
    TemporaryCredentials {
        access_key_id: "ASIAEXAMPLE".to_string(),
        secret_access_key: "secret".to_string(),
        session_token: "token".to_string(),
        expiration: Some(credentials_expiration()),
    }
}

pub fn credentials_expiration() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(CREDENTIALS_EXPIRE_AT_SECS)
}

pub fn sample_config() -> HandlerConfig {
    HandlerConfig {
        partition: "aws".to_string(),
        target_role: "PasswordPolicyExecution".to_string(),
        role_session_name: "assumed-role-session".to_string(),
    }
}

pub fn sample_invocation_context() -> InvocationContext {
    InvocationContext {
        request_id: "lambda-request-1".to_string(),
        log_stream_name: LOG_STREAM.to_string(),
    }
}

pub fn sample_properties_json() -> Value {
    json!({
        "ServiceToken": "arn:aws:sns:us-east-1:111111111111:password-policy",
        "MinimumPasswordLength": "14",
        "RequireSymbols": "true",
        "RequireNumbers": "true",
        "RequireUppercaseCharacters": "true",
        "RequireLowercaseCharacters": "true",
        "AllowUsersToChangePassword": "true",
        "MaxPasswordAge": "90",
        "PasswordReusePrevention": "24",
        "HardExpiry": "false"
    })
}

pub fn sample_event_json(request_type: RequestType) -> Value {
    let mut event = json!({
        "RequestType": request_type.as_str(),
        "ResponseURL": RESPONSE_URL,
        "StackId": STACK_ID,
        "RequestId": "cfn-request-1",
        "LogicalResourceId": "AccountPasswordPolicy",
        "ResourceType": "Custom::PasswordPolicy",
        "ResourceProperties": sample_properties_json(),
    });
    if request_type != RequestType::Create {
        event["PhysicalResourceId"] = json!("existing-physical-id");
    }
    event
}

pub fn sample_event(request_type: RequestType) -> ProvisioningEvent {
    serde_json::from_value(sample_event_json(request_type)).expect("fixture event should parse")
}

/// Wraps an inner event the way SNS delivers it to the function.
pub fn sns_envelope(inner_event: &Value) -> Value {
    json!({
        "Records": [
            {
                "EventSource": "aws:sns",
                "Sns": {
                    "Type": "Notification",
                    "Message": inner_event.to_string()
                }
            }
        ]
    })
}

pub struct FakeIdentityService {
    caller_account: Result<String, String>,
    assume_result: Result<TemporaryCredentials, String>,
    identity_calls: Mutex<usize>,
    assume_calls: Mutex<Vec<(String, String)>>,
}

impl FakeIdentityService {
    pub fn in_account(account_id: &str) -> Self {
        Self {
            caller_account: Ok(account_id.to_string()),
            assume_result: Ok(sample_credentials()),
            identity_calls: Mutex::new(0),
            assume_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_identity(message: &str) -> Self {
        Self {
            caller_account: Err(message.to_string()),
            ..Self::in_account(OTHER_ACCOUNT)
        }
    }

    pub fn with_assume_role_failure(mut self, message: &str) -> Self {
        self.assume_result = Err(message.to_string());
        self
    }

    pub fn identity_calls(&self) -> usize {
        *self.identity_calls.lock().expect("poisoned mutex")
    }

    pub fn assume_role_calls(&self) -> Vec<(String, String)> {
        self.assume_calls.lock().expect("poisoned mutex").clone()
    }
}

impl IdentityService for FakeIdentityService {
    fn caller_account_id(&self) -> Result<String, String> {
        *self.identity_calls.lock().expect("poisoned mutex") += 1;
        self.caller_account.clone()
    }

    fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> Result<TemporaryCredentials, String> {
        self.assume_calls
            .lock()
            .expect("poisoned mutex")
            .push((role_arn.to_string(), session_name.to_string()));
        self.assume_result.clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PolicyCall {
    Update(PasswordPolicySpec),
    Delete,
}

pub struct RecordingPolicyApi {
    update_result: Result<(), String>,
    removal: PolicyRemoval,
    calls: Mutex<Vec<PolicyCall>>,
    sessions: Mutex<Vec<CredentialSession>>,
}

impl RecordingPolicyApi {
    pub fn new() -> Self {
        Self {
            update_result: Ok(()),
            removal: PolicyRemoval::Deleted,
            calls: Mutex::new(Vec::new()),
            sessions: Mutex::new(Vec::new()),
        }
    }

    pub fn with_update_failure(mut self, message: &str) -> Self {
        self.update_result = Err(message.to_string());
        self
    }

    pub fn with_removal(mut self, removal: PolicyRemoval) -> Self {
        self.removal = removal;
        self
    }

    pub fn calls(&self) -> Vec<PolicyCall> {
        self.calls.lock().expect("poisoned mutex").clone()
    }

    pub fn sessions(&self) -> Vec<CredentialSession> {
        self.sessions.lock().expect("poisoned mutex").clone()
    }
}

impl Default for RecordingPolicyApi {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordPolicyApi for RecordingPolicyApi {
    fn update_account_password_policy(&self, policy: &PasswordPolicySpec) -> Result<(), String> {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push(PolicyCall::Update(*policy));
        self.update_result.clone()
    }

    fn delete_account_password_policy(&self) -> PolicyRemoval {
        self.calls
            .lock()
            .expect("poisoned mutex")
            .push(PolicyCall::Delete);
        self.removal.clone()
    }
}

impl PasswordPolicyConnector for RecordingPolicyApi {
    fn connect(&self, session: &CredentialSession) -> Box<dyn PasswordPolicyApi + '_> {
        self.sessions
            .lock()
            .expect("poisoned mutex")
            .push(session.clone());
        Box::new(self)
    }
}

pub struct RecordingResponseSink {
    failure: Option<String>,
    responses: Mutex<Vec<(String, Value)>>,
}

impl RecordingResponseSink {
    pub fn new() -> Self {
        Self {
            failure: None,
            responses: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            responses: Mutex::new(Vec::new()),
        }
    }

    /// Delivered responses as (url, parsed body) pairs.
    pub fn responses(&self) -> Vec<(String, Value)> {
        self.responses.lock().expect("poisoned mutex").clone()
    }
}

impl Default for RecordingResponseSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseSink for RecordingResponseSink {
    fn send_response(&self, response_url: &str, body: &[u8]) -> Result<(), String> {
        if let Some(message) = &self.failure {
            return Err(message.clone());
        }

        let parsed: Value = serde_json::from_slice(body).expect("response body should be JSON");
        self.responses
            .lock()
            .expect("poisoned mutex")
            .push((response_url.to_string(), parsed));
        Ok(())
    }
}
