use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const ROLE_SESSION_NAME: &str = "assumed-role-session";

pub type ResourceProperties = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub enum RequestType {
    Create,
    Update,
    Delete,
}

impl RequestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
        }
    }
}

/// CloudFormation custom resource request as delivered inside the SNS message.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct ProvisioningEvent {
    pub request_type: RequestType,
    pub stack_id: String,
    #[serde(rename = "ResponseURL")]
    pub response_url: String,
    pub request_id: String,
    pub logical_resource_id: String,
    #[serde(default)]
    pub physical_resource_id: Option<String>,
    #[serde(default)]
    pub resource_properties: ResourceProperties,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Success,
    Failed,
}

/// Body PUT to the pre-signed `ResponseURL` once a request has been handled.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct CustomResourceResponse {
    pub status: ResponseStatus,
    pub reason: String,
    pub physical_resource_id: String,
    pub stack_id: String,
    pub request_id: String,
    pub logical_resource_id: String,
    pub no_echo: bool,
    pub data: BTreeMap<String, Value>,
}

impl CustomResourceResponse {
    pub fn for_event(
        event: &ProvisioningEvent,
        status: ResponseStatus,
        physical_resource_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            status,
            reason: reason.into(),
            physical_resource_id: physical_resource_id.into(),
            stack_id: event.stack_id.clone(),
            request_id: event.request_id.clone(),
            logical_resource_id: event.logical_resource_id.clone(),
            no_echo: false,
            data: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing required property: {property}")]
    MissingProperty { property: String },
    #[error(
        "Resource property values not supported. Values must be boolean. ({property}={value})"
    )]
    UnsupportedBoolean { property: String, value: String },
    #[error("invalid integer for {property}: {value} ({reason})")]
    InvalidInteger {
        property: String,
        value: String,
        reason: String,
    },
    #[error("malformed stack id '{stack_id}': {reason}")]
    MalformedStackId { stack_id: String, reason: String },
}
