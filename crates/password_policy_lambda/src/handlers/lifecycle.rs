//! Routes a provisioning request to its lifecycle handler and reports the
//! outcome to CloudFormation through the pre-signed response URL.

use password_policy_core::contract::{
    CustomResourceResponse, ProvisioningEvent, RequestType, ResponseStatus,
};
use serde::Serialize;
use serde_json::json;

use crate::adapters::response::ResponseSink;
use crate::error::HandlerError;
use crate::logging::{log_error, log_info};

const COMPONENT: &str = "lifecycle";

/// Invocation details needed for response reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub request_id: String,
    pub log_stream_name: String,
}

/// One function per request type; `dispatch_provisioning_event` picks which.
pub trait LifecycleHandler {
    fn create(&self, event: &mut ProvisioningEvent) -> Result<(), HandlerError>;

    fn update(&self, event: &mut ProvisioningEvent) -> Result<(), HandlerError>;

    fn delete(&self, event: &ProvisioningEvent) -> Result<(), HandlerError>;
}

/// What was reported back to CloudFormation; returned as the function result.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DispatchReport {
    pub status: ResponseStatus,
    pub physical_resource_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

pub fn dispatch_provisioning_event(
    mut event: ProvisioningEvent,
    context: &InvocationContext,
    handler: &impl LifecycleHandler,
    sink: &impl ResponseSink,
) -> Result<DispatchReport, HandlerError> {
    log_info(
        COMPONENT,
        "request_received",
        json!({
            "request_type": event.request_type.as_str(),
            "stack_id": event.stack_id.clone(),
            "request_id": event.request_id.clone(),
            "logical_resource_id": event.logical_resource_id.clone(),
        }),
    );

    let outcome = match event.request_type {
        RequestType::Create => handler.create(&mut event),
        RequestType::Update => handler.update(&mut event),
        RequestType::Delete => handler.delete(&event),
    };

    report_outcome(&event, context, outcome, sink)
}

/// Sends SUCCESS or FAILED for `event`. Handler errors are reported, not
/// returned; only a failed delivery is an error here.
pub fn report_outcome(
    event: &ProvisioningEvent,
    context: &InvocationContext,
    outcome: Result<(), HandlerError>,
    sink: &impl ResponseSink,
) -> Result<DispatchReport, HandlerError> {
    let physical_resource_id = physical_resource_id(event, context);
    let (status, reason) = match outcome {
        Ok(()) => (ResponseStatus::Success, None),
        Err(error) => {
            let reason = error.to_string();
            log_error(
                COMPONENT,
                "request_failed",
                json!({
                    "request_type": event.request_type.as_str(),
                    "stack_id": event.stack_id.clone(),
                    "error": reason.clone(),
                }),
            );
            (ResponseStatus::Failed, Some(reason))
        }
    };

    let response = CustomResourceResponse::for_event(
        event,
        status,
        physical_resource_id.clone(),
        reason.clone().unwrap_or_default(),
    );
    let body = serde_json::to_vec(&response).map_err(|error| {
        HandlerError::Response(format!("failed to serialize response: {error}"))
    })?;
    sink.send_response(&event.response_url, &body)
        .map_err(HandlerError::Response)?;

    log_info(
        COMPONENT,
        "response_sent",
        json!({
            "status": status,
            "physical_resource_id": physical_resource_id.clone(),
            "request_id": event.request_id.clone(),
        }),
    );

    Ok(DispatchReport {
        status,
        physical_resource_id,
        reason,
    })
}

/// Updates and deletes keep the id CloudFormation already knows; creates are
/// named after the function's log stream.
fn physical_resource_id(event: &ProvisioningEvent, context: &InvocationContext) -> String {
    let existing = match event.request_type {
        RequestType::Create => None,
        RequestType::Update | RequestType::Delete => event.physical_resource_id.as_deref(),
    };

    [existing, Some(context.log_stream_name.as_str())]
        .into_iter()
        .flatten()
        .find(|candidate| !candidate.is_empty())
        .unwrap_or(&context.request_id)
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use password_policy_core::contract::ValidationError;

    use super::*;
    use crate::test_helpers::{
        sample_event, sample_invocation_context, RecordingResponseSink, LOG_STREAM, RESPONSE_URL,
    };

    struct ScriptedHandler {
        outcome: Result<(), String>,
        invoked: Mutex<Vec<&'static str>>,
    }

    impl ScriptedHandler {
        fn succeeding() -> Self {
            Self {
                outcome: Ok(()),
                invoked: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                outcome: Err(message.to_string()),
                invoked: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, name: &'static str) -> Result<(), HandlerError> {
            self.invoked.lock().expect("poisoned mutex").push(name);
            self.outcome.clone().map_err(HandlerError::Api)
        }

        fn invoked(&self) -> Vec<&'static str> {
            self.invoked.lock().expect("poisoned mutex").clone()
        }
    }

    impl LifecycleHandler for ScriptedHandler {
        fn create(&self, _event: &mut ProvisioningEvent) -> Result<(), HandlerError> {
            self.record("create")
        }

        fn update(&self, _event: &mut ProvisioningEvent) -> Result<(), HandlerError> {
            self.record("update")
        }

        fn delete(&self, _event: &ProvisioningEvent) -> Result<(), HandlerError> {
            self.record("delete")
        }
    }

    #[test]
    fn routes_each_request_type_to_its_handler() {
        for (request_type, expected) in [
            (RequestType::Create, "create"),
            (RequestType::Update, "update"),
            (RequestType::Delete, "delete"),
        ] {
            let handler = ScriptedHandler::succeeding();
            let sink = RecordingResponseSink::new();

            dispatch_provisioning_event(
                sample_event(request_type),
                &sample_invocation_context(),
                &handler,
                &sink,
            )
            .expect("dispatch should succeed");

            assert_eq!(handler.invoked(), vec![expected]);
        }
    }

    #[test]
    fn create_reports_success_with_log_stream_as_physical_id() {
        let sink = RecordingResponseSink::new();

        let report = dispatch_provisioning_event(
            sample_event(RequestType::Create),
            &sample_invocation_context(),
            &ScriptedHandler::succeeding(),
            &sink,
        )
        .expect("dispatch should succeed");

        assert_eq!(report.status, ResponseStatus::Success);
        assert_eq!(report.physical_resource_id, LOG_STREAM);
        assert_eq!(report.reason, None);

        let responses = sink.responses();
        assert_eq!(responses.len(), 1);
        let (url, body) = &responses[0];
        assert_eq!(url, RESPONSE_URL);
        assert_eq!(body["Status"], json!("SUCCESS"));
        assert_eq!(body["PhysicalResourceId"], json!(LOG_STREAM));
        assert_eq!(body["RequestId"], json!("cfn-request-1"));
        assert_eq!(body["LogicalResourceId"], json!("AccountPasswordPolicy"));
    }

    #[test]
    fn update_keeps_existing_physical_id() {
        let sink = RecordingResponseSink::new();

        let report = dispatch_provisioning_event(
            sample_event(RequestType::Update),
            &sample_invocation_context(),
            &ScriptedHandler::succeeding(),
            &sink,
        )
        .expect("dispatch should succeed");

        assert_eq!(report.physical_resource_id, "existing-physical-id");
    }

    #[test]
    fn falls_back_to_request_id_without_log_stream() {
        let context = InvocationContext {
            request_id: "lambda-request-9".to_string(),
            log_stream_name: String::new(),
        };

        assert_eq!(
            physical_resource_id(&sample_event(RequestType::Create), &context),
            "lambda-request-9"
        );
    }

    #[test]
    fn handler_failure_is_reported_as_failed_response() {
        let sink = RecordingResponseSink::new();

        let report = dispatch_provisioning_event(
            sample_event(RequestType::Delete),
            &sample_invocation_context(),
            &ScriptedHandler::failing("Unexpected error: Throttling"),
            &sink,
        )
        .expect("handler errors are reported, not returned");

        assert_eq!(report.status, ResponseStatus::Failed);
        assert_eq!(
            report.reason.as_deref(),
            Some("Unexpected error: Throttling")
        );
        let (_, body) = &sink.responses()[0];
        assert_eq!(body["Status"], json!("FAILED"));
        assert_eq!(body["Reason"], json!("Unexpected error: Throttling"));
    }

    #[test]
    fn report_outcome_carries_validation_message() {
        let sink = RecordingResponseSink::new();
        let event = sample_event(RequestType::Create);

        let report = report_outcome(
            &event,
            &sample_invocation_context(),
            Err(HandlerError::Validation(ValidationError::MissingProperty {
                property: "HardExpiry".to_string(),
            })),
            &sink,
        )
        .expect("report should be delivered");

        assert_eq!(
            report.reason.as_deref(),
            Some("missing required property: HardExpiry")
        );
    }

    #[test]
    fn delivery_failure_is_returned() {
        let sink = RecordingResponseSink::failing("connection reset");

        let error = dispatch_provisioning_event(
            sample_event(RequestType::Create),
            &sample_invocation_context(),
            &ScriptedHandler::succeeding(),
            &sink,
        )
        .expect_err("delivery failure should surface");

        assert!(matches!(error, HandlerError::Response(_)));
        assert!(error.to_string().contains("connection reset"));
    }
}
