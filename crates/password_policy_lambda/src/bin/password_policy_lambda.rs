use std::time::SystemTime;

use aws_config::SdkConfig;
use aws_sdk_iam::config::{Credentials, Region};
use aws_sdk_iam::error::DisplayErrorContext;
use lambda_runtime::{service_fn, Error, LambdaEvent};
use password_policy_core::contract::ROLE_SESSION_NAME;
use password_policy_core::properties::PasswordPolicySpec;
use password_policy_lambda::adapters::identity::{IdentityService, TemporaryCredentials};
use password_policy_lambda::adapters::password_policy::{
    PasswordPolicyApi, PasswordPolicyConnector, PolicyRemoval,
};
use password_policy_lambda::adapters::response::ResponseSink;
use password_policy_lambda::config::HandlerConfig;
use password_policy_lambda::handlers::credentials::CredentialSession;
use password_policy_lambda::handlers::entry::handle_notification_event;
use password_policy_lambda::handlers::lifecycle::{DispatchReport, InvocationContext};
use serde_json::Value;

struct StsIdentityService {
    sts_client: aws_sdk_sts::Client,
}

impl IdentityService for StsIdentityService {
    fn caller_account_id(&self) -> Result<String, String> {
        let client = self.sts_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client.get_caller_identity().send().await.map_err(|error| {
                    format!("STS GetCallerIdentity failed: {}", DisplayErrorContext(&error))
                })?;
                output
                    .account()
                    .map(str::to_string)
                    .ok_or_else(|| "STS GetCallerIdentity response missing Account".to_string())
            })
        })
    }

    fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> Result<TemporaryCredentials, String> {
        let client = self.sts_client.clone();
        let role_arn = role_arn.to_string();
        let session_name = session_name.to_string();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                let output = client
                    .assume_role()
                    .role_arn(role_arn)
                    .role_session_name(session_name)
                    .send()
                    .await
                    .map_err(|error| {
                        format!("STS AssumeRole failed: {}", DisplayErrorContext(&error))
                    })?;
                let credentials = output
                    .credentials()
                    .ok_or_else(|| "STS AssumeRole response missing Credentials".to_string())?;
                Ok::<_, String>(TemporaryCredentials {
                    access_key_id: credentials.access_key_id().to_string(),
                    secret_access_key: credentials.secret_access_key().to_string(),
                    session_token: credentials.session_token().to_string(),
                    expiration: SystemTime::try_from(*credentials.expiration()).ok(),
                })
            })
        })
    }
}

struct IamPasswordPolicyApi {
    iam_client: aws_sdk_iam::Client,
}

impl PasswordPolicyApi for IamPasswordPolicyApi {
    fn update_account_password_policy(&self, policy: &PasswordPolicySpec) -> Result<(), String> {
        let client = self.iam_client.clone();
        let policy = *policy;

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .update_account_password_policy()
                    .minimum_password_length(policy.minimum_password_length)
                    .require_symbols(policy.require_symbols)
                    .require_numbers(policy.require_numbers)
                    .require_uppercase_characters(policy.require_uppercase_characters)
                    .require_lowercase_characters(policy.require_lowercase_characters)
                    .allow_users_to_change_password(policy.allow_users_to_change_password)
                    .max_password_age(policy.max_password_age)
                    .password_reuse_prevention(policy.password_reuse_prevention)
                    .hard_expiry(policy.hard_expiry)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|error| DisplayErrorContext(&error).to_string())
            })
        })
    }

    fn delete_account_password_policy(&self) -> PolicyRemoval {
        let client = self.iam_client.clone();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                match client.delete_account_password_policy().send().await {
                    Ok(_) => PolicyRemoval::Deleted,
                    Err(error)
                        if error
                            .as_service_error()
                            .is_some_and(|service| service.is_no_such_entity_exception()) =>
                    {
                        PolicyRemoval::AlreadyAbsent
                    }
                    Err(error) => PolicyRemoval::Failed(DisplayErrorContext(&error).to_string()),
                }
            })
        })
    }
}

struct IamConnector {
    sdk_config: SdkConfig,
}

impl PasswordPolicyConnector for IamConnector {
    fn connect(&self, session: &CredentialSession) -> Box<dyn PasswordPolicyApi + '_> {
        let mut builder = aws_sdk_iam::config::Builder::from(&self.sdk_config)
            .region(Region::new(session.region().to_string()));
        if let CredentialSession::Assumed { credentials, .. } = session {
            builder = builder.credentials_provider(Credentials::new(
                credentials.access_key_id.clone(),
                credentials.secret_access_key.clone(),
                Some(credentials.session_token.clone()),
                credentials.expiration,
                ROLE_SESSION_NAME,
            ));
        }

        Box::new(IamPasswordPolicyApi {
            iam_client: aws_sdk_iam::Client::from_conf(builder.build()),
        })
    }
}

struct HttpResponseSink {
    http_client: reqwest::Client,
}

impl ResponseSink for HttpResponseSink {
    fn send_response(&self, response_url: &str, body: &[u8]) -> Result<(), String> {
        let client = self.http_client.clone();
        let url = response_url.to_string();
        let body_bytes = body.to_vec();

        tokio::task::block_in_place(|| {
            tokio::runtime::Handle::current().block_on(async move {
                client
                    .put(url)
                    .header(reqwest::header::CONTENT_TYPE, "")
                    .body(body_bytes)
                    .send()
                    .await
                    .and_then(reqwest::Response::error_for_status)
                    .map(|_| ())
                    .map_err(|error| format!("failed to PUT custom resource response: {error}"))
            })
        })
    }
}

async fn handle_request(event: LambdaEvent<Value>) -> Result<DispatchReport, Error> {
    let context = InvocationContext {
        request_id: event.context.request_id.clone(),
        log_stream_name: event.context.env_config.log_stream.clone(),
    };

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let identity = StsIdentityService {
        sts_client: aws_sdk_sts::Client::new(&aws_config),
    };
    let connector = IamConnector {
        sdk_config: aws_config,
    };
    let sink = HttpResponseSink {
        http_client: reqwest::Client::new(),
    };

    handle_notification_event(
        &event.payload,
        &context,
        HandlerConfig::from_env(),
        &identity,
        &connector,
        &sink,
    )
    .map_err(Error::from)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    lambda_runtime::run(service_fn(handle_request)).await
}
