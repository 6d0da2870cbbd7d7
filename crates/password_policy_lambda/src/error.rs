use password_policy_core::contract::ValidationError;
use thiserror::Error;

use crate::config::ConfigError;
use crate::handlers::credentials::CredentialError;

/// Every fatal condition a single invocation can end with.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Credentials(#[from] CredentialError),
    #[error("{0}")]
    Api(String),
    #[error("{0}")]
    Envelope(String),
    #[error("failed to deliver custom resource response: {0}")]
    Response(String),
}
