//! Identity provider operations the auth actions depend on.
//!
//! Transport is not this crate's concern: implement
//! [`CognitoIdentityProvider`] over whatever client the application uses.
//! Response fields are optional because the service may omit them; actions
//! treat a missing required field as a failed call.

use super::data::{AuthenticationResult, ChallengeName};
use super::error::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociateSoftwareTokenRequest {
    pub session: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociateSoftwareTokenResponse {
    pub secret_code: Option<String>,
    pub session: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifySoftwareTokenRequest {
    pub user_code: String,
    pub session: Option<String>,
}

/// Status reported by software token verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VerifySoftwareTokenStatus {
    Success,
    Error,
    Unknown(String),
}

impl From<String> for VerifySoftwareTokenStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "SUCCESS" => Self::Success,
            "ERROR" => Self::Error,
            _ => Self::Unknown(status),
        }
    }
}

impl From<VerifySoftwareTokenStatus> for String {
    fn from(status: VerifySoftwareTokenStatus) -> Self {
        match status {
            VerifySoftwareTokenStatus::Success => "SUCCESS".to_string(),
            VerifySoftwareTokenStatus::Error => "ERROR".to_string(),
            VerifySoftwareTokenStatus::Unknown(other) => other,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifySoftwareTokenResponse {
    pub status: Option<VerifySoftwareTokenStatus>,
    pub session: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondToAuthChallengeRequest {
    pub client_id: String,
    pub challenge_name: ChallengeName,
    pub session: Option<String>,
    pub challenge_responses: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespondToAuthChallengeResponse {
    pub challenge_name: Option<ChallengeName>,
    pub session: Option<String>,
    #[serde(default)]
    pub challenge_parameters: BTreeMap<String, String>,
    pub authentication_result: Option<AuthenticationResult>,
}

/// User pool operations used by the software token setup flow.
#[async_trait]
pub trait CognitoIdentityProvider: Send + Sync {
    async fn associate_software_token(
        &self,
        request: AssociateSoftwareTokenRequest,
    ) -> Result<AssociateSoftwareTokenResponse, ServiceError>;

    async fn verify_software_token(
        &self,
        request: VerifySoftwareTokenRequest,
    ) -> Result<VerifySoftwareTokenResponse, ServiceError>;

    async fn respond_to_auth_challenge(
        &self,
        request: RespondToAuthChallengeRequest,
    ) -> Result<RespondToAuthChallengeResponse, ServiceError>;
}
