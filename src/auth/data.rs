//! Data carried by auth states and events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Challenge types a user pool can issue.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChallengeName {
    SmsMfa,
    SoftwareTokenMfa,
    SelectMfaType,
    MfaSetup,
    NewPasswordRequired,
    CustomChallenge,
    DeviceSrpAuth,
    DevicePasswordVerifier,
    PasswordVerifier,
    /// A challenge this crate does not know, kept verbatim.
    Unknown(String),
}

impl ChallengeName {
    /// Name used on the wire, e.g. `MFA_SETUP`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::SmsMfa => "SMS_MFA",
            Self::SoftwareTokenMfa => "SOFTWARE_TOKEN_MFA",
            Self::SelectMfaType => "SELECT_MFA_TYPE",
            Self::MfaSetup => "MFA_SETUP",
            Self::NewPasswordRequired => "NEW_PASSWORD_REQUIRED",
            Self::CustomChallenge => "CUSTOM_CHALLENGE",
            Self::DeviceSrpAuth => "DEVICE_SRP_AUTH",
            Self::DevicePasswordVerifier => "DEVICE_PASSWORD_VERIFIER",
            Self::PasswordVerifier => "PASSWORD_VERIFIER",
            Self::Unknown(name) => name,
        }
    }
}

impl From<&str> for ChallengeName {
    fn from(name: &str) -> Self {
        match name {
            "SMS_MFA" => Self::SmsMfa,
            "SOFTWARE_TOKEN_MFA" => Self::SoftwareTokenMfa,
            "SELECT_MFA_TYPE" => Self::SelectMfaType,
            "MFA_SETUP" => Self::MfaSetup,
            "NEW_PASSWORD_REQUIRED" => Self::NewPasswordRequired,
            "CUSTOM_CHALLENGE" => Self::CustomChallenge,
            "DEVICE_SRP_AUTH" => Self::DeviceSrpAuth,
            "DEVICE_PASSWORD_VERIFIER" => Self::DevicePasswordVerifier,
            "PASSWORD_VERIFIER" => Self::PasswordVerifier,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for ChallengeName {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl From<ChallengeName> for String {
    fn from(name: ChallengeName) -> Self {
        name.as_str().to_string()
    }
}

impl fmt::Display for ChallengeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-issued context needed to continue a multi-step exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthChallenge {
    pub challenge_name: ChallengeName,
    pub username: Option<String>,
    pub session: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl AuthChallenge {
    pub fn new(challenge_name: ChallengeName) -> Self {
        Self {
            challenge_name,
            username: None,
            session: None,
            parameters: BTreeMap::new(),
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_session(mut self, session: impl Into<String>) -> Self {
        self.session = Some(session.into());
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// Result of associating a software token with the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociateSoftwareTokenData {
    pub secret_code: String,
    pub session: Option<String>,
}

/// Tokens returned once authentication completes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticationResult {
    pub access_token: Option<String>,
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignInMethod {
    #[default]
    ApiBased,
    HostedUi,
}

/// A completed sign-in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedInData {
    pub username: String,
    pub signed_in_at: DateTime<Utc>,
    pub sign_in_method: SignInMethod,
    pub tokens: AuthenticationResult,
}
