//! Events of the sign-in flow and its software token setup.

use super::data::{AssociateSoftwareTokenData, AuthChallenge, SignedInData};
use super::error::AuthError;
use crate::core::StateMachineEvent;
use serde::{Deserialize, Serialize};

/// Events of the software token (TOTP) setup flow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupSoftwareTokenEvent {
    AssociateSoftwareToken(AuthChallenge),
    WaitForAnswer(AssociateSoftwareTokenData),
    /// Code the user read from their authenticator app.
    VerifyChallengeAnswer(String),
    RespondToAuthChallenge {
        username: Option<String>,
        session: Option<String>,
    },
    ThrowError(AuthError),
}

impl StateMachineEvent for SetupSoftwareTokenEvent {
    fn event_type(&self) -> &str {
        match self {
            Self::AssociateSoftwareToken(_) => "AssociateSoftwareToken",
            Self::WaitForAnswer(_) => "WaitForAnswer",
            Self::VerifyChallengeAnswer(_) => "VerifyChallengeAnswer",
            Self::RespondToAuthChallenge { .. } => "RespondToAuthChallenge",
            Self::ThrowError(_) => "ThrowError",
        }
    }
}

/// Top level sign-in events.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignInEvent {
    ReceivedChallenge(AuthChallenge),
    InitiateTotpSetup(AuthChallenge),
    FinalizeSignIn(SignedInData),
    ThrowError(AuthError),
}

impl StateMachineEvent for SignInEvent {
    fn event_type(&self) -> &str {
        match self {
            Self::ReceivedChallenge(_) => "ReceivedChallenge",
            Self::InitiateTotpSetup(_) => "InitiateTotpSetup",
            Self::FinalizeSignIn(_) => "FinalizeSignIn",
            Self::ThrowError(_) => "ThrowError",
        }
    }
}

/// Every event an auth machine accepts.
///
/// Setup actions may conclude with a sign-in event (the next step decided
/// from the challenge response), so both families share one type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthEvent {
    SetupSoftwareToken(SetupSoftwareTokenEvent),
    SignIn(SignInEvent),
}

impl StateMachineEvent for AuthEvent {
    fn event_type(&self) -> &str {
        match self {
            Self::SetupSoftwareToken(event) => event.event_type(),
            Self::SignIn(event) => event.event_type(),
        }
    }
}

impl From<SetupSoftwareTokenEvent> for AuthEvent {
    fn from(event: SetupSoftwareTokenEvent) -> Self {
        Self::SetupSoftwareToken(event)
    }
}

impl From<SignInEvent> for AuthEvent {
    fn from(event: SignInEvent) -> Self {
        Self::SignIn(event)
    }
}
