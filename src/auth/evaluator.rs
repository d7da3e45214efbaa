//! Deciding the next sign-in step from a challenge response.

use super::data::{AuthChallenge, AuthenticationResult, ChallengeName, SignInMethod, SignedInData};
use super::error::AuthError;
use super::events::{AuthEvent, SignInEvent};
use chrono::Utc;
use std::collections::BTreeMap;

/// Challenge parameter listing the MFA types a user may set up.
pub const MFAS_CAN_SETUP: &str = "MFAS_CAN_SETUP";

const SOFTWARE_TOKEN_MFA: &str = "SOFTWARE_TOKEN_MFA";

/// Maps the service's answer to a challenge response onto the next
/// sign-in event.
pub trait ChallengeEvaluator: Send + Sync {
    fn evaluate_next_step(
        &self,
        username: &str,
        challenge_name: Option<ChallengeName>,
        session: Option<String>,
        parameters: BTreeMap<String, String>,
        authentication_result: Option<AuthenticationResult>,
    ) -> AuthEvent;
}

/// Default decision table.
///
/// Tokens finish the sign-in. `MFA_SETUP` starts TOTP setup when software
/// tokens may be set up. Any other challenge is handed back for
/// resolution. A response with neither is an error.
#[derive(Clone, Debug, Default)]
pub struct SignInChallengeEvaluator {
    pub sign_in_method: SignInMethod,
}

impl ChallengeEvaluator for SignInChallengeEvaluator {
    fn evaluate_next_step(
        &self,
        username: &str,
        challenge_name: Option<ChallengeName>,
        session: Option<String>,
        parameters: BTreeMap<String, String>,
        authentication_result: Option<AuthenticationResult>,
    ) -> AuthEvent {
        if let Some(tokens) = authentication_result {
            return SignInEvent::FinalizeSignIn(SignedInData {
                username: username.to_string(),
                signed_in_at: Utc::now(),
                sign_in_method: self.sign_in_method,
                tokens,
            })
            .into();
        }

        let Some(challenge_name) = challenge_name else {
            return SignInEvent::ThrowError(AuthError::invalid_response(
                "RespondToAuthChallenge",
                "response carried neither a challenge nor tokens",
            ))
            .into();
        };

        let username = (!username.is_empty()).then(|| username.to_string());
        let challenge = AuthChallenge {
            challenge_name,
            username,
            session,
            parameters,
        };

        match challenge.challenge_name {
            ChallengeName::MfaSetup if !totp_allowed(&challenge.parameters) => {
                SignInEvent::ThrowError(AuthError::invalid_response(
                    "RespondToAuthChallenge",
                    "MFA setup requested but software tokens cannot be set up",
                ))
                .into()
            }
            ChallengeName::MfaSetup => SignInEvent::InitiateTotpSetup(challenge).into(),
            _ => SignInEvent::ReceivedChallenge(challenge).into(),
        }
    }
}

/// A missing `MFAS_CAN_SETUP` parameter places no restriction; a value
/// that is not a JSON list of MFA types allows nothing.
fn totp_allowed(parameters: &BTreeMap<String, String>) -> bool {
    let Some(types) = parameters.get(MFAS_CAN_SETUP) else {
        return true;
    };
    serde_json::from_str::<Vec<String>>(types)
        .map(|types| types.iter().any(|t| t == SOFTWARE_TOKEN_MFA))
        .unwrap_or(false)
}
