//! Application-facing view of where a sign-in stands.

use super::data::{AuthChallenge, ChallengeName};
use super::error::AuthError;
use super::sign_in::SignInState;
use super::software_token::SetupSoftwareTokenState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use url::Url;

/// What an authenticator app needs to register the software token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotpSetupDetails {
    pub secret_code: String,
    /// `otpauth://totp/<issuer>:<username>?secret=<code>&issuer=<issuer>`
    pub setup_uri: Url,
}

impl TotpSetupDetails {
    pub fn new(secret_code: &str, issuer: &str, username: Option<&str>) -> Result<Self, AuthError> {
        Ok(Self {
            secret_code: secret_code.to_string(),
            setup_uri: setup_uri(secret_code, issuer, username)?,
        })
    }
}

/// Next thing the application has to do to finish signing in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthSignInStep {
    ContinueSignInWithTotpSetup(TotpSetupDetails),
    ConfirmSignInWithTotpCode,
    ConfirmSignInWithSmsMfaCode,
    ContinueSignInWithMfaSelection,
    ConfirmSignInWithNewPassword,
    ConfirmSignInWithCustomChallenge(BTreeMap<String, String>),
    /// A challenge with no application-facing step, e.g. device challenges
    /// answered internally.
    ResolveChallenge(ChallengeName),
    Done,
}

impl AuthSignInStep {
    /// Step for `state`. `Ok(None)` while the machine is still working
    /// towards the next step.
    pub fn from_state(state: &SignInState, issuer: &str) -> Result<Option<Self>, AuthError> {
        match state {
            SignInState::NotStarted => Ok(None),
            SignInState::ResolvingChallenge(challenge) => Ok(Some(Self::for_challenge(challenge))),
            SignInState::ResolvingTotpSetup(SetupSoftwareTokenState::WaitingForAnswer {
                data,
                challenge,
            }) => {
                let details =
                    TotpSetupDetails::new(&data.secret_code, issuer, challenge.username.as_deref())?;
                Ok(Some(Self::ContinueSignInWithTotpSetup(details)))
            }
            SignInState::ResolvingTotpSetup(SetupSoftwareTokenState::Error(error))
            | SignInState::Error(error) => Err(error.clone()),
            SignInState::ResolvingTotpSetup(_) => Ok(None),
            SignInState::SignedIn(_) => Ok(Some(Self::Done)),
        }
    }

    fn for_challenge(challenge: &AuthChallenge) -> Self {
        match &challenge.challenge_name {
            ChallengeName::SoftwareTokenMfa => Self::ConfirmSignInWithTotpCode,
            ChallengeName::SmsMfa => Self::ConfirmSignInWithSmsMfaCode,
            ChallengeName::SelectMfaType => Self::ContinueSignInWithMfaSelection,
            ChallengeName::NewPasswordRequired => Self::ConfirmSignInWithNewPassword,
            ChallengeName::CustomChallenge => {
                Self::ConfirmSignInWithCustomChallenge(challenge.parameters.clone())
            }
            other => Self::ResolveChallenge(other.clone()),
        }
    }
}

fn setup_uri(secret_code: &str, issuer: &str, username: Option<&str>) -> Result<Url, AuthError> {
    let label = match username.filter(|name| !name.is_empty()) {
        Some(username) => format!("{issuer}:{username}"),
        None => issuer.to_string(),
    };

    let mut uri = Url::parse("otpauth://totp/")
        .map_err(|e| AuthError::Configuration(format!("invalid setup URI: {e}")))?;
    uri.path_segments_mut()
        .map_err(|_| AuthError::Configuration("setup URI cannot hold a label".to_string()))?
        .pop_if_empty()
        .push(&label);
    uri.query_pairs_mut()
        .append_pair("secret", secret_code)
        .append_pair("issuer", issuer);
    Ok(uri)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::data::AssociateSoftwareTokenData;

    fn waiting(username: Option<&str>) -> SignInState {
        let mut challenge = AuthChallenge::new(ChallengeName::MfaSetup).with_session("sess1");
        challenge.username = username.map(str::to_string);
        SignInState::ResolvingTotpSetup(SetupSoftwareTokenState::WaitingForAnswer {
            data: AssociateSoftwareTokenData {
                secret_code: "ABC123".to_string(),
                session: Some("sess2".to_string()),
            },
            challenge,
        })
    }

    #[test]
    fn waiting_for_answer_exposes_setup_uri() {
        let step = AuthSignInStep::from_state(&waiting(Some("alice")), "Example")
            .unwrap()
            .unwrap();

        match step {
            AuthSignInStep::ContinueSignInWithTotpSetup(details) => {
                assert_eq!(details.secret_code, "ABC123");
                assert_eq!(
                    details.setup_uri.as_str(),
                    "otpauth://totp/Example:alice?secret=ABC123&issuer=Example"
                );
            }
            other => panic!("Expected TOTP setup, got {other:?}"),
        }
    }

    #[test]
    fn setup_uri_encodes_label_and_issuer() {
        let uri = setup_uri("ABC123", "My App", Some("a/b")).unwrap();

        assert_eq!(
            uri.as_str(),
            "otpauth://totp/My%20App:a%2Fb?secret=ABC123&issuer=My+App"
        );
    }

    #[test]
    fn missing_username_uses_issuer_only() {
        let uri = setup_uri("ABC123", "Example", None).unwrap();
        assert_eq!(uri.path(), "/Example");
    }

    #[test]
    fn in_flight_states_have_no_step() {
        let verifying = SignInState::ResolvingTotpSetup(SetupSoftwareTokenState::Verifying {
            answer: "123456".to_string(),
            session: None,
        });

        assert_eq!(AuthSignInStep::from_state(&verifying, "x"), Ok(None));
        assert_eq!(AuthSignInStep::from_state(&SignInState::NotStarted, "x"), Ok(None));
    }

    #[test]
    fn errors_are_surfaced() {
        let error = AuthError::VerificationFailed("nope".to_string());
        let state = SignInState::ResolvingTotpSetup(SetupSoftwareTokenState::Error(error.clone()));

        assert_eq!(AuthSignInStep::from_state(&state, "x"), Err(error));
    }

    #[test]
    fn challenges_map_to_steps() {
        let state = SignInState::ResolvingChallenge(AuthChallenge::new(
            ChallengeName::SoftwareTokenMfa,
        ));

        assert_eq!(
            AuthSignInStep::from_state(&state, "x"),
            Ok(Some(AuthSignInStep::ConfirmSignInWithTotpCode))
        );
    }
}
