//! Software token (TOTP) MFA setup sub-machine.
//!
//! ```text
//! NotStarted --AssociateSoftwareToken--> AssociateSoftwareToken
//!            --WaitForAnswer----------> WaitingForAnswer
//!            --VerifyChallengeAnswer--> Verifying
//!            --RespondToAuthChallenge-> RespondToAuthChallenge
//! ```
//!
//! `Done` and `Error` are entered by the composing sign-in machine, never by
//! this table.

use super::actions::{CognitoSoftwareTokenActions, SoftwareTokenSetupActions};
use super::data::{AssociateSoftwareTokenData, AuthChallenge};
use super::environment::AuthEnvironment;
use super::error::AuthError;
use super::events::{AuthEvent, SetupSoftwareTokenEvent};
use crate::core::{Resolution, Resolver, State, StateResolution};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupSoftwareTokenState {
    NotStarted,
    AssociateSoftwareToken(AuthChallenge),
    /// Verification needs the associate response's session and the
    /// challenge's username, so both are kept.
    WaitingForAnswer {
        data: AssociateSoftwareTokenData,
        challenge: AuthChallenge,
    },
    Verifying {
        answer: String,
        session: Option<String>,
    },
    RespondToAuthChallenge {
        username: Option<String>,
        session: Option<String>,
    },
    Done,
    Error(AuthError),
}

impl State for SetupSoftwareTokenState {
    fn name(&self) -> &str {
        match self {
            Self::NotStarted => "NotStarted",
            Self::AssociateSoftwareToken(_) => "AssociateSoftwareToken",
            Self::WaitingForAnswer { .. } => "WaitingForAnswer",
            Self::Verifying { .. } => "Verifying",
            Self::RespondToAuthChallenge { .. } => "RespondToAuthChallenge",
            Self::Done => "Done",
            Self::Error(_) => "Error",
        }
    }

    fn is_final(&self) -> bool {
        matches!(self, Self::Done)
    }

    fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Transition table of the setup flow.
#[derive(Clone)]
pub struct SetupSoftwareTokenResolver {
    actions: Arc<dyn SoftwareTokenSetupActions>,
}

impl SetupSoftwareTokenResolver {
    pub fn new(actions: Arc<dyn SoftwareTokenSetupActions>) -> Self {
        Self { actions }
    }

    /// Resolve a setup event. Shared with the sign-in resolver, which
    /// embeds this machine's state.
    pub fn resolve_setup(
        &self,
        old_state: &SetupSoftwareTokenState,
        event: &SetupSoftwareTokenEvent,
    ) -> Resolution<Self> {
        use SetupSoftwareTokenEvent as Event;
        use SetupSoftwareTokenState as S;

        match (old_state, event) {
            (S::NotStarted, Event::AssociateSoftwareToken(challenge)) => {
                StateResolution::with_action(
                    S::AssociateSoftwareToken(challenge.clone()),
                    self.actions.associate_software_token(challenge.clone()),
                )
            }
            (S::AssociateSoftwareToken(challenge), Event::WaitForAnswer(data)) => {
                StateResolution::new(S::WaitingForAnswer {
                    data: data.clone(),
                    challenge: challenge.clone(),
                })
            }
            (S::WaitingForAnswer { data, challenge }, Event::VerifyChallengeAnswer(answer)) => {
                StateResolution::with_action(
                    S::Verifying {
                        answer: answer.clone(),
                        session: data.session.clone(),
                    },
                    self.actions.verify_software_token_setup(
                        answer.clone(),
                        challenge.username.clone(),
                        data.session.clone(),
                    ),
                )
            }
            // The state keeps the session it was verified with; the
            // response goes out on the session verification returned.
            (
                S::Verifying { session, .. },
                Event::RespondToAuthChallenge {
                    username,
                    session: next_session,
                },
            ) => StateResolution::with_action(
                S::RespondToAuthChallenge {
                    username: username.clone(),
                    session: session.clone(),
                },
                self.actions
                    .respond_to_auth_challenge(username.clone(), next_session.clone()),
            ),
            _ => StateResolution::new(old_state.clone()),
        }
    }
}

impl Default for SetupSoftwareTokenResolver {
    fn default() -> Self {
        Self::new(Arc::new(CognitoSoftwareTokenActions))
    }
}

impl fmt::Debug for SetupSoftwareTokenResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetupSoftwareTokenResolver").finish_non_exhaustive()
    }
}

impl Resolver for SetupSoftwareTokenResolver {
    type State = SetupSoftwareTokenState;
    type Event = AuthEvent;
    type Environment = AuthEnvironment;

    fn default_state(&self) -> SetupSoftwareTokenState {
        SetupSoftwareTokenState::NotStarted
    }

    fn resolve(&self, old_state: &SetupSoftwareTokenState, event: &AuthEvent) -> Resolution<Self> {
        match event {
            AuthEvent::SetupSoftwareToken(event) => self.resolve_setup(old_state, event),
            AuthEvent::SignIn(_) => StateResolution::new(old_state.clone()),
        }
    }
}
