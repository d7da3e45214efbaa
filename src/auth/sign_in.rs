//! Sign-in machine composing the software token setup flow.

use super::actions::{CognitoSoftwareTokenActions, SoftwareTokenSetupActions};
use super::data::{AuthChallenge, SignedInData};
use super::environment::AuthEnvironment;
use super::error::AuthError;
use super::events::{AuthEvent, SetupSoftwareTokenEvent, SignInEvent};
use super::software_token::{SetupSoftwareTokenResolver, SetupSoftwareTokenState};
use crate::core::{Resolution, Resolver, State, StateResolution};
use crate::effects::ActionFailure;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignInState {
    NotStarted,
    ResolvingChallenge(AuthChallenge),
    ResolvingTotpSetup(SetupSoftwareTokenState),
    SignedIn(SignedInData),
    Error(AuthError),
}

impl State for SignInState {
    fn name(&self) -> &str {
        match self {
            Self::NotStarted => "NotStarted",
            Self::ResolvingChallenge(_) => "ResolvingChallenge",
            Self::ResolvingTotpSetup(_) => "ResolvingTotpSetup",
            Self::SignedIn(_) => "SignedIn",
            Self::Error(_) => "Error",
        }
    }

    fn is_final(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }

    fn is_error(&self) -> bool {
        matches!(
            self,
            Self::Error(_) | Self::ResolvingTotpSetup(SetupSoftwareTokenState::Error(_))
        )
    }
}

/// Transition table of the sign-in flow.
///
/// Setup events are delegated to [`SetupSoftwareTokenResolver`] while setup
/// is in progress, except `ThrowError`, which this machine turns into the
/// setup's `Error` state.
#[derive(Clone)]
pub struct SignInResolver {
    actions: Arc<dyn SoftwareTokenSetupActions>,
    setup: SetupSoftwareTokenResolver,
}

impl SignInResolver {
    pub fn new(actions: Arc<dyn SoftwareTokenSetupActions>) -> Self {
        Self {
            setup: SetupSoftwareTokenResolver::new(Arc::clone(&actions)),
            actions,
        }
    }

    fn resolve_sign_in(&self, old_state: &SignInState, event: &SignInEvent) -> Resolution<Self> {
        use SignInState as S;

        match (old_state, event) {
            (
                S::NotStarted | S::ResolvingChallenge(_) | S::Error(_),
                SignInEvent::ReceivedChallenge(challenge),
            ) => StateResolution::new(S::ResolvingChallenge(challenge.clone())),
            // The service may answer a setup response with MFA_SETUP again;
            // setup then starts over.
            (
                S::NotStarted
                | S::ResolvingChallenge(_)
                | S::Error(_)
                | S::ResolvingTotpSetup(
                    SetupSoftwareTokenState::Error(_)
                    | SetupSoftwareTokenState::RespondToAuthChallenge { .. },
                ),
                SignInEvent::InitiateTotpSetup(challenge),
            ) => StateResolution::with_action(
                S::ResolvingTotpSetup(SetupSoftwareTokenState::NotStarted),
                self.actions.start_software_token_setup(challenge.clone()),
            ),
            (
                S::ResolvingTotpSetup(SetupSoftwareTokenState::RespondToAuthChallenge { .. }),
                SignInEvent::FinalizeSignIn(data),
            ) => StateResolution::new(S::SignedIn(data.clone())),
            (
                S::ResolvingTotpSetup(SetupSoftwareTokenState::RespondToAuthChallenge { .. }),
                SignInEvent::ReceivedChallenge(challenge),
            ) => StateResolution::new(S::ResolvingChallenge(challenge.clone())),
            (state, SignInEvent::ThrowError(error)) if !state.is_final() => {
                StateResolution::new(S::Error(error.clone()))
            }
            _ => StateResolution::new(old_state.clone()),
        }
    }

    fn resolve_setup(
        &self,
        old_state: &SignInState,
        event: &SetupSoftwareTokenEvent,
    ) -> Resolution<Self> {
        let SignInState::ResolvingTotpSetup(setup_state) = old_state else {
            return StateResolution::new(old_state.clone());
        };

        match event {
            SetupSoftwareTokenEvent::ThrowError(error) => StateResolution::new(
                SignInState::ResolvingTotpSetup(SetupSoftwareTokenState::Error(error.clone())),
            ),
            event => self
                .setup
                .resolve_setup(setup_state, event)
                .map_state(SignInState::ResolvingTotpSetup),
        }
    }
}

impl Default for SignInResolver {
    fn default() -> Self {
        Self::new(Arc::new(CognitoSoftwareTokenActions))
    }
}

impl fmt::Debug for SignInResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInResolver").finish_non_exhaustive()
    }
}

impl Resolver for SignInResolver {
    type State = SignInState;
    type Event = AuthEvent;
    type Environment = AuthEnvironment;

    fn default_state(&self) -> SignInState {
        SignInState::NotStarted
    }

    fn resolve(&self, old_state: &SignInState, event: &AuthEvent) -> Resolution<Self> {
        match event {
            AuthEvent::SignIn(event) => self.resolve_sign_in(old_state, event),
            AuthEvent::SetupSoftwareToken(event) => self.resolve_setup(old_state, event),
        }
    }

    /// A failed action becomes the error of whichever flow was waiting on it.
    fn on_action_failure(&self, state: &SignInState, failure: &ActionFailure) -> Option<AuthEvent> {
        let error = AuthError::ActionFailed {
            action: failure.action.clone(),
            message: failure.error.to_string(),
        };
        match state {
            SignInState::ResolvingTotpSetup(setup) if !setup.is_error() => {
                Some(SetupSoftwareTokenEvent::ThrowError(error).into())
            }
            state if state.is_final() || state.is_error() => None,
            _ => Some(SignInEvent::ThrowError(error).into()),
        }
    }
}
