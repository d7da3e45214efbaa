//! Request/response facade over the sign-in machine.

use super::data::AuthChallenge;
use super::environment::AuthEnvironment;
use super::error::SessionError;
use super::events::{AuthEvent, SetupSoftwareTokenEvent, SignInEvent};
use super::sign_in::{SignInResolver, SignInState};
use super::software_token::SetupSoftwareTokenState;
use super::step::AuthSignInStep;
use crate::builder::{BuildError, StateMachineBuilder};
use crate::core::State;
use crate::effects::StateMachine;
use tracing::debug;

/// One user's sign-in.
///
/// Each call sends an event and waits until the machine settles on the next
/// application-facing step or fails.
#[derive(Clone, Debug)]
pub struct AuthSession {
    machine: StateMachine<SignInResolver>,
    issuer: String,
}

impl AuthSession {
    /// Start a sign-in machine using the Cognito-backed actions.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(environment: AuthEnvironment) -> Result<Self, BuildError> {
        let issuer = environment.configuration.issuer().to_string();
        let machine = StateMachineBuilder::new()
            .name("SignIn")
            .resolver(SignInResolver::default())
            .environment(environment)
            .build()?;
        Ok(Self::from_machine(machine, issuer))
    }

    /// Wrap an already running machine, e.g. one resumed from a checkpoint.
    pub fn from_machine(machine: StateMachine<SignInResolver>, issuer: impl Into<String>) -> Self {
        Self {
            machine,
            issuer: issuer.into(),
        }
    }

    pub fn machine(&self) -> &StateMachine<SignInResolver> {
        &self.machine
    }

    /// Step for the latest committed state.
    pub fn current_step(&self) -> Result<Option<AuthSignInStep>, SessionError> {
        Ok(AuthSignInStep::from_state(
            &self.machine.current_state(),
            &self.issuer,
        )?)
    }

    /// Begin TOTP setup for an `MFA_SETUP` challenge. Resolves with the
    /// secret and setup URI to show the user.
    pub async fn setup_totp(&self, challenge: AuthChallenge) -> Result<AuthSignInStep, SessionError> {
        let state = self.machine.get_current_state().await?;
        let can_start = matches!(
            state,
            SignInState::NotStarted
                | SignInState::ResolvingChallenge(_)
                | SignInState::Error(_)
                | SignInState::ResolvingTotpSetup(SetupSoftwareTokenState::Error(_))
        );
        if !can_start {
            return Err(invalid_state("set up TOTP", &state));
        }

        debug!(machine = self.machine.name(), "starting TOTP setup");
        self.advance(SignInEvent::InitiateTotpSetup(challenge).into())
            .await
    }

    /// Submit the code from the user's authenticator app.
    pub async fn confirm_totp(&self, code: impl Into<String>) -> Result<AuthSignInStep, SessionError> {
        let state = self.machine.get_current_state().await?;
        if !matches!(
            state,
            SignInState::ResolvingTotpSetup(SetupSoftwareTokenState::WaitingForAnswer { .. })
        ) {
            return Err(invalid_state("confirm a TOTP code", &state));
        }

        debug!(machine = self.machine.name(), "verifying TOTP code");
        self.advance(SetupSoftwareTokenEvent::VerifyChallengeAnswer(code.into()).into())
            .await
    }

    async fn advance(&self, event: AuthEvent) -> Result<AuthSignInStep, SessionError> {
        let issuer = self.issuer.as_str();
        let settled = self
            .machine
            .send_and_wait(event, |state| {
                !matches!(AuthSignInStep::from_state(state, issuer), Ok(None))
            })
            .await?;

        match AuthSignInStep::from_state(&settled, issuer)? {
            Some(step) => Ok(step),
            None => Err(invalid_state("advance", &settled)),
        }
    }
}

fn invalid_state(operation: &'static str, state: &SignInState) -> SessionError {
    SessionError::InvalidState {
        operation,
        state: state.name().to_string(),
    }
}
