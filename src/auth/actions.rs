//! Side effects of the software token setup flow.
//!
//! Every action ends by sending exactly one event. Service failures and
//! unusable responses become `ThrowError` events, so these actions never
//! return an `Err`.

use super::data::{AssociateSoftwareTokenData, AuthChallenge, ChallengeName};
use super::environment::AuthEnvironment;
use super::error::AuthError;
use super::events::{AuthEvent, SetupSoftwareTokenEvent};
use super::service::{
    AssociateSoftwareTokenRequest, AssociateSoftwareTokenResponse, RespondToAuthChallengeRequest,
    VerifySoftwareTokenRequest, VerifySoftwareTokenResponse, VerifySoftwareTokenStatus,
};
use crate::core::StateMachineEvent;
use crate::effects::{Action, ActionContext};
use std::collections::BTreeMap;
use tracing::{debug, trace};

pub type AuthAction = Action<AuthEvent, AuthEnvironment>;
pub type AuthContext = ActionContext<AuthEvent, AuthEnvironment>;

const START_SETUP: &str = "StartSoftwareTokenSetup";
const ASSOCIATE: &str = "AssociateSoftwareToken";
const VERIFY: &str = "VerifySoftwareTokenSetup";
const RESPOND: &str = "RespondToAuthChallenge";

/// Factory for the actions the setup resolver schedules.
///
/// Resolvers hold one of these instead of performing effects, which keeps
/// them pure and lets tests substitute recording actions.
pub trait SoftwareTokenSetupActions: Send + Sync {
    fn start_software_token_setup(&self, challenge: AuthChallenge) -> AuthAction;

    fn associate_software_token(&self, challenge: AuthChallenge) -> AuthAction;

    fn verify_software_token_setup(
        &self,
        user_code: String,
        username: Option<String>,
        session: Option<String>,
    ) -> AuthAction;

    fn respond_to_auth_challenge(
        &self,
        username: Option<String>,
        session: Option<String>,
    ) -> AuthAction;
}

/// Actions backed by the environment's identity provider.
#[derive(Clone, Copy, Debug, Default)]
pub struct CognitoSoftwareTokenActions;

impl SoftwareTokenSetupActions for CognitoSoftwareTokenActions {
    fn start_software_token_setup(&self, challenge: AuthChallenge) -> AuthAction {
        Action::new(START_SETUP, move |ctx: AuthContext| async move {
            trace!(action = %ctx.id, "starting execution");
            dispatch(&ctx, SetupSoftwareTokenEvent::AssociateSoftwareToken(challenge).into());
        })
    }

    fn associate_software_token(&self, challenge: AuthChallenge) -> AuthAction {
        Action::new(ASSOCIATE, move |ctx: AuthContext| async move {
            trace!(action = %ctx.id, "starting execution");
            let event = associate(&ctx.environment, challenge.session).await;
            dispatch(&ctx, event);
        })
    }

    fn verify_software_token_setup(
        &self,
        user_code: String,
        username: Option<String>,
        session: Option<String>,
    ) -> AuthAction {
        Action::new(VERIFY, move |ctx: AuthContext| async move {
            trace!(action = %ctx.id, "starting execution");
            let event = verify(&ctx.environment, user_code, username, session).await;
            dispatch(&ctx, event);
        })
    }

    fn respond_to_auth_challenge(
        &self,
        username: Option<String>,
        session: Option<String>,
    ) -> AuthAction {
        Action::new(RESPOND, move |ctx: AuthContext| async move {
            trace!(action = %ctx.id, "starting execution");
            let event = respond(&ctx.environment, username, session).await;
            dispatch(&ctx, event);
        })
    }
}

fn dispatch(ctx: &AuthContext, event: AuthEvent) {
    debug!(action = %ctx.id, event = event.event_type(), "sending event");
    ctx.send(event);
}

fn throw(error: AuthError) -> AuthEvent {
    SetupSoftwareTokenEvent::ThrowError(error).into()
}

async fn associate(env: &AuthEnvironment, session: Option<String>) -> AuthEvent {
    let request = AssociateSoftwareTokenRequest { session };
    match env.service.associate_software_token(request).await {
        Ok(AssociateSoftwareTokenResponse {
            secret_code: Some(secret_code),
            session,
        }) => SetupSoftwareTokenEvent::WaitForAnswer(AssociateSoftwareTokenData {
            secret_code,
            session,
        })
        .into(),
        Ok(_) => throw(AuthError::invalid_response(
            ASSOCIATE,
            "response carried no secret code",
        )),
        Err(error) => throw(error.into()),
    }
}

async fn verify(
    env: &AuthEnvironment,
    user_code: String,
    username: Option<String>,
    session: Option<String>,
) -> AuthEvent {
    let request = VerifySoftwareTokenRequest { user_code, session };
    match env.service.verify_software_token(request).await {
        Ok(VerifySoftwareTokenResponse {
            status: Some(VerifySoftwareTokenStatus::Success),
            session,
        }) => SetupSoftwareTokenEvent::RespondToAuthChallenge { username, session }.into(),
        Ok(VerifySoftwareTokenResponse {
            status: Some(status),
            ..
        }) => throw(AuthError::VerificationFailed(format!(
            "service reported status {}",
            String::from(status)
        ))),
        Ok(_) => throw(AuthError::VerificationFailed(
            "response carried no status".to_string(),
        )),
        Err(error) => throw(error.into()),
    }
}

async fn respond(
    env: &AuthEnvironment,
    username: Option<String>,
    session: Option<String>,
) -> AuthEvent {
    let Some(client_id) = env.configuration.app_client_id() else {
        return throw(AuthError::Configuration(
            "no user pool app client is configured".to_string(),
        ));
    };

    let username = username.unwrap_or_default();
    let mut challenge_responses = BTreeMap::new();
    if !username.is_empty() {
        challenge_responses.insert("USERNAME".to_string(), username.clone());
    }

    let request = RespondToAuthChallengeRequest {
        client_id: client_id.to_string(),
        challenge_name: ChallengeName::MfaSetup,
        session,
        challenge_responses,
    };
    match env.service.respond_to_auth_challenge(request).await {
        Ok(response) => env.evaluator.evaluate_next_step(
            &username,
            response.challenge_name,
            response.session,
            response.challenge_parameters,
            response.authentication_result,
        ),
        Err(error) => throw(error.into()),
    }
}
