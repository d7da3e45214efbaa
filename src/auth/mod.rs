//! Authentication flows built on the engine.
//!
//! [`SignInResolver`] drives a sign-in and embeds the software token (TOTP)
//! setup flow of [`SetupSoftwareTokenResolver`] in its own state. Actions
//! reach the identity provider through the [`CognitoIdentityProvider`]
//! trait held by the [`AuthEnvironment`]; the crate ships no transport.
//! [`AuthSession`] wraps the machine in request/response calls.

mod actions;
mod data;
mod environment;
mod error;
mod evaluator;
mod events;
mod service;
mod session;
mod sign_in;
mod software_token;
mod step;

pub use actions::{
    AuthAction, AuthContext, CognitoSoftwareTokenActions, SoftwareTokenSetupActions,
};
pub use data::{
    AssociateSoftwareTokenData, AuthChallenge, AuthenticationResult, ChallengeName, SignInMethod,
    SignedInData,
};
pub use environment::AuthEnvironment;
pub use error::{AuthError, ServiceError, SessionError};
pub use evaluator::{ChallengeEvaluator, SignInChallengeEvaluator, MFAS_CAN_SETUP};
pub use events::{AuthEvent, SetupSoftwareTokenEvent, SignInEvent};
pub use service::{
    AssociateSoftwareTokenRequest, AssociateSoftwareTokenResponse, CognitoIdentityProvider,
    RespondToAuthChallengeRequest, RespondToAuthChallengeResponse, VerifySoftwareTokenRequest,
    VerifySoftwareTokenResponse, VerifySoftwareTokenStatus,
};
pub use session::AuthSession;
pub use sign_in::{SignInResolver, SignInState};
pub use software_token::{SetupSoftwareTokenResolver, SetupSoftwareTokenState};
pub use step::{AuthSignInStep, TotpSetupDetails};
