//! End-to-end tests of TOTP setup against a scripted identity provider.

use async_trait::async_trait;
use authflow::auth::{
    AssociateSoftwareTokenData, AssociateSoftwareTokenRequest, AssociateSoftwareTokenResponse,
    AuthChallenge, AuthEnvironment, AuthError, AuthEvent, AuthSession, AuthSignInStep,
    AuthenticationResult, ChallengeName, CognitoIdentityProvider, RespondToAuthChallengeRequest,
    RespondToAuthChallengeResponse, ServiceError, SessionError, SetupSoftwareTokenEvent,
    SetupSoftwareTokenResolver, SetupSoftwareTokenState, SignInEvent, SignInResolver, SignInState,
    VerifySoftwareTokenRequest, VerifySoftwareTokenResponse, VerifySoftwareTokenStatus,
};
use authflow::config::{AuthConfiguration, UserPoolConfiguration};
use authflow::core::State;
use authflow::effects::StateMachine;
use authflow::StateMachineBuilder;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::timeout;

/// Identity provider answering from per-operation queues and recording
/// every request it receives.
#[derive(Default)]
struct ScriptedProvider {
    associate: Mutex<VecDeque<Result<AssociateSoftwareTokenResponse, ServiceError>>>,
    verify: Mutex<VecDeque<Result<VerifySoftwareTokenResponse, ServiceError>>>,
    respond: Mutex<VecDeque<Result<RespondToAuthChallengeResponse, ServiceError>>>,
    associate_requests: Mutex<Vec<AssociateSoftwareTokenRequest>>,
    verify_requests: Mutex<Vec<VerifySoftwareTokenRequest>>,
    respond_requests: Mutex<Vec<RespondToAuthChallengeRequest>>,
    panic_on_associate: AtomicBool,
}

fn next<T>(queue: &Mutex<VecDeque<Result<T, ServiceError>>>) -> Result<T, ServiceError> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(ServiceError::Transport("unscripted call".to_string())))
}

impl ScriptedProvider {
    fn on_associate(&self, result: Result<AssociateSoftwareTokenResponse, ServiceError>) {
        self.associate.lock().unwrap().push_back(result);
    }

    fn on_verify(&self, result: Result<VerifySoftwareTokenResponse, ServiceError>) {
        self.verify.lock().unwrap().push_back(result);
    }

    fn on_respond(&self, result: Result<RespondToAuthChallengeResponse, ServiceError>) {
        self.respond.lock().unwrap().push_back(result);
    }

    fn associate_sessions(&self) -> Vec<Option<String>> {
        self.associate_requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.session.clone())
            .collect()
    }
}

#[async_trait]
impl CognitoIdentityProvider for ScriptedProvider {
    async fn associate_software_token(
        &self,
        request: AssociateSoftwareTokenRequest,
    ) -> Result<AssociateSoftwareTokenResponse, ServiceError> {
        if self.panic_on_associate.load(Ordering::SeqCst) {
            panic!("associate exploded");
        }
        self.associate_requests.lock().unwrap().push(request);
        next(&self.associate)
    }

    async fn verify_software_token(
        &self,
        request: VerifySoftwareTokenRequest,
    ) -> Result<VerifySoftwareTokenResponse, ServiceError> {
        self.verify_requests.lock().unwrap().push(request);
        next(&self.verify)
    }

    async fn respond_to_auth_challenge(
        &self,
        request: RespondToAuthChallengeRequest,
    ) -> Result<RespondToAuthChallengeResponse, ServiceError> {
        self.respond_requests.lock().unwrap().push(request);
        next(&self.respond)
    }
}

fn environment(provider: &Arc<ScriptedProvider>) -> AuthEnvironment {
    let configuration = AuthConfiguration::with_user_pool(UserPoolConfiguration::new(
        "us-east-1_pool",
        "client-1",
        "us-east-1",
    ))
    .with_totp_issuer("Example");
    AuthEnvironment::new(provider.clone(), configuration)
}

fn challenge() -> AuthChallenge {
    AuthChallenge::new(ChallengeName::MfaSetup)
        .with_username("alice")
        .with_session("sess1")
}

fn associated() -> AssociateSoftwareTokenResponse {
    AssociateSoftwareTokenResponse {
        secret_code: Some("ABC123".to_string()),
        session: Some("sess2".to_string()),
    }
}

fn verified(status: VerifySoftwareTokenStatus) -> VerifySoftwareTokenResponse {
    VerifySoftwareTokenResponse {
        status: Some(status),
        session: Some("sess3".to_string()),
    }
}

fn tokens() -> RespondToAuthChallengeResponse {
    RespondToAuthChallengeResponse {
        authentication_result: Some(AuthenticationResult {
            access_token: Some("access".to_string()),
            id_token: Some("id".to_string()),
            refresh_token: Some("refresh".to_string()),
            expires_in: Some(3600),
            token_type: Some("Bearer".to_string()),
        }),
        ..Default::default()
    }
}

async fn within<F: Future>(future: F) -> F::Output {
    timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out")
}

#[tokio::test]
async fn associate_response_moves_setup_to_waiting_for_answer() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.on_associate(Ok(associated()));
    let machine = StateMachine::new(SetupSoftwareTokenResolver::default(), environment(&provider))
        .unwrap();

    machine
        .send(SetupSoftwareTokenEvent::AssociateSoftwareToken(challenge()).into())
        .unwrap();
    let state = within(machine.wait_for(|s| {
        matches!(s, SetupSoftwareTokenState::WaitingForAnswer { .. })
    }))
    .await
    .unwrap();

    assert_eq!(
        state,
        SetupSoftwareTokenState::WaitingForAnswer {
            data: AssociateSoftwareTokenData {
                secret_code: "ABC123".to_string(),
                session: Some("sess2".to_string()),
            },
            challenge: challenge(),
        }
    );
    assert_eq!(provider.associate_sessions(), vec![Some("sess1".to_string())]);
}

#[tokio::test]
async fn failed_associate_leaves_setup_state_unchanged() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.on_associate(Err(ServiceError::api("InternalErrorException", "boom")));
    let machine = StateMachine::new(SetupSoftwareTokenResolver::default(), environment(&provider))
        .unwrap();

    machine
        .send(SetupSoftwareTokenEvent::AssociateSoftwareToken(challenge()).into())
        .unwrap();
    within(async {
        while provider.associate_requests.lock().unwrap().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(
        machine.get_current_state().await.unwrap(),
        SetupSoftwareTokenState::AssociateSoftwareToken(challenge())
    );
    let history = machine.history().await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn failed_associate_attaches_service_error_in_sign_in() {
    let provider = Arc::new(ScriptedProvider::default());
    let error = ServiceError::api("InternalErrorException", "boom");
    provider.on_associate(Err(error.clone()));
    let session = AuthSession::new(environment(&provider)).unwrap();

    let result = within(session.setup_totp(challenge())).await;

    assert_eq!(result, Err(SessionError::Auth(AuthError::Service(error.clone()))));
    assert_eq!(
        session.machine().current_state(),
        SignInState::ResolvingTotpSetup(SetupSoftwareTokenState::Error(AuthError::Service(error)))
    );
}

#[tokio::test]
async fn totp_setup_signs_in() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.on_associate(Ok(associated()));
    provider.on_verify(Ok(verified(VerifySoftwareTokenStatus::Success)));
    provider.on_respond(Ok(tokens()));
    let session = AuthSession::new(environment(&provider)).unwrap();

    let step = within(session.setup_totp(challenge())).await.unwrap();
    match &step {
        AuthSignInStep::ContinueSignInWithTotpSetup(details) => {
            assert_eq!(details.secret_code, "ABC123");
            assert_eq!(
                details.setup_uri.as_str(),
                "otpauth://totp/Example:alice?secret=ABC123&issuer=Example"
            );
        }
        other => panic!("Expected TOTP setup step, got {other:?}"),
    }

    let step = within(session.confirm_totp("123456")).await.unwrap();
    assert_eq!(step, AuthSignInStep::Done);

    let verify = provider.verify_requests.lock().unwrap().clone();
    assert_eq!(verify.len(), 1);
    assert_eq!(verify[0].user_code, "123456");
    assert_eq!(verify[0].session.as_deref(), Some("sess2"));

    let respond = provider.respond_requests.lock().unwrap().clone();
    assert_eq!(respond.len(), 1);
    assert_eq!(respond[0].client_id, "client-1");
    assert_eq!(respond[0].challenge_name, ChallengeName::MfaSetup);
    assert_eq!(respond[0].session.as_deref(), Some("sess3"));
    assert_eq!(
        respond[0].challenge_responses.get("USERNAME").map(String::as_str),
        Some("alice")
    );

    match session.machine().current_state() {
        SignInState::SignedIn(data) => {
            assert_eq!(data.username, "alice");
            assert_eq!(data.tokens.access_token.as_deref(), Some("access"));
        }
        other => panic!("Expected SignedIn, got {other:?}"),
    }

    let history = session.machine().history().await.unwrap();
    let events: Vec<&str> = history.transitions().map(|t| t.event.as_str()).collect();
    assert_eq!(
        events,
        vec![
            "InitiateTotpSetup",
            "AssociateSoftwareToken",
            "WaitForAnswer",
            "VerifyChallengeAnswer",
            "RespondToAuthChallenge",
            "FinalizeSignIn",
        ]
    );
}

#[tokio::test]
async fn rejected_code_fails_verification_and_allows_restart() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.on_associate(Ok(associated()));
    provider.on_verify(Ok(verified(VerifySoftwareTokenStatus::Error)));
    let session = AuthSession::new(environment(&provider)).unwrap();

    within(session.setup_totp(challenge())).await.unwrap();
    let result = within(session.confirm_totp("000000")).await;

    assert!(matches!(
        result,
        Err(SessionError::Auth(AuthError::VerificationFailed(_)))
    ));
    assert!(provider.respond_requests.lock().unwrap().is_empty());

    provider.on_associate(Ok(associated()));
    let step = within(session.setup_totp(challenge())).await.unwrap();
    assert!(matches!(step, AuthSignInStep::ContinueSignInWithTotpSetup(_)));
    assert_eq!(provider.associate_sessions().len(), 2);
}

#[tokio::test]
async fn unknown_verify_status_is_an_error() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.on_associate(Ok(associated()));
    provider.on_verify(Ok(verified(VerifySoftwareTokenStatus::Unknown(
        "PENDING".to_string(),
    ))));
    let session = AuthSession::new(environment(&provider)).unwrap();

    within(session.setup_totp(challenge())).await.unwrap();
    let result = within(session.confirm_totp("123456")).await;

    assert!(matches!(
        result,
        Err(SessionError::Auth(AuthError::VerificationFailed(_)))
    ));
}

#[tokio::test]
async fn follow_up_challenge_is_surfaced() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.on_associate(Ok(associated()));
    provider.on_verify(Ok(verified(VerifySoftwareTokenStatus::Success)));
    provider.on_respond(Ok(RespondToAuthChallengeResponse {
        challenge_name: Some(ChallengeName::SoftwareTokenMfa),
        session: Some("sess4".to_string()),
        ..Default::default()
    }));
    let session = AuthSession::new(environment(&provider)).unwrap();

    within(session.setup_totp(challenge())).await.unwrap();
    let step = within(session.confirm_totp("123456")).await.unwrap();

    assert_eq!(step, AuthSignInStep::ConfirmSignInWithTotpCode);
    match session.machine().current_state() {
        SignInState::ResolvingChallenge(next) => {
            assert_eq!(next.session.as_deref(), Some("sess4"));
            assert_eq!(next.username.as_deref(), Some("alice"));
        }
        other => panic!("Expected ResolvingChallenge, got {other:?}"),
    }
}

#[tokio::test]
async fn repeated_mfa_setup_challenge_restarts_setup() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.on_associate(Ok(associated()));
    provider.on_verify(Ok(verified(VerifySoftwareTokenStatus::Success)));
    provider.on_respond(Ok(RespondToAuthChallengeResponse {
        challenge_name: Some(ChallengeName::MfaSetup),
        session: Some("sess4".to_string()),
        ..Default::default()
    }));
    provider.on_associate(Ok(AssociateSoftwareTokenResponse {
        secret_code: Some("DEF456".to_string()),
        session: Some("sess5".to_string()),
    }));
    let session = AuthSession::new(environment(&provider)).unwrap();

    within(session.setup_totp(challenge())).await.unwrap();
    let step = within(session.confirm_totp("123456")).await.unwrap();

    match step {
        AuthSignInStep::ContinueSignInWithTotpSetup(details) => {
            assert_eq!(details.secret_code, "DEF456");
        }
        other => panic!("Expected a fresh TOTP setup step, got {other:?}"),
    }
    assert_eq!(
        provider.associate_sessions(),
        vec![Some("sess1".to_string()), Some("sess4".to_string())]
    );
}

#[tokio::test]
async fn panicking_provider_fails_setup() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.panic_on_associate.store(true, Ordering::SeqCst);
    let session = AuthSession::new(environment(&provider)).unwrap();

    let result = within(session.setup_totp(challenge())).await;

    let expected = AuthError::ActionFailed {
        action: "SignIn:AssociateSoftwareToken".to_string(),
        message: "panicked: associate exploded".to_string(),
    };
    assert_eq!(result, Err(SessionError::Auth(expected.clone())));
    assert_eq!(
        session.machine().current_state(),
        SignInState::ResolvingTotpSetup(SetupSoftwareTokenState::Error(expected))
    );
}

#[tokio::test]
async fn confirm_before_setup_is_rejected() {
    let provider = Arc::new(ScriptedProvider::default());
    let session = AuthSession::new(environment(&provider)).unwrap();

    let result = session.confirm_totp("123456").await;

    assert_eq!(
        result,
        Err(SessionError::InvalidState {
            operation: "confirm a TOTP code",
            state: "NotStarted".to_string(),
        })
    );
    assert!(provider.verify_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn setup_resumes_from_checkpoint() {
    let provider = Arc::new(ScriptedProvider::default());
    provider.on_associate(Ok(associated()));
    provider.on_verify(Ok(verified(VerifySoftwareTokenStatus::Success)));
    provider.on_respond(Ok(tokens()));
    let env = environment(&provider);

    let first = AuthSession::new(env.clone()).unwrap();
    within(first.setup_totp(challenge())).await.unwrap();
    let checkpoint = first.machine().checkpoint().await.unwrap();
    first.machine().shutdown().unwrap();

    let bytes = checkpoint.to_bytes().unwrap();
    let restored = authflow::Checkpoint::<SignInState>::from_bytes(&bytes).unwrap();
    let machine = StateMachineBuilder::new()
        .resolver(SignInResolver::default())
        .environment(env)
        .resume_from(restored)
        .build()
        .unwrap();
    let second = AuthSession::from_machine(machine, "Example");

    assert_eq!(second.machine().name(), "SignIn");
    assert!(matches!(
        second.current_step(),
        Ok(Some(AuthSignInStep::ContinueSignInWithTotpSetup(_)))
    ));
    let step = within(second.confirm_totp("123456")).await.unwrap();
    assert_eq!(step, AuthSignInStep::Done);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_senders_never_interleave() {
    let provider = Arc::new(ScriptedProvider::default());
    let machine = StateMachine::new(SignInResolver::default(), environment(&provider)).unwrap();
    let mut subscription = machine.listen().unwrap();

    let mut senders = Vec::new();
    for task in 0..8 {
        let machine = machine.clone();
        senders.push(tokio::spawn(async move {
            for i in 0..25 {
                let next = AuthChallenge::new(ChallengeName::SmsMfa)
                    .with_session(format!("task{task}-{i}"));
                machine
                    .send(AuthEvent::from(SignInEvent::ReceivedChallenge(next)))
                    .unwrap();
            }
        }));
    }
    for sender in senders {
        sender.await.unwrap();
    }

    let mut changes = Vec::new();
    while changes.len() < 200 {
        let change = within(subscription.recv()).await.unwrap();
        changes.push(change);
    }

    assert_eq!(changes[0].from, SignInState::NotStarted);
    for pair in changes.windows(2) {
        assert_eq!(pair[1].from, pair[0].to);
    }
    let last = changes.last().map(|c| c.to.clone()).unwrap();
    assert_eq!(machine.get_current_state().await.unwrap(), last);
    assert!(!last.is_error());
}
