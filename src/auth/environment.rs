//! Dependencies shared by auth actions.

use super::evaluator::{ChallengeEvaluator, SignInChallengeEvaluator};
use super::service::CognitoIdentityProvider;
use crate::config::AuthConfiguration;
use std::fmt;
use std::sync::Arc;

/// Everything an auth action may call out to.
#[derive(Clone)]
pub struct AuthEnvironment {
    pub service: Arc<dyn CognitoIdentityProvider>,
    pub configuration: AuthConfiguration,
    pub evaluator: Arc<dyn ChallengeEvaluator>,
}

impl AuthEnvironment {
    /// Environment using the default challenge evaluator.
    pub fn new(service: Arc<dyn CognitoIdentityProvider>, configuration: AuthConfiguration) -> Self {
        Self {
            service,
            configuration,
            evaluator: Arc::new(SignInChallengeEvaluator::default()),
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn ChallengeEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }
}

impl fmt::Debug for AuthEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthEnvironment")
            .field("configuration", &self.configuration)
            .finish_non_exhaustive()
    }
}
