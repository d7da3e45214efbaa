//! User pool configuration.
//!
//! Reads the auth section of an SDK configuration file:
//!
//! ```json
//! {
//!   "auth": {
//!     "plugins": {
//!       "awsCognitoAuthPlugin": {
//!         "CognitoUserPool": {
//!           "Default": {
//!             "PoolId": "us-east-1_abc123",
//!             "AppClientId": "client",
//!             "Region": "us-east-1"
//!           }
//!         },
//!         "TotpIssuer": "Example"
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! The bare plugin object (the value under `awsCognitoAuthPlugin`) is
//! accepted as well.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;
use tracing::debug;

pub mod error;
pub mod validation;

pub use error::{ConfigError, ConfigViolation};

/// Issuer shown in authenticator apps when none is configured.
pub const DEFAULT_TOTP_ISSUER: &str = "authflow";

const PLUGIN_POINTER: &str = "/auth/plugins/awsCognitoAuthPlugin";

/// Cognito user pool settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPoolConfiguration {
    #[serde(rename = "PoolId")]
    pub pool_id: String,

    #[serde(rename = "AppClientId")]
    pub app_client: String,

    #[serde(rename = "AppClientSecret", default, skip_serializing_if = "Option::is_none")]
    pub app_client_secret: Option<String>,

    #[serde(rename = "Region")]
    pub region: String,
}

impl UserPoolConfiguration {
    pub fn new(
        pool_id: impl Into<String>,
        app_client: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            pool_id: pool_id.into(),
            app_client: app_client.into(),
            app_client_secret: None,
            region: region.into(),
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.app_client_secret = Some(secret.into());
        self
    }
}

/// Configuration shared by every auth action.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthConfiguration {
    /// Absent when the app only uses identity pools; challenge responses
    /// then fail with a configuration error.
    pub user_pool: Option<UserPoolConfiguration>,
    pub totp_issuer: Option<String>,
}

#[derive(Deserialize)]
struct PluginSection {
    #[serde(rename = "CognitoUserPool", default)]
    user_pool: Option<UserPoolSection>,

    #[serde(rename = "TotpIssuer", default)]
    totp_issuer: Option<String>,
}

#[derive(Deserialize)]
struct UserPoolSection {
    #[serde(rename = "Default")]
    default: UserPoolConfiguration,
}

impl AuthConfiguration {
    pub fn with_user_pool(user_pool: UserPoolConfiguration) -> Self {
        Self {
            user_pool: Some(user_pool),
            totp_issuer: None,
        }
    }

    pub fn with_totp_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.totp_issuer = Some(issuer.into());
        self
    }

    /// Parse and validate a configuration document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let document: Value =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let plugin = match document.pointer(PLUGIN_POINTER) {
            Some(plugin) => plugin.clone(),
            None => document,
        };
        let section: PluginSection =
            serde_json::from_value(plugin).map_err(|e| ConfigError::Parse(e.to_string()))?;

        let config = Self {
            user_pool: section.user_pool.map(|pool| pool.default),
            totp_issuer: section.totp_issuer,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading auth configuration");
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&json)
    }

    /// Check every rule and report all violations together.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut checks: Vec<Validation<(), NonEmptyVec<ConfigViolation>>> = Vec::new();
        if let Some(pool) = &self.user_pool {
            checks.push(validation::validate_user_pool(pool));
        }
        if let Some(issuer) = &self.totp_issuer {
            if issuer.trim().is_empty() {
                checks.push(Validation::fail(ConfigViolation::EmptyField {
                    field: "TotpIssuer",
                }));
            }
        }

        match Validation::all_vec(checks).map(|_| ()) {
            Validation::Success(_) => Ok(()),
            Validation::Failure(errors) => {
                Err(ConfigError::Invalid(errors.iter().cloned().collect()))
            }
        }
    }

    pub fn app_client_id(&self) -> Option<&str> {
        self.user_pool.as_ref().map(|pool| pool.app_client.as_str())
    }

    pub fn issuer(&self) -> &str {
        self.totp_issuer.as_deref().unwrap_or(DEFAULT_TOTP_ISSUER)
    }
}
