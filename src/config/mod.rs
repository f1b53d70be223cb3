//! # Remediation Configuration
//!
//! Collaborator endpoints, credentials, execution pacing and logging settings.
//! Credentials and the fallback role label are always supplied from outside
//! (file or environment), never compiled in.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use remediation_core::config::RemediationConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RemediationConfig::load()?;
//! println!("Classifier: {}{}", config.api.base_url, config.api.classify_path);
//! println!("Pacing: {:?}", config.execution.pacing_delay());
//! # Ok(())
//! # }
//! ```

pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::constants::{endpoints, DEFAULT_PACING_DELAY_MS, DEFAULT_ROLE_LABEL};
use crate::error::{RemediationError, RemediationResult};

pub use loader::ConfigLoader;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemediationConfig {
    pub api: ApiConfig,
    pub auth: AuthConfig,
    pub execution: ExecutionConfig,
    pub logging: LoggingConfig,
}

/// Collaborator endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
    pub classify_path: String,
    pub task_list_path: String,
    pub execute_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: endpoints::DEFAULT_BASE_URL.to_string(),
            timeout_ms: 30_000,
            classify_path: endpoints::CLASSIFY_PATH.to_string(),
            task_list_path: endpoints::TASK_LIST_PATH.to_string(),
            execute_path: endpoints::EXECUTE_PATH.to_string(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer credential; a leading `Bearer ` is tolerated
    pub bearer_token: Option<String>,
    pub user_id: String,
    /// Role label used when the token carries no usable role
    pub fallback_role: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bearer_token: None,
            user_id: "ops-engineer".to_string(),
            fallback_role: DEFAULT_ROLE_LABEL.to_string(),
        }
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("bearer_token_configured", &self.bearer_token.is_some())
            .field("user_id", &self.user_id)
            .field("fallback_role", &self.fallback_role)
            .finish()
    }
}

impl AuthConfig {
    /// Token without any `Bearer ` prefix; empty when unset
    pub fn raw_token(&self) -> &str {
        let token = self.bearer_token.as_deref().unwrap_or_default().trim();
        token.strip_prefix("Bearer ").unwrap_or(token).trim()
    }

    /// Value for the `Authorization` header, if a token is configured
    pub fn authorization_header(&self) -> Option<String> {
        let token = self.raw_token();
        (!token.is_empty()).then(|| format!("Bearer {token}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Delay before each auto-executed step
    pub pacing_delay_ms: u64,
    /// Upper bound on one gateway call; unset means wait indefinitely
    pub gateway_timeout_ms: Option<u64>,
    pub environment: String,
    pub request_reason: String,
    pub priority: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            pacing_delay_ms: DEFAULT_PACING_DELAY_MS,
            gateway_timeout_ms: None,
            environment: "prod".to_string(),
            request_reason: "UI request".to_string(),
            priority: "normal".to_string(),
        }
    }
}

impl ExecutionConfig {
    pub fn pacing_delay(&self) -> Duration {
        Duration::from_millis(self.pacing_delay_ms)
    }

    pub fn gateway_timeout(&self) -> Option<Duration> {
        self.gateway_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive; `RUST_LOG` wins when set
    pub level: Option<String>,
    pub json: bool,
}

impl RemediationConfig {
    /// Load from the first config file found, then environment overrides
    pub fn load() -> RemediationResult<Self> {
        ConfigLoader::new().load()
    }

    pub fn validate(&self) -> RemediationResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(RemediationError::Configuration(
                "api.base_url must not be empty".to_string(),
            ));
        }
        if self.auth.user_id.trim().is_empty() {
            return Err(RemediationError::Configuration(
                "auth.user_id must not be empty".to_string(),
            ));
        }
        if self.auth.fallback_role.trim().is_empty() {
            return Err(RemediationError::Configuration(
                "auth.fallback_role must not be empty".to_string(),
            ));
        }
        if self.execution.gateway_timeout_ms == Some(0) {
            return Err(RemediationError::Configuration(
                "execution.gateway_timeout_ms must be greater than zero when set".to_string(),
            ));
        }
        Ok(())
    }
}
