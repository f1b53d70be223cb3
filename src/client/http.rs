//! # Remediation API Client
//!
//! reqwest-backed client for the classifier, the task lister and the execution
//! gateway. Every request carries `Content-Type`, `X-User-ID` and, when a token
//! is configured, `Authorization`. Classification also carries a single-use
//! `X-Idempotency-Key`.
//!
//! `X-User-ID` names the user of the request body (`user_id` / `userId`);
//! the catalogue listing has no body and uses the configured user.
//!
//! Endpoint paths are appended to the base URL, so a base URL with a path
//! prefix (`http://host/remediation`) keeps it.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::error::{ClientError, ClientResult};
use crate::config::RemediationConfig;
use crate::constants::headers;
use crate::models::{Task, TaskSummary};
use crate::orchestration::types::{
    ClassificationRequest, ExecutionGateway, GatewayRequest, RawStepResult, TaskClassifier,
    TaskLister,
};

#[derive(Clone)]
pub struct HttpRemediationClient {
    client: Client,
    classify_url: Url,
    task_list_url: Url,
    execute_url: Url,
    default_user_id: String,
}

impl std::fmt::Debug for HttpRemediationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRemediationClient")
            .field("classify_url", &self.classify_url.as_str())
            .field("task_list_url", &self.task_list_url.as_str())
            .field("execute_url", &self.execute_url.as_str())
            .finish()
    }
}

impl HttpRemediationClient {
    pub fn new(config: &RemediationConfig) -> ClientResult<Self> {
        let base_url = base_url_with_trailing_slash(&config.api.base_url)?;
        let join = |path: &str| {
            base_url
                .join(path.trim_start_matches('/'))
                .map_err(|e| ClientError::config_error(format!("Failed to construct URL: {e}")))
        };
        let classify_url = join(&config.api.classify_path)?;
        let task_list_url = join(&config.api.task_list_path)?;
        let execute_url = join(&config.api.execute_path)?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        match config.auth.authorization_header() {
            Some(value) => {
                let mut value = HeaderValue::from_str(&value)
                    .map_err(|e| ClientError::config_error(format!("Invalid bearer token: {e}")))?;
                value.set_sensitive(true);
                default_headers.insert(AUTHORIZATION, value);
                debug!("Configured Bearer token authentication");
            }
            None => warn!("No bearer token configured; requests will be sent unauthenticated"),
        }

        let client = Client::builder()
            .timeout(config.api.timeout())
            .user_agent(format!("remediate/{}", env!("CARGO_PKG_VERSION")))
            .default_headers(default_headers)
            .build()
            .map_err(|e| ClientError::config_error(format!("Failed to create HTTP client: {e}")))?;

        info!(
            base_url = %config.api.base_url,
            timeout_ms = config.api.timeout_ms,
            "Created remediation API client"
        );

        Ok(Self {
            client,
            classify_url,
            task_list_url,
            execute_url,
            default_user_id: config.auth.user_id.clone(),
        })
    }

    async fn read_json<T: DeserializeOwned>(response: Response, field: &str) -> ClientResult<T> {
        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or_default();
            warn!(status = status.as_u16(), field, "Collaborator returned error status");
            return Err(ClientError::api_error(status.as_u16(), reason));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ClientError::invalid_response(field, e.to_string()))
    }
}

#[async_trait]
impl TaskClassifier for HttpRemediationClient {
    async fn classify(&self, request: &ClassificationRequest) -> ClientResult<Task> {
        debug!(
            url = %self.classify_url,
            idempotency_key = %request.idempotency_key,
            "Classifying remediation query"
        );

        let response = self
            .client
            .post(self.classify_url.clone())
            .header(headers::USER_ID, &request.user_id)
            .header(headers::IDEMPOTENCY_KEY, &request.idempotency_key)
            .json(request)
            .send()
            .await?;

        Self::read_json(response, "classification").await
    }
}

#[async_trait]
impl TaskLister for HttpRemediationClient {
    async fn list_tasks(&self) -> ClientResult<Vec<TaskSummary>> {
        debug!(url = %self.task_list_url, "Fetching task catalogue");
        let response = self
            .client
            .get(self.task_list_url.clone())
            .header(headers::USER_ID, &self.default_user_id)
            .send()
            .await?;
        Self::read_json(response, "task_list").await
    }
}

#[async_trait]
impl ExecutionGateway for HttpRemediationClient {
    async fn execute(&self, request: &GatewayRequest) -> ClientResult<RawStepResult> {
        debug!(
            url = %self.execute_url,
            task_id = %request.task_id,
            phase = %request.phase,
            step_index = %request.step_index,
            "Sending step to execution gateway"
        );

        let response = self
            .client
            .post(self.execute_url.clone())
            .header(headers::USER_ID, &request.user_id)
            .json(request)
            .send()
            .await?;

        Self::read_json(response, "step_result").await
    }
}

/// Parse the base URL so that joining a relative path appends to it.
fn base_url_with_trailing_slash(base_url: &str) -> ClientResult<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| ClientError::config_error(format!("Invalid base URL: {e}")))?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_base_url() {
        let mut config = RemediationConfig::default();
        config.api.base_url = "not a url".to_string();
        let err = HttpRemediationClient::new(&config).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_builds_endpoint_urls() {
        let mut config = RemediationConfig::default();
        config.api.base_url = "http://remediation.internal:9000".to_string();
        let client = HttpRemediationClient::new(&config).unwrap();
        assert_eq!(
            client.classify_url.as_str(),
            "http://remediation.internal:9000/api/v1/process"
        );
        assert_eq!(
            client.execute_url.as_str(),
            "http://remediation.internal:9000/v1/steps/execute"
        );
    }

    #[test]
    fn test_base_url_path_prefix_is_kept() {
        let mut config = RemediationConfig::default();
        for base_url in [
            "http://gateway.internal/remediation",
            "http://gateway.internal/remediation/",
        ] {
            config.api.base_url = base_url.to_string();
            let client = HttpRemediationClient::new(&config).unwrap();
            assert_eq!(
                client.classify_url.as_str(),
                "http://gateway.internal/remediation/api/v1/process"
            );
            assert_eq!(
                client.task_list_url.as_str(),
                "http://gateway.internal/remediation/api/v1/tasks"
            );
        }
    }

    #[test]
    fn test_rejects_header_unsafe_token() {
        let mut config = RemediationConfig::default();
        config.auth.bearer_token = Some("bad\ntoken".to_string());
        assert!(HttpRemediationClient::new(&config).is_err());
    }
}
