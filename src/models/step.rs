use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::execution::ExecutionType;
use crate::utils::serde::null_as_default;

/// A unit of remediation work, immutable once received from the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    /// Ordinal position within the phase
    pub step_number: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// HTTP method of the target operation (metadata only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Path of the target operation (metadata only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_response: Option<Value>,
    /// May run without human action
    #[serde(default, deserialize_with = "null_as_default")]
    pub auto_executable: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub step_type: String,
}

impl Step {
    pub fn new(step_number: u32, description: impl Into<String>) -> Self {
        Self {
            step_number,
            description: description.into(),
            method: None,
            path: None,
            request_body: None,
            expected_response: None,
            auto_executable: false,
            step_type: String::new(),
        }
    }

    pub fn with_auto_executable(mut self, auto_executable: bool) -> Self {
        self.auto_executable = auto_executable;
        self
    }

    pub fn with_operation(mut self, method: impl Into<String>, path: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self.path = Some(path.into());
        self
    }

    pub fn with_step_type(mut self, step_type: impl Into<String>) -> Self {
        self.step_type = step_type.into();
        self
    }

    pub fn with_request_body(mut self, body: impl Into<String>) -> Self {
        self.request_body = Some(body.into());
        self
    }

    /// Target path, treating an empty string as absent
    pub fn api_endpoint(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.is_empty())
    }

    /// Target method, treating an empty string as absent
    pub fn http_method(&self) -> Option<&str> {
        self.method.as_deref().filter(|m| !m.is_empty())
    }

    /// Request body as gateway parameters, when it is a JSON object
    pub fn api_parameters(&self) -> Option<Map<String, Value>> {
        let body = self.request_body.as_deref()?;
        match serde_json::from_str::<Value>(body) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    pub fn execution_type(&self) -> ExecutionType {
        ExecutionType::from_step_type(&self.step_type)
    }
}
