//! # Response Normalizer
//!
//! Converts a raw gateway answer into the status, result and error fields of
//! a canonical execution record.

use serde_json::{Map, Value};

use super::types::RawStepResult;
use crate::constants::DEFAULT_COMPLETION_MESSAGE;
use crate::models::StepResultPayload;
use crate::state_machine::StepExecutionStatus;

/// Normalized record fields
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedOutcome {
    pub status: StepExecutionStatus,
    pub result: Option<StepResultPayload>,
    pub error_message: Option<String>,
}

pub fn normalize(raw: &RawStepResult) -> NormalizedOutcome {
    if raw.success {
        let body = raw.response_body.as_deref();
        NormalizedOutcome {
            status: StepExecutionStatus::Completed,
            result: Some(StepResultPayload {
                success: true,
                message: extract_message(body),
                status_code: Some(raw.status_code),
                data: body.and_then(object_body),
            }),
            error_message: None,
        }
    } else {
        NormalizedOutcome {
            status: StepExecutionStatus::Failed,
            result: None,
            error_message: Some(
                raw.error_message
                    .clone()
                    .unwrap_or_else(|| DEFAULT_COMPLETION_MESSAGE.to_string()),
            ),
        }
    }
}

/// Message for a response body.
///
/// Absent body gives `Completed`; an unparsable body is returned unchanged.
pub fn extract_message(body: Option<&str>) -> String {
    let Some(body) = body else {
        return DEFAULT_COMPLETION_MESSAGE.to_string();
    };

    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => match map.get("message") {
            Some(message) => value_to_string(message),
            None => Value::Object(map).to_string(),
        },
        Ok(other) => value_to_string(&other),
        Err(_) => body.to_string(),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn object_body(body: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}
