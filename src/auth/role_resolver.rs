use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::DEFAULT_ROLE_LABEL;

/// Reasons a token payload yields no role. Never surfaced to callers.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RoleClaimError {
    #[error("token is not a three-part credential")]
    MalformedToken,

    #[error("payload is not valid base64")]
    InvalidEncoding,

    #[error("payload is not a JSON object: {0}")]
    InvalidPayload(String),

    #[error("payload carries no roles")]
    MissingRoles,
}

/// The subset of claims the resolver reads.
#[derive(Debug, Deserialize)]
struct RoleClaims {
    #[serde(default)]
    roles: Option<Vec<String>>,
}

/// Derives a display role label from a bearer token's `roles` claim.
///
/// The signature is not verified; the label only annotates execution
/// requests and grants nothing.
#[derive(Debug, Clone)]
pub struct RoleResolver {
    fallback_role: String,
}

impl Default for RoleResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ROLE_LABEL)
    }
}

impl RoleResolver {
    pub fn new(fallback_role: impl Into<String>) -> Self {
        Self {
            fallback_role: fallback_role.into(),
        }
    }

    pub fn fallback_role(&self) -> &str {
        &self.fallback_role
    }

    /// Resolve the role label for `token`, degrading to the fallback label.
    pub fn resolve_role(&self, token: &str) -> String {
        match first_role(token) {
            Ok(role) => {
                let label = format_role_label(&role);
                debug!(role = %role, label = %label, "Resolved role from token");
                label
            }
            Err(reason) => {
                warn!(
                    reason = %reason,
                    fallback = %self.fallback_role,
                    "Could not read role claim from token, using fallback role"
                );
                self.fallback_role.clone()
            }
        }
    }
}

/// First entry of the payload's `roles` claim. Later roles are ignored.
pub fn first_role(token: &str) -> Result<String, RoleClaimError> {
    let token = token.trim();
    let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();

    let mut segments = token.split('.');
    let payload = match (segments.next(), segments.next(), segments.next()) {
        (Some(_), Some(payload), Some(_)) if !payload.is_empty() => payload,
        _ => return Err(RoleClaimError::MalformedToken),
    };

    let bytes = decode_segment(payload)?;
    let claims: RoleClaims = serde_json::from_slice(&bytes)
        .map_err(|e| RoleClaimError::InvalidPayload(e.to_string()))?;

    claims
        .roles
        .and_then(|roles| roles.into_iter().next())
        .ok_or(RoleClaimError::MissingRoles)
}

// JWT segments are unpadded base64url; tolerate padded standard base64 too.
fn decode_segment(segment: &str) -> Result<Vec<u8>, RoleClaimError> {
    let unpadded = segment.trim_end_matches('=');
    URL_SAFE_NO_PAD
        .decode(unpadded)
        .or_else(|_| STANDARD.decode(segment))
        .map_err(|_| RoleClaimError::InvalidEncoding)
}

/// `production_support` -> `Production Support`
pub fn format_role_label(role: &str) -> String {
    role.split('_')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
